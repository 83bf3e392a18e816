//! Resource kinds, their static descriptors, and the naming convention.
//!
//! Every Forecast resource managed by the workflow has a deterministic name
//! derived from the project name and the workflow timestamp, and an ARN that
//! can be rebuilt from that name without a round trip to the API. The
//! [`arn`] module implements derivation and the inverse parsing used by the
//! retention sweeps.

pub mod arn;
mod timestamp;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retention::RetentionPolicy;

pub use arn::{ParsedArn, parent_arn, parse_arn};
pub use timestamp::{TIMESTAMP_FORMAT, WorkflowTimestamp};

/// Kind of Forecast resource handled by the workflow.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// A dataset holding one type of time series data.
    Dataset,
    /// A dataset group bundling the datasets used for training.
    DatasetGroup,
    /// A job importing data from S3 into a dataset.
    DatasetImportJob,
    /// A trained predictor.
    Predictor,
    /// A forecast generated from a predictor.
    Forecast,
    /// A job exporting a forecast to S3.
    ForecastExportJob,
}

/// How a resource's parent is discovered while sweeping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParentLink {
    /// The kind has no parent.
    None,
    /// The parent lists its children (`DescribeDatasetGroup.DatasetArns`).
    Membership,
    /// The parent name is embedded in the child's ARN path.
    ArnPath,
    /// The listing reports the parent ARN alongside each child.
    Summary,
}

/// Static description of a resource kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResourceDescriptor {
    /// Kind being described.
    pub kind: ResourceKind,
    /// Resource type segment used in ARNs (for example `dataset-group`).
    pub arn_segment: &'static str,
    /// Parent kind, when the resource belongs to another resource.
    pub parent: Option<ResourceKind>,
    /// How the parent is discovered from a listing.
    pub parent_link: ParentLink,
    /// Whether the resource name embeds the workflow timestamp.
    pub timestamped: bool,
    /// Whether `List*` accepts a server-side `Status` filter.
    pub status_filter: bool,
    /// Retention policy applied when sweeping this kind.
    pub default_policy: RetentionPolicy,
}

const DATASET: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Dataset,
    arn_segment: "dataset",
    parent: Some(ResourceKind::DatasetGroup),
    parent_link: ParentLink::Membership,
    timestamped: false,
    status_filter: false,
    default_policy: RetentionPolicy::Cascade,
};

const DATASET_GROUP: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::DatasetGroup,
    arn_segment: "dataset-group",
    parent: None,
    parent_link: ParentLink::None,
    timestamped: true,
    status_filter: false,
    default_policy: RetentionPolicy::KeepLatest(2),
};

const DATASET_IMPORT_JOB: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::DatasetImportJob,
    arn_segment: "dataset-import-job",
    parent: Some(ResourceKind::Dataset),
    parent_link: ParentLink::ArnPath,
    timestamped: true,
    status_filter: true,
    default_policy: RetentionPolicy::KeepLatestPerParent(2),
};

const PREDICTOR: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Predictor,
    arn_segment: "predictor",
    parent: Some(ResourceKind::DatasetGroup),
    parent_link: ParentLink::Summary,
    timestamped: true,
    status_filter: true,
    default_policy: RetentionPolicy::KeepLatest(2),
};

const FORECAST: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Forecast,
    arn_segment: "forecast",
    parent: Some(ResourceKind::Predictor),
    parent_link: ParentLink::Summary,
    timestamped: true,
    status_filter: true,
    default_policy: RetentionPolicy::KeepLatest(2),
};

const FORECAST_EXPORT_JOB: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::ForecastExportJob,
    arn_segment: "forecast-export-job",
    parent: Some(ResourceKind::Forecast),
    parent_link: ParentLink::ArnPath,
    timestamped: true,
    status_filter: true,
    default_policy: RetentionPolicy::Cascade,
};

impl ResourceKind {
    /// Every kind, parents before children.
    pub const ALL: [Self; 6] = [
        Self::DatasetGroup,
        Self::Dataset,
        Self::DatasetImportJob,
        Self::Predictor,
        Self::Forecast,
        Self::ForecastExportJob,
    ];

    /// Returns the static descriptor for this kind.
    #[must_use]
    pub const fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            Self::Dataset => &DATASET,
            Self::DatasetGroup => &DATASET_GROUP,
            Self::DatasetImportJob => &DATASET_IMPORT_JOB,
            Self::Predictor => &PREDICTOR,
            Self::Forecast => &FORECAST,
            Self::ForecastExportJob => &FORECAST_EXPORT_JOB,
        }
    }

    /// Resource type segment used in ARNs.
    #[must_use]
    pub const fn arn_segment(self) -> &'static str {
        self.descriptor().arn_segment
    }

    /// Parent kind, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        self.descriptor().parent
    }

    /// Human readable label used in log and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::DatasetGroup => "dataset group",
            Self::DatasetImportJob => "dataset import job",
            Self::Predictor => "predictor",
            Self::Forecast => "forecast",
            Self::ForecastExportJob => "forecast export job",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dataset types supported by the Forecast API.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetType {
    /// The target time series being forecast.
    TargetTimeSeries,
    /// Related time series used as additional features.
    RelatedTimeSeries,
    /// Static item metadata.
    ItemMetadata,
}

impl DatasetType {
    /// Every dataset type.
    pub const ALL: [Self; 3] = [
        Self::TargetTimeSeries,
        Self::RelatedTimeSeries,
        Self::ItemMetadata,
    ];

    /// Returns the wire name used in dataset names and API calls.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TargetTimeSeries => "TARGET_TIME_SERIES",
            Self::RelatedTimeSeries => "RELATED_TIME_SERIES",
            Self::ItemMetadata => "ITEM_METADATA",
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while deriving names.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum NamingError {
    /// Raised when a project name cannot be used inside resource names.
    #[error("invalid project name '{value}': {reason}")]
    InvalidProjectName {
        /// Offending value after sanitisation.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// Raised when a timestamp does not match `YYYY_MM_DD_HH_MM_SS`.
    #[error("invalid workflow timestamp '{value}'")]
    InvalidTimestamp {
        /// Offending value.
        value: String,
    },
}

/// Derives the project name from a stack name.
///
/// Hyphens are replaced with underscores because Forecast resource names only
/// accept letters, digits and underscores. The result must start with a
/// letter.
///
/// # Errors
///
/// Returns [`NamingError::InvalidProjectName`] when the sanitised value is
/// empty, does not start with a letter, or contains other characters.
pub fn project_name(stack_name: &str) -> Result<String, NamingError> {
    let sanitised = stack_name.trim().replace('-', "_");
    validate_project_name(&sanitised)?;
    Ok(sanitised)
}

/// Validates an already sanitised project name.
///
/// # Errors
///
/// Returns [`NamingError::InvalidProjectName`] when the value is not a valid
/// resource name prefix.
pub fn validate_project_name(value: &str) -> Result<(), NamingError> {
    let invalid = |reason| NamingError::InvalidProjectName {
        value: value.to_owned(),
        reason,
    };
    let mut chars = value.chars();
    match chars.next() {
        None => return Err(invalid("must not be empty")),
        Some(first) if !first.is_ascii_alphabetic() => {
            return Err(invalid("must start with a letter"));
        }
        Some(_) => {}
    }
    if chars.any(|ch| !(ch.is_ascii_alphanumeric() || ch == '_')) {
        return Err(invalid("only letters, digits and underscores are allowed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
