//! ARN derivation and parsing for the workflow naming convention.
//!
//! ```text
//! dataset              dataset/{project}_{datasetType}
//! dataset-group        dataset-group/{project}_{timestamp}
//! dataset-import-job   dataset-import-job/{datasetName}/{datasetName}_{timestamp}
//! predictor            predictor/{project}_{timestamp}
//! forecast             forecast/{project}_{timestamp}
//! forecast-export-job  forecast-export-job/{forecastName}/{forecastName}_{timestamp}
//! ```
//!
//! The project segment is matched lazily, so a project called `acme_2024`
//! cannot be told apart from project `acme` in every position. Sweeps compare
//! the parsed project for exact equality, which keeps `acme_west` resources
//! away from an `acme` sweep.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{DatasetType, ResourceKind, WorkflowTimestamp};

const PREFIX: &str = r"^(?P<prefix>arn:aws[a-z-]*:forecast:[^:]+:[^:]+:)";
const TIMESTAMP: &str = r"[0-9]{4}_[0-9]{2}_[0-9]{2}_[0-9]{2}_[0-9]{2}_[0-9]{2}";
const DATASET_TYPES: &str = "TARGET_TIME_SERIES|RELATED_TIME_SERIES|ITEM_METADATA";

#[expect(
    clippy::expect_used,
    reason = "patterns are built from constants and covered by unit tests"
)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static ARN pattern must compile")
}

static DATASET_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "{PREFIX}dataset/(?P<name>(?P<project>.+?)_(?P<dtype>{DATASET_TYPES}))$"
    ))
});

static GENERATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "{PREFIX}(?P<segment>dataset-group|predictor|forecast)/(?P<name>(?P<project>.+?)_(?P<ts>{TIMESTAMP}))$"
    ))
});

static IMPORT_JOB_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "{PREFIX}dataset-import-job/(?P<parent>(?P<project>.+?)_(?:{DATASET_TYPES}))/(?P<name>(?P<stem>.+)_(?P<ts>{TIMESTAMP}))$"
    ))
});

static EXPORT_JOB_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        "{PREFIX}forecast-export-job/(?P<parent>(?P<project>.+?)_(?:{TIMESTAMP}))/(?P<name>(?P<stem>.+)_(?P<ts>{TIMESTAMP}))$"
    ))
});

/// ARN partition hosting `region`.
#[must_use]
pub fn partition(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else {
        "aws"
    }
}

/// Builds the ARN prefix shared by every resource of an account and region.
#[must_use]
pub fn arn_prefix(region: &str, account_id: &str) -> String {
    format!("arn:{}:forecast:{region}:{account_id}:", partition(region))
}

/// Name of the dataset of `dataset_type` owned by `project`.
#[must_use]
pub fn dataset_name(project: &str, dataset_type: DatasetType) -> String {
    format!("{project}_{dataset_type}")
}

/// Name of one generation of a timestamped resource.
///
/// `stem` is the project name for groups, predictors and forecasts, and the
/// parent's name for import and export jobs.
#[must_use]
pub fn generation_name(stem: &str, timestamp: WorkflowTimestamp) -> String {
    format!("{stem}_{timestamp}")
}

/// Builds the ARN of a resource from its name.
///
/// `parent_name` is only used by the nested kinds (import and export jobs)
/// whose ARN path embeds the parent's name.
#[must_use]
pub fn resource_arn(
    prefix: &str,
    kind: ResourceKind,
    name: &str,
    parent_name: Option<&str>,
) -> String {
    let segment = kind.arn_segment();
    match (kind, parent_name) {
        (ResourceKind::DatasetImportJob | ResourceKind::ForecastExportJob, Some(parent)) => {
            format!("{prefix}{segment}/{parent}/{name}")
        }
        _ => format!("{prefix}{segment}/{name}"),
    }
}

/// Components recovered from an ARN that follows the naming convention.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedArn {
    /// Kind the ARN was parsed as.
    pub kind: ResourceKind,
    /// `arn:aws:forecast:{region}:{account}:` prefix.
    pub prefix: String,
    /// Resource name (last path segment).
    pub name: String,
    /// Project the resource belongs to.
    pub project: String,
    /// Generation timestamp; absent for datasets.
    pub timestamp: Option<WorkflowTimestamp>,
    /// Parent name embedded in the ARN path of import and export jobs.
    pub parent_name: Option<String>,
}

impl ParsedArn {
    /// Rebuilds the parent ARN for kinds whose ARN embeds the parent name.
    #[must_use]
    pub fn parent_arn(&self) -> Option<String> {
        let parent_kind = self.kind.parent()?;
        let parent_name = self.parent_name.as_deref()?;
        Some(resource_arn(&self.prefix, parent_kind, parent_name, None))
    }
}

/// Parses `arn` as a resource of `kind`.
///
/// Returns `None` when the ARN does not follow the naming convention, when
/// a nested job's name does not start with its parent's name, or when the
/// embedded timestamp names an impossible date.
#[must_use]
pub fn parse_arn(kind: ResourceKind, arn: &str) -> Option<ParsedArn> {
    match kind {
        ResourceKind::Dataset => {
            let caps = DATASET_RE.captures(arn)?;
            Some(parsed(kind, &caps, None, None))
        }
        ResourceKind::DatasetGroup | ResourceKind::Predictor | ResourceKind::Forecast => {
            let caps = GENERATION_RE.captures(arn)?;
            if caps.name("segment")?.as_str() != kind.arn_segment() {
                return None;
            }
            let timestamp = capture_timestamp(&caps)?;
            Some(parsed(kind, &caps, Some(timestamp), None))
        }
        ResourceKind::DatasetImportJob => parse_nested(kind, &IMPORT_JOB_RE, arn),
        ResourceKind::ForecastExportJob => {
            let parsed_arn = parse_nested(kind, &EXPORT_JOB_RE, arn)?;
            // The parent forecast name must carry a valid timestamp as well.
            let parent = parsed_arn.parent_arn()?;
            parse_arn(ResourceKind::Forecast, &parent)?;
            Some(parsed_arn)
        }
    }
}

/// Parent ARN derivable from `arn` alone, for the nested kinds.
#[must_use]
pub fn parent_arn(kind: ResourceKind, arn: &str) -> Option<String> {
    parse_arn(kind, arn)?.parent_arn()
}

fn parse_nested(kind: ResourceKind, pattern: &Regex, arn: &str) -> Option<ParsedArn> {
    let caps = pattern.captures(arn)?;
    let parent = caps.name("parent")?.as_str();
    if caps.name("stem")?.as_str() != parent {
        return None;
    }
    let timestamp = capture_timestamp(&caps)?;
    Some(parsed(kind, &caps, Some(timestamp), Some(parent.to_owned())))
}

fn capture_timestamp(caps: &Captures<'_>) -> Option<WorkflowTimestamp> {
    WorkflowTimestamp::parse(caps.name("ts")?.as_str()).ok()
}

fn parsed(
    kind: ResourceKind,
    caps: &Captures<'_>,
    timestamp: Option<WorkflowTimestamp>,
    parent_name: Option<String>,
) -> ParsedArn {
    let text = |group: &str| {
        caps.name(group)
            .map(|found| found.as_str().to_owned())
            .unwrap_or_default()
    };
    ParsedArn {
        kind,
        prefix: text("prefix"),
        name: text("name"),
        project: text("project"),
        timestamp,
        parent_name,
    }
}
