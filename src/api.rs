//! Cloud API abstraction used by the reconciler and the retention sweeper.
//!
//! [`ForecastApi`] is the narrow surface of the managed forecasting service
//! the workflow relies on; [`MetricsSink`] receives predictor accuracy
//! metrics. The AWS implementations live in [`crate::aws`] and an in-memory
//! double lives in [`crate::test_support`].

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::params::{DatasetParams, PredictorParams};
use crate::resource::ResourceKind;
use crate::status::ResourceStatus;

/// Future returned by API operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Errors raised by API implementations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the addressed resource does not exist.
    #[error("{kind} not found: {arn}")]
    NotFound {
        /// Kind of the missing resource.
        kind: ResourceKind,
        /// ARN that was addressed.
        arn: String,
    },
    /// Raised when a create request races with another creator.
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// Kind being created.
        kind: ResourceKind,
        /// Name passed to the create call.
        name: String,
    },
    /// Raised when a delete is refused because dependants still exist.
    #[error("{kind} is in use: {arn}")]
    ResourceInUse {
        /// Kind being deleted.
        kind: ResourceKind,
        /// ARN that was addressed.
        arn: String,
    },
    /// Raised for every other service or transport failure.
    #[error("{operation} failed ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Service {
        /// API operation that failed, such as `CreatePredictor`.
        operation: String,
        /// Service error code when one was returned.
        code: Option<String>,
        /// Error message.
        message: String,
    },
}

/// Current state of a single resource.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceDescription {
    /// Resource ARN.
    pub arn: String,
    /// Lifecycle status.
    pub status: ResourceStatus,
    /// Status message, usually only set for failures.
    pub message: Option<String>,
}

/// Entry returned by a listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceSummary {
    /// Resource ARN.
    pub arn: String,
    /// Status, when the listing reports one.
    pub status: Option<ResourceStatus>,
    /// Parent ARN, when the listing reports one.
    pub parent_arn: Option<String>,
}

/// Request to create one resource.
#[derive(Clone, Debug, PartialEq)]
pub enum CreateRequest {
    /// `CreateDataset`.
    Dataset {
        /// Dataset name.
        name: String,
        /// Dataset settings from the parameter document.
        params: DatasetParams,
    },
    /// `CreateDatasetGroup`.
    DatasetGroup {
        /// Dataset group name.
        name: String,
        /// Forecast domain.
        domain: String,
        /// Datasets to include.
        dataset_arns: Vec<String>,
    },
    /// `CreateDatasetImportJob`.
    DatasetImportJob {
        /// Import job name.
        name: String,
        /// Dataset receiving the data.
        dataset_arn: String,
        /// `s3://` URI of the source data.
        s3_path: String,
        /// IAM role Forecast assumes to read the data.
        role_arn: String,
        /// Timestamp format of the source data.
        timestamp_format: String,
    },
    /// `CreatePredictor`.
    Predictor {
        /// Predictor name.
        name: String,
        /// Training settings from the parameter document.
        params: PredictorParams,
        /// Dataset group to train on.
        dataset_group_arn: String,
    },
    /// `CreateForecast`.
    Forecast {
        /// Forecast name.
        name: String,
        /// Predictor generating the forecast.
        predictor_arn: String,
        /// Quantiles to generate.
        forecast_types: Vec<String>,
    },
    /// `CreateForecastExportJob`.
    ForecastExportJob {
        /// Export job name.
        name: String,
        /// Forecast to export.
        forecast_arn: String,
        /// `s3://` URI of the destination.
        s3_path: String,
        /// IAM role Forecast assumes to write the data.
        role_arn: String,
    },
}

impl CreateRequest {
    /// Kind of resource this request creates.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Dataset { .. } => ResourceKind::Dataset,
            Self::DatasetGroup { .. } => ResourceKind::DatasetGroup,
            Self::DatasetImportJob { .. } => ResourceKind::DatasetImportJob,
            Self::Predictor { .. } => ResourceKind::Predictor,
            Self::Forecast { .. } => ResourceKind::Forecast,
            Self::ForecastExportJob { .. } => ResourceKind::ForecastExportJob,
        }
    }

    /// Name of the resource being created.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Dataset { name, .. }
            | Self::DatasetGroup { name, .. }
            | Self::DatasetImportJob { name, .. }
            | Self::Predictor { name, .. }
            | Self::Forecast { name, .. }
            | Self::ForecastExportJob { name, .. } => name,
        }
    }
}

/// Weighted quantile loss for one quantile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuantileLoss {
    /// Quantile, such as `0.5`.
    pub quantile: f64,
    /// Loss value.
    pub loss: f64,
}

/// Accuracy of one algorithm over the first test window.
#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmAccuracy {
    /// Algorithm ARN.
    pub algorithm_arn: String,
    /// Root mean square error, when reported.
    pub rmse: Option<f64>,
    /// Weighted quantile losses.
    pub weighted_quantile_losses: Vec<QuantileLoss>,
}

/// Operations the workflow needs from the forecasting service.
pub trait ForecastApi: Send + Sync {
    /// Describes one resource.
    ///
    /// Implementations return [`ApiError::NotFound`] when it does not exist.
    fn describe<'a>(
        &'a self,
        kind: ResourceKind,
        arn: &'a str,
    ) -> ApiFuture<'a, ResourceDescription>;

    /// Submits a create request and returns the new ARN.
    fn create<'a>(&'a self, request: &'a CreateRequest) -> ApiFuture<'a, String>;

    /// Requests deletion of one resource.
    fn delete<'a>(&'a self, kind: ResourceKind, arn: &'a str) -> ApiFuture<'a, ()>;

    /// Lists every resource of `kind`, following pagination.
    ///
    /// The status filter is applied server side when the kind supports it
    /// (see [`crate::resource::ResourceDescriptor::status_filter`]) and is
    /// ignored otherwise.
    fn list<'a>(
        &'a self,
        kind: ResourceKind,
        status: Option<&'a ResourceStatus>,
    ) -> ApiFuture<'a, Vec<ResourceSummary>>;

    /// Returns the dataset ARNs attached to a dataset group.
    fn dataset_group_members<'a>(&'a self, dataset_group_arn: &'a str)
    -> ApiFuture<'a, Vec<String>>;

    /// Returns per-algorithm accuracy metrics for a trained predictor.
    fn accuracy_metrics<'a>(
        &'a self,
        predictor_arn: &'a str,
    ) -> ApiFuture<'a, Vec<AlgorithmAccuracy>>;
}

/// Name and value of a metric dimension.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetricDimension {
    /// Dimension name.
    pub name: String,
    /// Dimension value.
    pub value: String,
}

/// One metric data point.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricDatum {
    /// Metric name, such as `RMSE`.
    pub name: String,
    /// Metric value.
    pub value: f64,
    /// Dimensions qualifying the value.
    pub dimensions: Vec<MetricDimension>,
}

impl MetricDatum {
    /// Builds a datum from `(name, value)` dimension pairs.
    #[must_use]
    pub fn new(name: &str, value: f64, dimensions: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_owned(),
            value,
            dimensions: dimensions
                .iter()
                .map(|(dim_name, dim_value)| MetricDimension {
                    name: (*dim_name).to_owned(),
                    value: (*dim_value).to_owned(),
                })
                .collect(),
        }
    }
}

/// Destination for metric data.
pub trait MetricsSink: Send + Sync {
    /// Publishes `data` under `namespace`.
    fn emit<'a>(&'a self, namespace: &'a str, data: &'a [MetricDatum]) -> ApiFuture<'a, ()>;
}
