//! Idempotent create-or-describe reconciliation.
//!
//! Every creation step derives the resource's name and ARN from the project
//! context, describes it, creates it when absent and classifies the status.
//! Calling a step again with the same context never creates a second
//! resource: the describe finds the first one and the step only reports its
//! progress.

use tracing::{debug, info, warn};

use crate::api::{ApiError, CreateRequest, ForecastApi, ResourceDescription};
use crate::context::ProjectContext;
use crate::outcome::{Failure, Pending, StepOutcome};
use crate::params::{DatasetParams, PredictorParams};
use crate::resource::{ResourceKind, arn};
use crate::status::{Readiness, ResourceStatus};

/// Desired state of one resource, with its parents' ARNs resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceSpec {
    /// A dataset of one type.
    Dataset {
        /// Dataset settings.
        params: DatasetParams,
    },
    /// This run's dataset group.
    DatasetGroup {
        /// Forecast domain.
        domain: String,
        /// Datasets to include.
        dataset_arns: Vec<String>,
    },
    /// This run's import job for one dataset.
    DatasetImportJob {
        /// Name of the dataset receiving the data.
        dataset_name: String,
        /// ARN of the dataset receiving the data.
        dataset_arn: String,
        /// `s3://` URI of the source data.
        s3_path: String,
        /// IAM role Forecast assumes to read the data.
        role_arn: String,
        /// Timestamp format of the source data.
        timestamp_format: String,
    },
    /// This run's predictor.
    Predictor {
        /// Training settings.
        params: PredictorParams,
        /// Dataset group to train on.
        dataset_group_arn: String,
    },
    /// This run's forecast.
    Forecast {
        /// Predictor generating the forecast.
        predictor_arn: String,
        /// Quantiles to generate.
        forecast_types: Vec<String>,
    },
    /// This run's export job.
    ForecastExportJob {
        /// Name of the forecast being exported.
        forecast_name: String,
        /// ARN of the forecast being exported.
        forecast_arn: String,
        /// `s3://` URI of the destination.
        s3_path: String,
        /// IAM role Forecast assumes to write the data.
        role_arn: String,
    },
}

/// Name and ARN derived for a resource.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceIdentity {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource name.
    pub name: String,
    /// Resource ARN.
    pub arn: String,
}

/// A reconciled resource and its current status.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceHandle {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource name.
    pub name: String,
    /// Resource ARN.
    pub arn: String,
    /// Lifecycle status observed by the last describe.
    pub status: ResourceStatus,
    /// Status message reported by the service.
    pub message: Option<String>,
}

impl ResourceSpec {
    /// Kind of resource described by this spec.
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

    /// Derives the resource's name and ARN for this run.
    #[must_use]
    pub fn identity(&self, context: &ProjectContext) -> ResourceIdentity {
        let kind = self.kind();
        let project = context.project_name();
        let (name, parent_name) = match self {
            Self::Dataset { params } => (arn::dataset_name(project, params.dataset_type), None),
            Self::DatasetGroup { .. } | Self::Predictor { .. } | Self::Forecast { .. } => {
                (context.generation_name(project), None)
            }
            Self::DatasetImportJob { dataset_name, .. } => {
                (context.generation_name(dataset_name), Some(dataset_name.as_str()))
            }
            Self::ForecastExportJob { forecast_name, .. } => {
                (context.generation_name(forecast_name), Some(forecast_name.as_str()))
            }
        };
        let arn = context.arn(kind, &name, parent_name);
        ResourceIdentity { kind, name, arn }
    }

    /// Builds the create request for a resource called `name`.
    #[must_use]
    pub fn into_request(self, name: String) -> CreateRequest {
        match self {
            Self::Dataset { params } => CreateRequest::Dataset { name, params },
            Self::DatasetGroup {
                domain,
                dataset_arns,
            } => CreateRequest::DatasetGroup {
                name,
                domain,
                dataset_arns,
            },
            Self::DatasetImportJob {
                dataset_arn,
                s3_path,
                role_arn,
                timestamp_format,
                ..
            } => CreateRequest::DatasetImportJob {
                name,
                dataset_arn,
                s3_path,
                role_arn,
                timestamp_format,
            },
            Self::Predictor {
                params,
                dataset_group_arn,
            } => CreateRequest::Predictor {
                name,
                params,
                dataset_group_arn,
            },
            Self::Forecast {
                predictor_arn,
                forecast_types,
            } => CreateRequest::Forecast {
                name,
                predictor_arn,
                forecast_types,
            },
            Self::ForecastExportJob {
                forecast_arn,
                s3_path,
                role_arn,
                ..
            } => CreateRequest::ForecastExportJob {
                name,
                forecast_arn,
                s3_path,
                role_arn,
            },
        }
    }
}

/// Ensures resources exist and reports their readiness.
pub struct Reconciler<'a, A: ForecastApi + ?Sized> {
    api: &'a A,
    context: &'a ProjectContext,
}

impl<'a, A: ForecastApi + ?Sized> Reconciler<'a, A> {
    /// Creates a reconciler for one workflow run.
    #[must_use]
    pub const fn new(api: &'a A, context: &'a ProjectContext) -> Self {
        Self { api, context }
    }

    /// Describes the resource, creating it first when it does not exist.
    ///
    /// A create that loses a race with a concurrent creator is tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when a describe or create call fails for any
    /// other reason.
    pub async fn reconcile(
        &self,
        spec: ResourceSpec,
    ) -> Result<StepOutcome<ResourceHandle>, ApiError> {
        let identity = spec.identity(self.context);
        let description = match self.api.describe(identity.kind, &identity.arn).await {
            Ok(found) => {
                debug!(kind = %identity.kind, arn = %identity.arn, status = %found.status, "resource exists");
                found
            }
            Err(ApiError::NotFound { .. }) => {
                self.create(spec, &identity).await?;
                self.api.describe(identity.kind, &identity.arn).await?
            }
            Err(err) => return Err(err),
        };
        Ok(into_outcome(identity, description))
    }

    async fn create(&self, spec: ResourceSpec, identity: &ResourceIdentity) -> Result<(), ApiError> {
        info!(kind = %identity.kind, arn = %identity.arn, "creating resource");
        let request = spec.into_request(identity.name.clone());
        match self.api.create(&request).await {
            Ok(created) if created != identity.arn => {
                warn!(
                    kind = %identity.kind,
                    expected = %identity.arn,
                    created = %created,
                    "service returned an unexpected ARN"
                );
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(ApiError::AlreadyExists { .. }) => {
                warn!(kind = %identity.kind, arn = %identity.arn, "resource was created concurrently");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

fn into_outcome(
    identity: ResourceIdentity,
    description: ResourceDescription,
) -> StepOutcome<ResourceHandle> {
    let ResourceIdentity { kind, name, arn } = identity;
    let ResourceDescription {
        status, message, ..
    } = description;
    match status.readiness() {
        Readiness::Ready => StepOutcome::Ready(ResourceHandle {
            kind,
            name,
            arn,
            status,
            message,
        }),
        Readiness::Pending => StepOutcome::Pending(Pending {
            kind,
            detail: format!("{arn} is {status}"),
            arns: vec![arn],
        }),
        Readiness::Failed => StepOutcome::Failed(Failure {
            kind,
            arn,
            status,
            message,
        }),
    }
}
