//! The workflow's step functions.
//!
//! [`Flow`] owns the injected clients and deployment settings and exposes
//! one method per step. Each method takes the accumulated
//! [`WorkflowEvent`], does its work through the reconciler or the sweeper and
//! returns the updated event when its resources are ready.

mod create;
mod delete;
mod init;

use camino::Utf8PathBuf;

use crate::api::{ForecastApi, MetricsSink};
use crate::cli::StepName;
use crate::config::{ConfigError, FlowConfig};
use crate::event::WorkflowEvent;
use crate::logging::traced_step;
use crate::outcome::{Pending, StepError, StepOutcome};
use crate::reconcile::ResourceHandle;
use crate::resource::WorkflowTimestamp;

pub use create::accuracy_data;

/// Deployment settings the steps need, resolved from [`FlowConfig`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlowSettings {
    /// Project name prefixing every resource.
    pub project_name: String,
    /// Location of the parameter document.
    pub params_path: Utf8PathBuf,
    /// `s3://` URI of the target time series.
    pub import_source: String,
    /// `s3://` URI receiving forecast exports.
    pub export_destination: String,
    /// Role assumed by import jobs.
    pub import_role_arn: String,
    /// Role assumed by export jobs.
    pub export_role_arn: String,
    /// Namespace receiving predictor metrics.
    pub metrics_namespace: String,
}

impl FlowSettings {
    /// Resolves settings from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is incomplete.
    pub fn from_config(config: &FlowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            project_name: config.project_name()?,
            params_path: Utf8PathBuf::from(config.params_path.as_str()),
            import_source: config.import_source(),
            export_destination: config.export_destination(),
            import_role_arn: config.import_job_role_arn.clone(),
            export_role_arn: config.export_job_role_arn.clone(),
            metrics_namespace: config.metrics_namespace.clone(),
        })
    }
}

/// Step runner with its clients injected.
pub struct Flow<A, M> {
    api: A,
    metrics: M,
    settings: FlowSettings,
    account_id: String,
    region: String,
}

impl<A: ForecastApi, M: MetricsSink> Flow<A, M> {
    /// Assembles a runner for one account and region.
    #[must_use]
    pub fn new(
        api: A,
        metrics: M,
        settings: FlowSettings,
        account_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            api,
            metrics,
            settings,
            account_id: account_id.into(),
            region: region.into(),
        }
    }

    /// Forecast client used by the steps.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Metrics sink used by the predictor step.
    #[must_use]
    pub const fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Deployment settings.
    #[must_use]
    pub const fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// Runs `step` against `event` inside a traced span.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the step cannot run to an outcome.
    pub async fn run(
        &self,
        step: StepName,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        self.run_at(step, event, WorkflowTimestamp::now()).await
    }

    /// Runs `step` with `now` as the timestamp for init steps.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the step cannot run to an outcome.
    pub async fn run_at(
        &self,
        step: StepName,
        event: WorkflowEvent,
        now: WorkflowTimestamp,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let trace_id = event.trace_id_or_default().to_owned();
        traced_step(step.as_str(), &trace_id, self.dispatch(step, event, now)).await
    }

    async fn dispatch(
        &self,
        step: StepName,
        event: WorkflowEvent,
        now: WorkflowTimestamp,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        match step {
            StepName::InitUpdateModelFlow => self.init_update_model_flow(event, now),
            StepName::InitUpdateForecastFlow => self.init_update_forecast_flow(event, now).await,
            StepName::CreateDataset => self.create_dataset(event).await,
            StepName::CreateDatasetGroup => self.create_dataset_group(event).await,
            StepName::CreateDatasetImportJob => self.create_dataset_import_job(event).await,
            StepName::CreatePredictor => self.create_predictor(event).await,
            StepName::CreateForecast => self.create_forecast(event).await,
            StepName::CreateForecastExportJob => self.create_forecast_export_job(event).await,
            StepName::DeleteOutdatedDatasetGroups => self.delete_outdated_dataset_groups(event).await,
            StepName::DeleteOutdatedDatasets => self.delete_outdated_datasets(event).await,
            StepName::DeleteOutdatedDatasetImportJobs => {
                self.delete_outdated_dataset_import_jobs(event).await
            }
            StepName::DeleteOutdatedPredictors => self.delete_outdated_predictors(event).await,
            StepName::DeleteOutdatedForecasts => self.delete_outdated_forecasts(event).await,
            StepName::DeleteOutdatedForecastExportJobs => {
                self.delete_outdated_forecast_export_jobs(event).await
            }
        }
    }
}

/// Folds several reconcile outcomes into one.
///
/// The first failure wins; otherwise every pending ARN is reported together.
fn combine(outcomes: Vec<StepOutcome<ResourceHandle>>) -> StepOutcome<Vec<ResourceHandle>> {
    let mut ready = Vec::new();
    let mut waiting: Option<Pending> = None;
    for outcome in outcomes {
        match outcome {
            StepOutcome::Ready(handle) => ready.push(handle),
            StepOutcome::Failed(failure) => return StepOutcome::Failed(failure),
            StepOutcome::Pending(pending) => match waiting.as_mut() {
                Some(merged) => {
                    merged.arns.extend(pending.arns);
                    merged.detail = format!("{}; {}", merged.detail, pending.detail);
                }
                None => waiting = Some(pending),
            },
        }
    }
    waiting.map_or(StepOutcome::Ready(ready), StepOutcome::Pending)
}
