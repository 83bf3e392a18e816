//! Steps that create this run's resources.

use tracing::{info, warn};

use super::{Flow, combine};
use crate::api::{AlgorithmAccuracy, ForecastApi, MetricDatum, MetricsSink};
use crate::event::{WorkflowEvent, require};
use crate::outcome::{StepError, StepOutcome};
use crate::reconcile::{Reconciler, ResourceHandle, ResourceSpec};
use crate::resource::{DatasetType, arn};

impl<A: ForecastApi, M: MetricsSink> Flow<A, M> {
    /// Reconciles every dataset of the parameter document.
    ///
    /// Records `DatasetArns` for the group and the target time series as
    /// `DatasetName`/`DatasetArn` for the import job.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the event lacks the context or `Datasets`,
    /// or when an API call fails.
    pub async fn create_dataset(
        &self,
        mut event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = event.context()?;
        let datasets = require(event.datasets.as_ref(), "Datasets")?.clone();
        let reconciler = Reconciler::new(&self.api, &context);

        let mut outcomes = Vec::with_capacity(datasets.len());
        for params in datasets {
            outcomes.push(reconciler.reconcile(ResourceSpec::Dataset { params }).await?);
        }
        let handles = match combine(outcomes) {
            StepOutcome::Ready(handles) => handles,
            StepOutcome::Pending(pending) => return Ok(StepOutcome::Pending(pending)),
            StepOutcome::Failed(failure) => return Ok(StepOutcome::Failed(failure)),
        };
        let primary_name = arn::dataset_name(
            context.project_name(),
            DatasetType::TargetTimeSeries,
        );
        let Some(primary) = handles.iter().find(|handle| handle.name == primary_name) else {
            return Err(StepError::PreconditionMissing(String::from(
                "Datasets has no TARGET_TIME_SERIES dataset",
            )));
        };
        event.dataset_name = Some(primary.name.clone());
        event.dataset_arn = Some(primary.arn.clone());
        event.dataset_arns = Some(handles.into_iter().map(|handle| handle.arn).collect());
        Ok(StepOutcome::Ready(event))
    }

    /// Reconciles this run's dataset group over every created dataset.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the event lacks `DatasetGroup` or
    /// `DatasetArns`, or when an API call fails.
    pub async fn create_dataset_group(
        &self,
        mut event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = event.context()?;
        let spec = ResourceSpec::DatasetGroup {
            domain: require(event.dataset_group.as_ref(), "DatasetGroup")?
                .domain
                .clone(),
            dataset_arns: require(event.dataset_arns.as_ref(), "DatasetArns")?.clone(),
        };
        let outcome = Reconciler::new(&self.api, &context).reconcile(spec).await?;
        Ok(outcome.map(|handle| {
            event.dataset_group_name = Some(handle.name);
            event.dataset_group_arn = Some(handle.arn);
            event
        }))
    }

    /// Reconciles this run's import of the target time series.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the event lacks `DatasetName`,
    /// `DatasetArn` or `TimestampFormat`, or when an API call fails.
    pub async fn create_dataset_import_job(
        &self,
        mut event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = event.context()?;
        let spec = ResourceSpec::DatasetImportJob {
            dataset_name: require(event.dataset_name.as_ref(), "DatasetName")?.clone(),
            dataset_arn: require(event.dataset_arn.as_ref(), "DatasetArn")?.clone(),
            s3_path: self.settings.import_source.clone(),
            role_arn: self.settings.import_role_arn.clone(),
            timestamp_format: require(event.timestamp_format.as_ref(), "TimestampFormat")?
                .clone(),
        };
        let outcome = Reconciler::new(&self.api, &context).reconcile(spec).await?;
        Ok(outcome.map(|handle| {
            event.dataset_import_job_name = Some(handle.name);
            event.dataset_import_job_arn = Some(handle.arn);
            event
        }))
    }

    /// Reconciles this run's predictor and publishes its accuracy once.
    ///
    /// Metrics are published on the first invocation that sees the
    /// predictor `ACTIVE`; `PredictorMetricsPublished` keeps later
    /// invocations of the same run from publishing again.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the event lacks `Predictor` or
    /// `DatasetGroupArn`, or when an API or metrics call fails.
    pub async fn create_predictor(
        &self,
        mut event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = event.context()?;
        let spec = ResourceSpec::Predictor {
            params: require(event.predictor.as_ref(), "Predictor")?.clone(),
            dataset_group_arn: require(event.dataset_group_arn.as_ref(), "DatasetGroupArn")?
                .clone(),
        };
        let outcome = Reconciler::new(&self.api, &context).reconcile(spec).await?;
        let handle = match outcome {
            StepOutcome::Ready(handle) => handle,
            StepOutcome::Pending(pending) => return Ok(StepOutcome::Pending(pending)),
            StepOutcome::Failed(failure) => return Ok(StepOutcome::Failed(failure)),
        };
        if event.predictor_metrics_published != Some(true) {
            self.publish_accuracy(&handle).await?;
            event.predictor_metrics_published = Some(true);
        }
        event.predictor_name = Some(handle.name);
        event.predictor_arn = Some(handle.arn);
        Ok(StepOutcome::Ready(event))
    }

    /// Reconciles this run's forecast from `PredictorArn`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the event lacks `PredictorArn`, or when an
    /// API call fails.
    pub async fn create_forecast(
        &self,
        mut event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = event.context()?;
        let spec = ResourceSpec::Forecast {
            predictor_arn: require(event.predictor_arn.as_ref(), "PredictorArn")?.clone(),
            forecast_types: event
                .forecast
                .as_ref()
                .map(|forecast| forecast.forecast_types.clone())
                .unwrap_or_default(),
        };
        let outcome = Reconciler::new(&self.api, &context).reconcile(spec).await?;
        Ok(outcome.map(|handle| {
            event.forecast_name = Some(handle.name);
            event.forecast_arn = Some(handle.arn);
            event
        }))
    }

    /// Reconciles this run's export of the forecast.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the event lacks `ForecastName` or
    /// `ForecastArn`, or when an API call fails.
    pub async fn create_forecast_export_job(
        &self,
        mut event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = event.context()?;
        let spec = ResourceSpec::ForecastExportJob {
            forecast_name: require(event.forecast_name.as_ref(), "ForecastName")?.clone(),
            forecast_arn: require(event.forecast_arn.as_ref(), "ForecastArn")?.clone(),
            s3_path: self.settings.export_destination.clone(),
            role_arn: self.settings.export_role_arn.clone(),
        };
        let outcome = Reconciler::new(&self.api, &context).reconcile(spec).await?;
        Ok(outcome.map(|handle| {
            event.forecast_export_job_name = Some(handle.name);
            event.forecast_export_job_arn = Some(handle.arn);
            event
        }))
    }

    async fn publish_accuracy(&self, predictor: &ResourceHandle) -> Result<(), StepError> {
        let accuracy = self.api.accuracy_metrics(&predictor.arn).await?;
        let data = accuracy_data(&accuracy);
        if data.is_empty() {
            warn!(predictor = %predictor.arn, "predictor reported no accuracy metrics");
            return Ok(());
        }
        self.metrics
            .emit(&self.settings.metrics_namespace, &data)
            .await?;
        info!(
            predictor = %predictor.arn,
            namespace = %self.settings.metrics_namespace,
            count = data.len(),
            "published predictor accuracy metrics"
        );
        Ok(())
    }
}

/// Converts accuracy metrics into `WQL` and `RMSE` data points.
///
/// Each algorithm yields one `WQL` datum per quantile, dimensioned by
/// `Algorithm` and `Quantile`, followed by one `RMSE` datum dimensioned by
/// `Algorithm` when the service reported it.
#[must_use]
pub fn accuracy_data(accuracy: &[AlgorithmAccuracy]) -> Vec<MetricDatum> {
    let mut data = Vec::new();
    for algorithm in accuracy {
        let name = algorithm.algorithm_arn.as_str();
        for loss in &algorithm.weighted_quantile_losses {
            let quantile = loss.quantile.to_string();
            data.push(MetricDatum::new(
                "WQL",
                loss.loss,
                &[("Algorithm", name), ("Quantile", quantile.as_str())],
            ));
        }
        if let Some(rmse) = algorithm.rmse {
            data.push(MetricDatum::new("RMSE", rmse, &[("Algorithm", name)]));
        }
    }
    data
}
