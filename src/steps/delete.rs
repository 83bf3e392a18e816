//! Steps that garbage-collect outdated generations.

use super::Flow;
use crate::api::{ForecastApi, MetricsSink};
use crate::event::{WorkflowEvent, require};
use crate::outcome::{StepError, StepOutcome};
use crate::resource::ResourceKind;
use crate::retention::Sweeper;

impl<A: ForecastApi, M: MetricsSink> Flow<A, M> {
    /// Deletes all but the two newest dataset groups of the project.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when `ProjectName` is missing or an API call
    /// fails.
    pub async fn delete_outdated_dataset_groups(
        &self,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        self.sweep_step(ResourceKind::DatasetGroup, event).await
    }

    /// Deletes datasets referenced only by outdated dataset groups.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when `ProjectName` is missing or an API call
    /// fails.
    pub async fn delete_outdated_datasets(
        &self,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        self.sweep_step(ResourceKind::Dataset, event).await
    }

    /// Deletes import jobs older than the newest two of each dataset.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when `ProjectName` is missing or an API call
    /// fails.
    pub async fn delete_outdated_dataset_import_jobs(
        &self,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        self.sweep_step(ResourceKind::DatasetImportJob, event).await
    }

    /// Deletes all but the two newest predictors of the project.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when `ProjectName` is missing or an API call
    /// fails.
    pub async fn delete_outdated_predictors(
        &self,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        self.sweep_step(ResourceKind::Predictor, event).await
    }

    /// Deletes all but the two newest forecasts of the project.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when `ProjectName` is missing or an API call
    /// fails.
    pub async fn delete_outdated_forecasts(
        &self,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        self.sweep_step(ResourceKind::Forecast, event).await
    }

    /// Deletes export jobs of outdated forecasts.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when `ProjectName` is missing or an API call
    /// fails.
    pub async fn delete_outdated_forecast_export_jobs(
        &self,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        self.sweep_step(ResourceKind::ForecastExportJob, event).await
    }

    async fn sweep_step(
        &self,
        kind: ResourceKind,
        event: WorkflowEvent,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let project = require(event.project_name.as_ref(), "ProjectName")?;
        let outcome = Sweeper::new(&self.api, project).sweep(kind).await?;
        Ok(outcome.map(|_| event))
    }
}
