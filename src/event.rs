//! Workflow event accumulated by the state machine between steps.
//!
//! Steps receive the event, read what earlier steps recorded, add their own
//! results and hand it back. Keys the workflow does not know about are kept
//! verbatim so the orchestrator can carry its own bookkeeping through.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::context::ProjectContext;
use crate::params::{
    DatasetGroupParams, DatasetParams, ForecastParams, PredictorParams, WorkflowParams,
};
use crate::resource::{NamingError, WorkflowTimestamp};

/// Errors raised when an event lacks what a step needs.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EventError {
    /// Raised when a required key is absent.
    #[error("event is missing {field}; run the preceding step first")]
    MissingField {
        /// Event key that was expected.
        field: &'static str,
    },
    /// Raised when the recorded project context is invalid.
    #[error(transparent)]
    Naming(#[from] NamingError),
}

/// State passed from step to step.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowEvent {
    /// Project name derived from the stack name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// AWS account id.
    #[serde(rename = "AccountID", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// AWS region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Workflow timestamp.
    #[serde(
        alias = "TriggeredAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_date: Option<WorkflowTimestamp>,
    /// Trace id attached to logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Name of the state machine running the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_machine_name: Option<String>,

    /// Datasets from the parameter document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets: Option<Vec<DatasetParams>>,
    /// Dataset group settings from the parameter document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_group: Option<DatasetGroupParams>,
    /// Predictor settings from the parameter document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor: Option<PredictorParams>,
    /// Forecast settings from the parameter document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast: Option<ForecastParams>,
    /// Timestamp format of the imported data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_format: Option<String>,

    /// Name of the target time series dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    /// ARN of the target time series dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_arn: Option<String>,
    /// ARNs of every dataset created for the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_arns: Option<Vec<String>>,
    /// Dataset group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_group_name: Option<String>,
    /// Dataset group ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_group_arn: Option<String>,
    /// Import job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_import_job_name: Option<String>,
    /// Import job ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_import_job_arn: Option<String>,
    /// Predictor name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor_name: Option<String>,
    /// Predictor ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor_arn: Option<String>,
    /// Set once the predictor's accuracy metrics were published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictor_metrics_published: Option<bool>,
    /// Forecast name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_name: Option<String>,
    /// Forecast ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_arn: Option<String>,
    /// Export job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_export_job_name: Option<String>,
    /// Export job ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_export_job_arn: Option<String>,

    /// Keys owned by the orchestrator.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Returns the value of a required event key.
///
/// # Errors
///
/// Returns [`EventError::MissingField`] naming `field` when `value` is
/// `None`.
pub const fn require<'a, T>(value: Option<&'a T>, field: &'static str) -> Result<&'a T, EventError> {
    match value {
        Some(found) => Ok(found),
        None => Err(EventError::MissingField { field }),
    }
}

impl WorkflowEvent {
    /// Rebuilds the project context recorded by the init step.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::MissingField`] when `ProjectName`, `AccountID`,
    /// `Region` or `CurrentDate` is absent, and [`EventError::Naming`] when
    /// the project name is invalid.
    pub fn context(&self) -> Result<ProjectContext, EventError> {
        let project = require(self.project_name.as_ref(), "ProjectName")?;
        let account = require(self.account_id.as_ref(), "AccountID")?;
        let region = require(self.region.as_ref(), "Region")?;
        let timestamp = *require(self.current_date.as_ref(), "CurrentDate")?;
        let context = ProjectContext::new(project.as_str(), account.as_str(), region.as_str(), timestamp)?;
        Ok(match &self.trace_id {
            Some(trace_id) => context.with_trace_id(trace_id.as_str()),
            None => context,
        })
    }

    /// Records a freshly built project context.
    pub fn record_context(&mut self, context: &ProjectContext) {
        self.project_name = Some(context.project_name().to_owned());
        self.account_id = Some(context.account_id().to_owned());
        self.region = Some(context.region().to_owned());
        self.current_date = Some(context.timestamp());
        self.trace_id = Some(context.trace_id().to_owned());
    }

    /// Merges the parameter document into the event.
    pub fn record_params(&mut self, params: WorkflowParams) {
        self.datasets = Some(params.datasets);
        self.dataset_group = Some(params.dataset_group);
        self.predictor = Some(params.predictor);
        self.forecast = Some(params.forecast);
        self.timestamp_format = Some(params.timestamp_format);
    }

    /// Trace id for log correlation, or `INITIALIZING` before init ran.
    #[must_use]
    pub fn trace_id_or_default(&self) -> &str {
        self.trace_id.as_deref().unwrap_or("INITIALIZING")
    }
}
