//! AWS Lambda adapter.
//!
//! Each step is deployed as its own function. The state machine passes the
//! accumulated [`WorkflowEvent`] in and receives the updated event back;
//! anything other than a ready outcome is raised as a typed error so retry
//! and catch rules can match on its error type.

use std::sync::Arc;

use lambda_runtime::{Diagnostic, LambdaEvent, service_fn};
use thiserror::Error;
use tracing::info;

use crate::api::{ForecastApi, MetricsSink};
use crate::cli::StepName;
use crate::config::ConfigError;
use crate::event::WorkflowEvent;
use crate::outcome::{StepError, StepOutcome};
use crate::steps::Flow;

/// Error type raised while a resource is still transitioning.
pub const RESOURCE_PENDING: &str = "ResourcePending";
/// Error type raised when a resource reached a failed state.
pub const RESOURCE_FAILED: &str = "ResourceFailed";
/// Error type raised when a prerequisite resource was never created.
pub const PRECONDITION_MISSING: &str = "PreconditionMissing";
/// Error type raised for events the step cannot use.
pub const INVALID_EVENT: &str = "InvalidEvent";
/// Error type raised when a service call fails.
pub const API_ERROR: &str = "ApiError";
/// Error type raised when the function is misconfigured.
pub const CONFIG_ERROR: &str = "ConfigError";

/// Non-ready result of a step, as reported to the state machine.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{error_type}: {message}")]
pub struct StepFailure {
    /// Error type the state machine matches on.
    pub error_type: &'static str,
    /// Human readable detail.
    pub message: String,
}

impl StepFailure {
    /// Maps a step result onto the updated event or a typed failure.
    ///
    /// # Errors
    ///
    /// Returns a [`StepFailure`] for pending and failed outcomes and for
    /// every [`StepError`].
    pub fn from_result(
        result: Result<StepOutcome<WorkflowEvent>, StepError>,
    ) -> Result<WorkflowEvent, Self> {
        match result {
            Ok(StepOutcome::Ready(event)) => Ok(event),
            Ok(StepOutcome::Pending(pending)) => Err(Self {
                error_type: RESOURCE_PENDING,
                message: pending.to_string(),
            }),
            Ok(StepOutcome::Failed(failure)) => Err(Self {
                error_type: RESOURCE_FAILED,
                message: failure.to_string(),
            }),
            Err(err) => Err(Self::from(err)),
        }
    }
}

impl From<StepError> for StepFailure {
    fn from(err: StepError) -> Self {
        let error_type = match &err {
            StepError::Api(_) => API_ERROR,
            StepError::PreconditionMissing(_) => PRECONDITION_MISSING,
            StepError::Event(_) | StepError::Naming(_) => INVALID_EVENT,
            StepError::Params(_) => CONFIG_ERROR,
        };
        Self {
            error_type,
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for StepFailure {
    fn from(err: ConfigError) -> Self {
        Self {
            error_type: CONFIG_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StepFailure> for Diagnostic {
    fn from(failure: StepFailure) -> Self {
        Self {
            error_type: failure.error_type.to_owned(),
            error_message: failure.message,
        }
    }
}

/// Serves `step` under the Lambda runtime until the runtime shuts down.
///
/// # Errors
///
/// Returns the runtime's error when the invocation loop cannot continue.
pub async fn run<A, M>(flow: Arc<Flow<A, M>>, step: StepName) -> Result<(), lambda_runtime::Error>
where
    A: ForecastApi + 'static,
    M: MetricsSink + 'static,
{
    info!(step = %step, "serving step under the Lambda runtime");
    lambda_runtime::run(service_fn(move |invocation: LambdaEvent<WorkflowEvent>| {
        let runner = Arc::clone(&flow);
        async move {
            let result = runner.run(step, invocation.payload).await;
            StepFailure::from_result(result)
        }
    }))
    .await
}
