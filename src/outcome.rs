//! Tagged step outcomes and step errors.
//!
//! A step either finishes (`Ready`), needs the orchestrator to call it again
//! later (`Pending`), or observed a terminal resource failure (`Failed`).
//! Everything else that stops a step is a [`StepError`].

use std::fmt;

use thiserror::Error;

use crate::api::ApiError;
use crate::event::EventError;
use crate::params::ParamsError;
use crate::resource::{NamingError, ResourceKind};
use crate::status::{Readiness, ResourceStatus};

/// Resources a step is waiting for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pending {
    /// Kind of the resources.
    pub kind: ResourceKind,
    /// ARNs still transitioning.
    pub arns: Vec<String>,
    /// Human readable description of what is outstanding.
    pub detail: String,
}

impl fmt::Display for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pending: {}", self.kind, self.detail)
    }
}

/// Terminal failure of a resource.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure {
    /// Kind of the failed resource.
    pub kind: ResourceKind,
    /// ARN of the failed resource.
    pub arn: String,
    /// Status that was observed.
    pub status: ResourceStatus,
    /// Status message reported by the service.
    pub message: Option<String>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} is {}", self.kind, self.arn, self.status)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Result of a step that completed without an error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StepOutcome<T> {
    /// The step's resources are ready.
    Ready(T),
    /// The orchestrator should retry the step later.
    Pending(Pending),
    /// A resource reached a terminal failure.
    Failed(Failure),
}

impl<T> StepOutcome<T> {
    /// Readiness summarised by this outcome.
    #[must_use]
    pub const fn readiness(&self) -> Readiness {
        match self {
            Self::Ready(_) => Readiness::Ready,
            Self::Pending(_) => Readiness::Pending,
            Self::Failed(_) => Readiness::Failed,
        }
    }

    /// Returns `true` for [`StepOutcome::Ready`].
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Maps the ready value.
    pub fn map<U>(self, op: impl FnOnce(T) -> U) -> StepOutcome<U> {
        match self {
            Self::Ready(value) => StepOutcome::Ready(op(value)),
            Self::Pending(pending) => StepOutcome::Pending(pending),
            Self::Failed(failure) => StepOutcome::Failed(failure),
        }
    }

    /// Returns the ready value, or `None` when pending or failed.
    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) | Self::Failed(_) => None,
        }
    }
}

/// Errors that stop a step.
#[derive(Debug, Error)]
pub enum StepError {
    /// Raised when an API call fails.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Raised when the event lacks a field recorded by an earlier step.
    #[error(transparent)]
    Event(#[from] EventError),
    /// Raised when a resource the step depends on has never been created.
    #[error("precondition missing: {0}")]
    PreconditionMissing(String),
    /// Raised when the parameter document cannot be used.
    #[error(transparent)]
    Params(#[from] ParamsError),
    /// Raised when a resource name cannot be derived.
    #[error(transparent)]
    Naming(#[from] NamingError),
}
