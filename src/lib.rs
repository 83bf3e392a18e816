//! Step functions for a generational Amazon Forecast pipeline.
//!
//! Every run of the workflow creates a new generation of datasets, a dataset
//! group, an import job, a predictor, a forecast and an export job, all named
//! `{project}_{timestamp}`. Creation steps are idempotent: they
//! [`reconcile`](reconcile::Reconciler) the resource this run owns and report
//! whether it is ready, still transitioning or failed. Deletion steps
//! [`sweep`](retention::Sweeper) older generations, keeping the latest two.
//!
//! [`steps::Flow`] wires both engines to injected clients; [`lambda`] and the
//! `forecast-steps` binary expose the steps to a state machine.

pub mod api;
pub mod aws;
pub mod cli;
pub mod config;
pub mod context;
pub mod event;
pub mod lambda;
pub mod logging;
pub mod outcome;
pub mod params;
pub mod reconcile;
pub mod resource;
pub mod retention;
pub mod status;
pub mod steps;
pub mod test_support;

pub use api::{ApiError, ForecastApi, MetricDatum, MetricsSink};
pub use config::{ConfigError, FlowConfig};
pub use context::ProjectContext;
pub use event::{EventError, WorkflowEvent};
pub use outcome::{Failure, Pending, StepError, StepOutcome};
pub use params::{ParamsError, WorkflowParams};
pub use reconcile::{Reconciler, ResourceHandle, ResourceSpec};
pub use resource::{ResourceKind, WorkflowTimestamp};
pub use retention::{RetentionPolicy, SweepReport, Sweeper};
pub use status::{Readiness, ResourceStatus, classify};
pub use steps::{Flow, FlowSettings};
