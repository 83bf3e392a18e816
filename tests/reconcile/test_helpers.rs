//! Fixtures for reconciliation scenarios.

use std::cell::RefCell;

use forecast_steps::reconcile::{ResourceHandle, ResourceSpec};
use forecast_steps::test_support::{FakeForecastApi, TEST_ACCOUNT, TEST_REGION};
use forecast_steps::{ProjectContext, StepOutcome, WorkflowTimestamp};
use rstest::fixture;
use tokio::runtime::{Builder, Runtime};

#[derive(Debug)]
pub struct ReconcileContext {
    pub api: FakeForecastApi,
    pub runtime: Runtime,
    pub project: RefCell<Option<ProjectContext>>,
    pub outcome: RefCell<Option<StepOutcome<ResourceHandle>>>,
}

#[fixture]
pub fn reconcile_context() -> ReconcileContext {
    ReconcileContext {
        api: FakeForecastApi::new(),
        runtime: Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap_or_else(|err| panic!("test runtime should build: {err}")),
        project: RefCell::new(None),
        outcome: RefCell::new(None),
    }
}

pub fn project_context(project: &str, stamp: &str) -> ProjectContext {
    let timestamp = WorkflowTimestamp::parse(stamp)
        .unwrap_or_else(|err| panic!("timestamp {stamp} should parse: {err}"));
    ProjectContext::new(project, TEST_ACCOUNT, TEST_REGION, timestamp)
        .unwrap_or_else(|err| panic!("project {project} should be valid: {err}"))
}

/// Forecast spec for the run; the predictor ARN only feeds the request.
pub fn forecast_spec(context: &ProjectContext) -> ResourceSpec {
    ResourceSpec::Forecast {
        predictor_arn: format!(
            "{}predictor/{}",
            context.arn_prefix(),
            context.generation_name(context.project_name())
        ),
        forecast_types: vec![String::from("0.5")],
    }
}
