//! BDD step definitions for reconciliation.

use forecast_steps::reconcile::Reconciler;
use forecast_steps::{ResourceKind, ResourceStatus, StepOutcome};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{ReconcileContext, forecast_spec, project_context};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a project \"{project}\" running at \"{stamp}\"")]
fn project_running(reconcile_context: &ReconcileContext, project: String, stamp: String) {
    reconcile_context
        .project
        .replace(Some(project_context(project.trim(), stamp.trim())));
}

#[given("the forecast of this run already has status \"{status}\"")]
fn forecast_exists(reconcile_context: &ReconcileContext, status: String) {
    let project = reconcile_context.project.borrow();
    let Some(context) = project.as_ref() else {
        panic!("test setup requires a project");
    };
    let arn = context.arn(
        ResourceKind::Forecast,
        &context.generation_name(context.project_name()),
        None,
    );
    reconcile_context.api.insert(
        ResourceKind::Forecast,
        &arn,
        ResourceStatus::parse(status.trim()),
    );
}

#[given("another invocation creates forecasts concurrently")]
fn concurrent_creator(reconcile_context: &ReconcileContext) {
    reconcile_context.api.race_creation(ResourceKind::Forecast);
}

#[when("the forecast of this run is reconciled")]
fn reconcile_forecast(reconcile_context: &ReconcileContext) {
    let project = reconcile_context.project.borrow();
    let Some(context) = project.as_ref() else {
        panic!("test setup requires a project");
    };
    let reconciler = Reconciler::new(&reconcile_context.api, context);
    let outcome = reconcile_context
        .runtime
        .block_on(reconciler.reconcile(forecast_spec(context)))
        .unwrap_or_else(|err| panic!("reconcile should succeed: {err}"));
    reconcile_context.outcome.replace(Some(outcome));
}

#[then("the outcome is pending on status \"{status}\"")]
fn outcome_pending(reconcile_context: &ReconcileContext, status: String) -> Result<(), StepError> {
    match reconcile_context.outcome.borrow().as_ref() {
        Some(StepOutcome::Pending(pending)) if pending.detail.ends_with(status.trim()) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected pending on {status}, got {other:?}"
        ))),
    }
}

#[then("the outcome is ready")]
fn outcome_ready(reconcile_context: &ReconcileContext) -> Result<(), StepError> {
    match reconcile_context.outcome.borrow().as_ref() {
        Some(StepOutcome::Ready(handle)) if handle.status == ResourceStatus::Active => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected an active resource, got {other:?}"
        ))),
    }
}

#[then("the outcome is failed on status \"{status}\"")]
fn outcome_failed(reconcile_context: &ReconcileContext, status: String) -> Result<(), StepError> {
    let expected = ResourceStatus::parse(status.trim());
    match reconcile_context.outcome.borrow().as_ref() {
        Some(StepOutcome::Failed(failure)) if failure.status == expected => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected failure on {status}, got {other:?}"
        ))),
    }
}

#[then("exactly {count:u32} create request was sent")]
fn one_create_request(reconcile_context: &ReconcileContext, count: u32) -> Result<(), StepError> {
    assert_creates(reconcile_context, count)
}

#[then("exactly {count:u32} create requests were sent")]
fn create_requests(reconcile_context: &ReconcileContext, count: u32) -> Result<(), StepError> {
    assert_creates(reconcile_context, count)
}

fn assert_creates(reconcile_context: &ReconcileContext, count: u32) -> Result<(), StepError> {
    let created = reconcile_context.api.created();
    if created.len() == count as usize {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} create requests, got {created:?}"
        )))
    }
}
