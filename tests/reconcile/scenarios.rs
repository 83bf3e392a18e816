//! BDD scenarios for reconciliation.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ReconcileContext, reconcile_context};

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "A missing forecast is created once and awaited until active"
)]
fn scenario_create_then_await(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "An existing forecast is never created again"
)]
fn scenario_existing_resource(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "A failed forecast aborts the run"
)]
fn scenario_failed_resource(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}

#[scenario(
    path = "tests/features/reconcile.feature",
    name = "A concurrent creator wins the race"
)]
fn scenario_lost_race(reconcile_context: ReconcileContext) {
    let _ = reconcile_context;
}
