//! BDD scenarios for retention sweeps.

use rstest_bdd_macros::scenario;

use super::test_helpers::{SweepContext, sweep_context};

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Only the oldest of three dataset groups is deleted"
)]
fn scenario_oldest_group_deleted(sweep_context: SweepContext) {
    let _ = sweep_context;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Two generations are never swept"
)]
fn scenario_two_generations_kept(sweep_context: SweepContext) {
    let _ = sweep_context;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Other projects sharing a prefix are left alone"
)]
fn scenario_other_projects_untouched(sweep_context: SweepContext) {
    let _ = sweep_context;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Export jobs follow their outdated forecast even when active"
)]
fn scenario_export_jobs_cascade(sweep_context: SweepContext) {
    let _ = sweep_context;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Import jobs of a shared dataset keep the newest two generations"
)]
fn scenario_shared_dataset_import_jobs(sweep_context: SweepContext) {
    let _ = sweep_context;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "A dataset shared with retained generations is kept"
)]
fn scenario_shared_dataset_kept(sweep_context: SweepContext) {
    let _ = sweep_context;
}
