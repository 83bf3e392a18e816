//! BDD step definitions for retention sweeps.

use forecast_steps::{ResourceKind, ResourceStatus, StepOutcome, Sweeper};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{
    SweepContext, dataset_group_arn, export_job_arn, forecast_arn, import_job_arn, stamps,
    target_dataset_arn,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("dataset groups of project \"{project}\" from \"{list}\"")]
fn seed_dataset_groups(sweep_context: &SweepContext, project: String, list: String) {
    for stamp in stamps(&list) {
        sweep_context.api.insert(
            ResourceKind::DatasetGroup,
            &dataset_group_arn(project.trim(), &stamp),
            ResourceStatus::Active,
        );
    }
}

#[given("forecasts of project \"{project}\" from \"{list}\" with one active export job each")]
fn seed_forecasts_with_exports(sweep_context: &SweepContext, project: String, list: String) {
    for stamp in stamps(&list) {
        sweep_context.api.insert(
            ResourceKind::Forecast,
            &forecast_arn(project.trim(), &stamp),
            ResourceStatus::Active,
        );
        sweep_context.api.insert(
            ResourceKind::ForecastExportJob,
            &export_job_arn(project.trim(), &stamp),
            ResourceStatus::Active,
        );
    }
}

#[given(
    "generations of project \"{project}\" from \"{list}\" sharing one dataset with one active import job each"
)]
fn seed_shared_dataset_generations(sweep_context: &SweepContext, project: String, list: String) {
    let name = project.trim();
    let dataset = target_dataset_arn(name);
    sweep_context
        .api
        .insert(ResourceKind::Dataset, &dataset, ResourceStatus::Active);
    for stamp in stamps(&list) {
        let group = dataset_group_arn(name, &stamp);
        sweep_context
            .api
            .insert(ResourceKind::DatasetGroup, &group, ResourceStatus::Active);
        sweep_context.api.set_members(&group, &[&dataset]);
        sweep_context.api.insert(
            ResourceKind::DatasetImportJob,
            &import_job_arn(name, &stamp),
            ResourceStatus::Active,
        );
    }
}

#[when("dataset groups are swept for project \"{project}\"")]
fn sweep_dataset_groups(sweep_context: &SweepContext, project: String) {
    sweep(sweep_context, project.trim(), ResourceKind::DatasetGroup);
}

#[when("forecast export jobs are swept for project \"{project}\"")]
fn sweep_export_jobs(sweep_context: &SweepContext, project: String) {
    sweep(sweep_context, project.trim(), ResourceKind::ForecastExportJob);
}

#[when("dataset import jobs are swept for project \"{project}\"")]
fn sweep_import_jobs(sweep_context: &SweepContext, project: String) {
    sweep(sweep_context, project.trim(), ResourceKind::DatasetImportJob);
}

#[when("datasets are swept for project \"{project}\"")]
fn sweep_datasets(sweep_context: &SweepContext, project: String) {
    sweep(sweep_context, project.trim(), ResourceKind::Dataset);
}

fn sweep(sweep_context: &SweepContext, project: &str, kind: ResourceKind) {
    let sweeper = Sweeper::new(&sweep_context.api, project);
    let outcome = sweep_context.runtime.block_on(sweeper.sweep(kind));
    sweep_context.outcome.replace(Some(outcome));
}

#[then("only the dataset group of project \"{project}\" from \"{stamp}\" is deleted")]
fn only_group_deleted(
    sweep_context: &SweepContext,
    project: String,
    stamp: String,
) -> Result<(), StepError> {
    expect_deleted(
        sweep_context,
        &[dataset_group_arn(project.trim(), stamp.trim())],
    )
}

#[then(
    "only the export job of the forecast of project \"{project}\" from \"{stamp}\" is deleted"
)]
fn only_export_job_deleted(
    sweep_context: &SweepContext,
    project: String,
    stamp: String,
) -> Result<(), StepError> {
    expect_deleted(
        sweep_context,
        &[export_job_arn(project.trim(), stamp.trim())],
    )
}

#[then("only the import job of project \"{project}\" from \"{stamp}\" is deleted")]
fn only_import_job_deleted(
    sweep_context: &SweepContext,
    project: String,
    stamp: String,
) -> Result<(), StepError> {
    expect_deleted(sweep_context, &[import_job_arn(project.trim(), stamp.trim())])
}

#[then("nothing is deleted")]
fn nothing_deleted(sweep_context: &SweepContext) -> Result<(), StepError> {
    expect_deleted(sweep_context, &[])
}

#[then("the sweep is pending")]
fn sweep_pending(sweep_context: &SweepContext) -> Result<(), StepError> {
    match sweep_context.outcome.borrow().as_ref() {
        Some(Ok(StepOutcome::Pending(_))) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a pending sweep, got {other:?}"
        ))),
    }
}

#[then("the sweep is ready")]
fn sweep_ready(sweep_context: &SweepContext) -> Result<(), StepError> {
    match sweep_context.outcome.borrow().as_ref() {
        Some(Ok(StepOutcome::Ready(_))) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a settled sweep, got {other:?}"
        ))),
    }
}

fn expect_deleted(sweep_context: &SweepContext, expected: &[String]) -> Result<(), StepError> {
    if let Some(Err(err)) = sweep_context.outcome.borrow().as_ref() {
        return Err(StepError::Assertion(format!("sweep failed: {err}")));
    }
    let deleted = sweep_context.api.deleted();
    if deleted == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected deletes {expected:?}, got {deleted:?}"
        )))
    }
}
