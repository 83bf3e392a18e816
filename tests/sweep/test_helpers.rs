//! Fixtures for sweep scenarios.

use std::cell::RefCell;

use forecast_steps::test_support::{FakeForecastApi, test_arn_prefix};
use forecast_steps::{ApiError, StepOutcome, SweepReport};
use rstest::fixture;
use tokio::runtime::{Builder, Runtime};

#[derive(Debug)]
pub struct SweepContext {
    pub api: FakeForecastApi,
    pub runtime: Runtime,
    pub outcome: RefCell<Option<Result<StepOutcome<SweepReport>, ApiError>>>,
}

#[fixture]
pub fn sweep_context() -> SweepContext {
    SweepContext {
        api: FakeForecastApi::new(),
        runtime: Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap_or_else(|err| panic!("test runtime should build: {err}")),
        outcome: RefCell::new(None),
    }
}

/// Splits a comma separated list of timestamps.
pub fn stamps(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|stamp| !stamp.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn arn(path: &str) -> String {
    format!("{}{path}", test_arn_prefix())
}

pub fn dataset_group_arn(project: &str, stamp: &str) -> String {
    arn(&format!("dataset-group/{project}_{stamp}"))
}

pub fn forecast_arn(project: &str, stamp: &str) -> String {
    arn(&format!("forecast/{project}_{stamp}"))
}

pub fn export_job_arn(project: &str, stamp: &str) -> String {
    arn(&format!(
        "forecast-export-job/{project}_{stamp}/{project}_{stamp}_{stamp}"
    ))
}

pub fn target_dataset_arn(project: &str) -> String {
    arn(&format!("dataset/{project}_TARGET_TIME_SERIES"))
}

pub fn import_job_arn(project: &str, stamp: &str) -> String {
    arn(&format!(
        "dataset-import-job/{project}_TARGET_TIME_SERIES/{project}_TARGET_TIME_SERIES_{stamp}"
    ))
}
