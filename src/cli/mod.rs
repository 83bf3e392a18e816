//! Command-line interface definitions for the `forecast-steps` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, ValueEnum};

/// Top-level CLI for the `forecast-steps` binary.
#[derive(Debug, Parser)]
#[command(
    name = "forecast-steps",
    about = "Run the Amazon Forecast workflow steps locally or under the Lambda runtime",
    arg_required_else_help = true
)]
pub enum Cli {
    /// Run one step against an event document and print the updated event.
    #[command(name = "run", about = "Run one step and print the updated event")]
    Run(RunCommand),
    /// Serve one step under the AWS Lambda runtime.
    #[command(name = "lambda", about = "Serve one step under the AWS Lambda runtime")]
    Lambda(LambdaCommand),
}

/// Arguments for the `forecast-steps run` subcommand.
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Step to run.
    #[arg(value_enum)]
    pub step: StepName,
    /// Read the event JSON from this file instead of standard input.
    #[arg(long, value_name = "PATH")]
    pub event: Option<String>,
}

/// Arguments for the `forecast-steps lambda` subcommand.
#[derive(Debug, Parser)]
pub struct LambdaCommand {
    /// Step served by this function.
    #[arg(value_enum, env = "FLOW_STEP")]
    pub step: StepName,
}

/// Operator CLI for the `forecast-sweep` binary.
#[derive(Debug, Parser)]
#[command(
    name = "forecast-sweep",
    about = "Delete every outdated generation of a forecast project"
)]
pub struct SweepCli {
    /// Project whose resources are swept.
    #[arg(long, env = "FLOW_PROJECT_NAME")]
    pub project: String,
    /// Region override; the SDK's region chain applies when unset.
    #[arg(long, env = "FLOW_REGION")]
    pub region: Option<String>,
    /// List what would be deleted without deleting anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Every step of the workflow.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StepName {
    /// Starts a model refresh run.
    InitUpdateModelFlow,
    /// Starts a forecast refresh run against the latest predictor.
    InitUpdateForecastFlow,
    /// Creates the run's datasets.
    CreateDataset,
    /// Creates the run's dataset group.
    CreateDatasetGroup,
    /// Imports the target time series.
    CreateDatasetImportJob,
    /// Trains the run's predictor and publishes its accuracy.
    CreatePredictor,
    /// Generates the run's forecast.
    CreateForecast,
    /// Exports the run's forecast to S3.
    CreateForecastExportJob,
    /// Deletes outdated dataset groups.
    DeleteOutdatedDatasetGroups,
    /// Deletes datasets only used by outdated dataset groups.
    DeleteOutdatedDatasets,
    /// Deletes import jobs older than the newest two of each dataset.
    DeleteOutdatedDatasetImportJobs,
    /// Deletes outdated predictors.
    DeleteOutdatedPredictors,
    /// Deletes outdated forecasts.
    DeleteOutdatedForecasts,
    /// Deletes export jobs of outdated forecasts.
    DeleteOutdatedForecastExportJobs,
}

impl StepName {
    /// Every step, in workflow order.
    pub const ALL: [Self; 14] = [
        Self::InitUpdateModelFlow,
        Self::InitUpdateForecastFlow,
        Self::CreateDataset,
        Self::CreateDatasetGroup,
        Self::CreateDatasetImportJob,
        Self::CreatePredictor,
        Self::CreateForecast,
        Self::CreateForecastExportJob,
        Self::DeleteOutdatedDatasetGroups,
        Self::DeleteOutdatedDatasets,
        Self::DeleteOutdatedDatasetImportJobs,
        Self::DeleteOutdatedPredictors,
        Self::DeleteOutdatedForecasts,
        Self::DeleteOutdatedForecastExportJobs,
    ];

    /// Kebab-case name used on the command line and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitUpdateModelFlow => "init-update-model-flow",
            Self::InitUpdateForecastFlow => "init-update-forecast-flow",
            Self::CreateDataset => "create-dataset",
            Self::CreateDatasetGroup => "create-dataset-group",
            Self::CreateDatasetImportJob => "create-dataset-import-job",
            Self::CreatePredictor => "create-predictor",
            Self::CreateForecast => "create-forecast",
            Self::CreateForecastExportJob => "create-forecast-export-job",
            Self::DeleteOutdatedDatasetGroups => "delete-outdated-dataset-groups",
            Self::DeleteOutdatedDatasets => "delete-outdated-datasets",
            Self::DeleteOutdatedDatasetImportJobs => "delete-outdated-dataset-import-jobs",
            Self::DeleteOutdatedPredictors => "delete-outdated-predictors",
            Self::DeleteOutdatedForecasts => "delete-outdated-forecasts",
            Self::DeleteOutdatedForecastExportJobs => "delete-outdated-forecast-export-jobs",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
