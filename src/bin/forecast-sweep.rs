//! Operator sweep for a forecast project.
//!
//! Deletes every outdated generation of the project, children before
//! parents, and prints one summary line per resource kind. Deletions are
//! asynchronous, so a kind reported as pending needs another run once the
//! service has finished draining it.

use std::io::Write as _;

use clap::Parser;
use forecast_steps::aws::{AwsContext, AwsForecastApi};
use forecast_steps::cli::SweepCli;
use forecast_steps::logging::{self, LogFormat};
use forecast_steps::resource::validate_project_name;
use forecast_steps::{ResourceKind, StepOutcome, Sweeper};

/// Kinds in the order they can be deleted.
const SWEEP_ORDER: [ResourceKind; 6] = [
    ResourceKind::ForecastExportJob,
    ResourceKind::Forecast,
    ResourceKind::Predictor,
    ResourceKind::DatasetImportJob,
    ResourceKind::Dataset,
    ResourceKind::DatasetGroup,
];

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = SweepCli::parse();
    logging::init(LogFormat::Pretty);
    validate_project_name(&cli.project).map_err(|err| err.to_string())?;
    let aws = AwsContext::load(cli.region.as_deref())
        .await
        .map_err(|err| err.to_string())?;
    let api = AwsForecastApi::new(aws.forecast_client());
    let sweeper = Sweeper::new(&api, &cli.project);
    let mut stdout = std::io::stdout();

    let mut pending = 0_usize;
    for kind in SWEEP_ORDER {
        if cli.dry_run {
            let targets = sweeper
                .deletion_targets(kind)
                .await
                .map_err(|err| err.to_string())?;
            for target in &targets {
                writeln!(stdout, "would delete {kind}: {}", target.arn)
                    .map_err(|err| err.to_string())?;
            }
            continue;
        }
        let outcome = sweeper.sweep(kind).await.map_err(|err| err.to_string())?;
        let written = match outcome {
            StepOutcome::Ready(report) => writeln!(
                stdout,
                "{kind}: deleted={}, already_deleted={}, skipped={}",
                report.deleted.len(),
                report.already_deleted.len(),
                report.skipped.len()
            ),
            StepOutcome::Pending(waiting) => {
                pending += 1;
                writeln!(stdout, "{waiting}")
            }
            StepOutcome::Failed(failure) => writeln!(stdout, "{failure}"),
        };
        written.map_err(|err| err.to_string())?;
    }

    if pending > 0 {
        writeln!(
            stdout,
            "sweep incomplete: {pending} kinds still deleting; run again once they finish"
        )
        .map_err(|err| err.to_string())?;
    }
    Ok(())
}
