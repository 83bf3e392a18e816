//! Binary entry point for the `forecast-steps` CLI.

use std::io::{self, Read, Write};
use std::process;
use std::sync::Arc;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::Parser;
use thiserror::Error;
use tracing::info;

use forecast_steps::aws::{AwsContext, AwsForecastApi, CloudWatchMetrics, account_id};
use forecast_steps::cli::{Cli, LambdaCommand, RunCommand, StepName};
use forecast_steps::{
    ApiError, ConfigError, Flow, FlowConfig, FlowSettings, StepError, StepOutcome, WorkflowEvent,
    lambda, logging,
};

/// Exit status telling callers to invoke the step again later.
const EXIT_PENDING: i32 = 75;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("AWS error: {0}")]
    Aws(#[from] ApiError),
    #[error("invalid event: {0}")]
    Event(String),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error("lambda runtime stopped: {0}")]
    Lambda(String),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let config = FlowConfig::load_validated()?;
    logging::init(config.log_format()?);
    let flow = build_flow(&config).await?;
    match cli {
        Cli::Run(command) => run_command(&flow, &command).await,
        Cli::Lambda(LambdaCommand { step }) => serve(flow, step).await,
    }
}

async fn build_flow(
    config: &FlowConfig,
) -> Result<Flow<AwsForecastApi, CloudWatchMetrics>, CliError> {
    let settings = FlowSettings::from_config(config)?;
    let aws = AwsContext::load(config.region.as_deref()).await?;
    let account = account_id(&aws.sts_client()).await?;
    info!(region = aws.region(), project = %settings.project_name, "loaded AWS context");
    Ok(Flow::new(
        AwsForecastApi::new(aws.forecast_client()),
        CloudWatchMetrics::new(aws.cloudwatch_client()),
        settings,
        account,
        aws.region(),
    ))
}

async fn run_command(
    flow: &Flow<AwsForecastApi, CloudWatchMetrics>,
    args: &RunCommand,
) -> Result<i32, CliError> {
    let source = match args.event.as_deref() {
        Some(path) => read_event_file(Utf8Path::new(path))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| CliError::Event(format!("failed to read standard input: {err}")))?;
            buffer
        }
    };
    let event = parse_event(&source)?;
    let outcome = flow.run(args.step, event).await?;
    write_outcome(io::stdout(), io::stderr(), &outcome)
}

async fn serve(
    flow: Flow<AwsForecastApi, CloudWatchMetrics>,
    step: StepName,
) -> Result<i32, CliError> {
    lambda::run(Arc::new(flow), step)
        .await
        .map_err(|err| CliError::Lambda(err.to_string()))?;
    Ok(0)
}

fn read_event_file(path: &Utf8Path) -> Result<String, CliError> {
    let read_error = |message: String| CliError::Event(format!("failed to read {path}: {message}"));
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error(String::from("path is missing a file name")))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| read_error(err.to_string()))?;
    dir.read_to_string(file_name)
        .map_err(|err| read_error(err.to_string()))
}

/// Parses an event document; blank input is an empty event.
fn parse_event(source: &str) -> Result<WorkflowEvent, CliError> {
    if source.trim().is_empty() {
        return Ok(WorkflowEvent::default());
    }
    serde_json::from_str(source).map_err(|err| CliError::Event(err.to_string()))
}

fn write_outcome(
    mut out: impl Write,
    mut err: impl Write,
    outcome: &StepOutcome<WorkflowEvent>,
) -> Result<i32, CliError> {
    match outcome {
        StepOutcome::Ready(event) => {
            let rendered = serde_json::to_string_pretty(event)
                .map_err(|source| CliError::Event(source.to_string()))?;
            writeln!(out, "{rendered}")?;
            Ok(0)
        }
        StepOutcome::Pending(pending) => {
            writeln!(err, "{pending}; run the step again later")?;
            Ok(EXIT_PENDING)
        }
        StepOutcome::Failed(failure) => {
            writeln!(err, "{failure}")?;
            Ok(1)
        }
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_steps::outcome::{Failure, Pending};
    use forecast_steps::resource::ResourceKind;
    use forecast_steps::status::ResourceStatus;

    fn written(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).expect("output should be UTF-8")
    }

    #[test]
    fn blank_input_is_an_empty_event() {
        let event = parse_event("  \n").expect("blank input should parse");

        assert_eq!(event, WorkflowEvent::default());
    }

    #[test]
    fn malformed_input_is_an_event_error() {
        let err = parse_event("{ not json").expect_err("malformed input should fail");

        assert!(matches!(err, CliError::Event(_)), "unexpected error: {err}");
    }

    #[test]
    fn ready_outcomes_print_the_event() {
        let event = parse_event(r#"{"ProjectName": "acme"}"#).expect("event should parse");
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = write_outcome(&mut out, &mut err, &StepOutcome::Ready(event))
            .expect("write should succeed");

        assert_eq!(code, 0);
        assert!(written(out).contains(r#""ProjectName": "acme""#));
        assert!(err.is_empty());
    }

    #[test]
    fn pending_outcomes_exit_with_tempfail() {
        let pending = Pending {
            kind: ResourceKind::Forecast,
            arns: vec![String::from("arn:forecast")],
            detail: String::from("arn:forecast is CREATE_IN_PROGRESS"),
        };
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code = write_outcome(&mut out, &mut err, &StepOutcome::Pending(pending))
            .expect("write should succeed");

        assert_eq!(code, EXIT_PENDING);
        assert!(out.is_empty());
        assert!(written(err).contains("run the step again later"));
    }

    #[test]
    fn failed_outcomes_exit_with_one() {
        let failure = Failure {
            kind: ResourceKind::Predictor,
            arn: String::from("arn:predictor"),
            status: ResourceStatus::CreateFailed,
            message: None,
        };
        let mut err = Vec::new();

        let code = write_outcome(Vec::new(), &mut err, &StepOutcome::Failed(failure))
            .expect("write should succeed");

        assert_eq!(code, 1);
        assert!(written(err).contains("CREATE_FAILED"));
    }

    #[test]
    fn errors_are_written_on_one_line() {
        let mut target = Vec::new();

        write_error(&mut target, &CliError::Event(String::from("bad")));

        assert_eq!(written(target), "invalid event: bad\n");
    }
}
