//! Structured logging setup and the per-step tracing wrapper.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tracing::{Instrument, debug, error, info, info_span};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt as subscriber_fmt, prelude::*};

use crate::outcome::{StepError, StepOutcome};

/// Log output format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    /// One JSON object per line, for `CloudWatch` Logs.
    #[default]
    Json,
    /// Human readable lines for local runs.
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        })
    }
}

/// Raised for an unknown log format name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown log format '{0}'")]
pub struct UnknownLogFormat(String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(UnknownLogFormat(other.to_owned())),
        }
    }
}

/// Installs the global subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `info` when it is unset
/// or empty. Logs go to standard error so `run` can print
/// the event on standard output. Calling this more than once keeps the first
/// subscriber.
pub fn init(format: LogFormat) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let filter = env_filter(&directives);
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                subscriber_fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(subscriber_fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    if let Err(err) = installed {
        debug!(error = %err, "keeping the existing subscriber");
    }
}

/// Builds the filter for `directives`, falling back to `info`.
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Runs one step inside a span carrying the step name and trace id.
///
/// Pending outcomes are logged at `info`, failures and errors at `error`.
///
/// # Errors
///
/// Returns whatever error the step returned.
pub async fn traced_step<T, F>(
    step: &str,
    trace_id: &str,
    body: F,
) -> Result<StepOutcome<T>, StepError>
where
    F: Future<Output = Result<StepOutcome<T>, StepError>>,
{
    let span = info_span!("step", step, trace_id);
    async move {
        info!("starting step");
        let result = body.await;
        match &result {
            Ok(StepOutcome::Ready(_)) => info!(outcome = "ready", "finished step"),
            Ok(StepOutcome::Pending(pending)) => {
                info!(outcome = "pending", arns = ?pending.arns, "{pending}");
            }
            Ok(StepOutcome::Failed(failure)) => {
                error!(outcome = "failed", arn = %failure.arn, status = %failure.status, "{failure}");
            }
            Err(err) => error!(error = %err, "step aborted"),
        }
        result
    }
    .instrument(span)
    .await
}
