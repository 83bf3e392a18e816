//! Steps that open a workflow run.

use tracing::{info, warn};

use super::Flow;
use crate::api::{ForecastApi, MetricsSink};
use crate::context::ProjectContext;
use crate::event::WorkflowEvent;
use crate::outcome::{StepError, StepOutcome};
use crate::params::WorkflowParams;
use crate::resource::{ParsedArn, ResourceKind, WorkflowTimestamp, parse_arn};
use crate::status::ResourceStatus;

/// Latest trained predictor of a project.
struct LatestPredictor {
    parsed: ParsedArn,
    arn: String,
    dataset_group_arn: Option<String>,
}

impl<A: ForecastApi, M: MetricsSink> Flow<A, M> {
    /// Opens a model refresh run.
    ///
    /// Stamps the event with the project context for `now` and merges the
    /// parameter document into it. The trace id is
    /// `{StateMachineName}_{timestamp}` when the orchestrator supplied its
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Params`] when the parameter document cannot be
    /// loaded and [`StepError::Naming`] for an unusable project name.
    pub fn init_update_model_flow(
        &self,
        mut event: WorkflowEvent,
        now: WorkflowTimestamp,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = self.start_run(&mut event, now)?;
        info!(
            project = context.project_name(),
            trace_id = context.trace_id(),
            "initialised model update run"
        );
        Ok(StepOutcome::Ready(event))
    }

    /// Opens a forecast refresh run against the latest trained predictor.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::PreconditionMissing`] when the project has no
    /// `ACTIVE` predictor, besides the errors of
    /// [`Flow::init_update_model_flow`].
    pub async fn init_update_forecast_flow(
        &self,
        mut event: WorkflowEvent,
        now: WorkflowTimestamp,
    ) -> Result<StepOutcome<WorkflowEvent>, StepError> {
        let context = self.start_run(&mut event, now)?;
        let Some(latest) = self.latest_active_predictor(context.project_name()).await? else {
            return Err(StepError::PreconditionMissing(format!(
                "no ACTIVE predictor exists for project {}; run the model update flow first",
                context.project_name()
            )));
        };
        info!(
            project = context.project_name(),
            predictor = %latest.arn,
            "forecasting with the latest predictor"
        );
        if latest.dataset_group_arn.is_none() {
            warn!(predictor = %latest.arn, "listing did not report the predictor's dataset group");
        }
        event.predictor_name = Some(latest.parsed.name);
        event.predictor_arn = Some(latest.arn);
        event.dataset_group_arn = latest.dataset_group_arn;
        Ok(StepOutcome::Ready(event))
    }

    fn start_run(
        &self,
        event: &mut WorkflowEvent,
        now: WorkflowTimestamp,
    ) -> Result<ProjectContext, StepError> {
        let base = ProjectContext::new(
            self.settings.project_name.as_str(),
            self.account_id.as_str(),
            self.region.as_str(),
            now,
        )?;
        let context = match event.state_machine_name.as_deref() {
            Some(machine) => base.with_state_machine(machine),
            None => base,
        };
        info!(path = %self.settings.params_path, "loading workflow parameters");
        let params = WorkflowParams::load(&self.settings.params_path)?;
        event.record_context(&context);
        event.record_params(params);
        Ok(context)
    }

    async fn latest_active_predictor(
        &self,
        project: &str,
    ) -> Result<Option<LatestPredictor>, StepError> {
        let listed = self
            .api
            .list(ResourceKind::Predictor, Some(&ResourceStatus::Active))
            .await?;
        let latest = listed
            .into_iter()
            .filter(|summary| {
                summary
                    .status
                    .as_ref()
                    .is_none_or(|status| *status == ResourceStatus::Active)
            })
            .filter_map(|summary| {
                let parsed = parse_arn(ResourceKind::Predictor, &summary.arn)?;
                (parsed.project == project).then_some(LatestPredictor {
                    parsed,
                    arn: summary.arn,
                    dataset_group_arn: summary.parent_arn,
                })
            })
            .max_by_key(|predictor| predictor.parsed.timestamp);
        Ok(latest)
    }
}
