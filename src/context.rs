//! Per-run project context shared by every step.

use crate::resource::{self, NamingError, ResourceKind, WorkflowTimestamp, arn};

/// Identity of one workflow run.
///
/// Built once by an init step, serialised into the workflow event and
/// rebuilt from it by every later step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectContext {
    project_name: String,
    account_id: String,
    region: String,
    timestamp: WorkflowTimestamp,
    trace_id: String,
}

impl ProjectContext {
    /// Creates a context, validating the project name.
    ///
    /// The trace id defaults to `{project}_{timestamp}` until
    /// [`ProjectContext::with_trace_id`] or
    /// [`ProjectContext::with_state_machine`] replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::InvalidProjectName`] when the project name
    /// cannot prefix resource names.
    pub fn new(
        project_name: impl Into<String>,
        account_id: impl Into<String>,
        region: impl Into<String>,
        timestamp: WorkflowTimestamp,
    ) -> Result<Self, NamingError> {
        let project = project_name.into();
        resource::validate_project_name(&project)?;
        let trace_id = arn::generation_name(&project, timestamp);
        Ok(Self {
            project_name: project,
            account_id: account_id.into().trim().to_owned(),
            region: region.into().trim().to_owned(),
            timestamp,
            trace_id,
        })
    }

    /// Replaces the trace id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = trace_id.into();
        self
    }

    /// Sets the trace id to `{state_machine}_{timestamp}`.
    #[must_use]
    pub fn with_state_machine(self, state_machine: &str) -> Self {
        let trace_id = arn::generation_name(state_machine, self.timestamp);
        self.with_trace_id(trace_id)
    }

    /// Project name used as resource name prefix.
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// AWS account id.
    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// AWS region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Workflow timestamp of this run.
    #[must_use]
    pub const fn timestamp(&self) -> WorkflowTimestamp {
        self.timestamp
    }

    /// Trace id attached to every log line of this run.
    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// ARN prefix for this account and region.
    #[must_use]
    pub fn arn_prefix(&self) -> String {
        arn::arn_prefix(&self.region, &self.account_id)
    }

    /// Name of this run's generation of a resource whose name starts with
    /// `stem`.
    #[must_use]
    pub fn generation_name(&self, stem: &str) -> String {
        arn::generation_name(stem, self.timestamp)
    }

    /// ARN of a resource of `kind` called `name`.
    #[must_use]
    pub fn arn(&self, kind: ResourceKind, name: &str, parent_name: Option<&str>) -> String {
        arn::resource_arn(&self.arn_prefix(), kind, name, parent_name)
    }
}
