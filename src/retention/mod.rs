//! Generational retention sweeps.
//!
//! A sweep lists every resource of one kind, keeps those whose ARN parses
//! to the target project, decides which generations are outdated and
//! deletes them one at a time. Forecast deletes are asynchronous, so the
//! sweep re-lists draining resources afterwards and reports a pending
//! outcome until they are gone.

mod policy;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiFuture, ForecastApi};
use crate::outcome::{Pending, StepOutcome};
use crate::resource::{ParentLink, ResourceKind};
use crate::status::ResourceStatus;

pub use policy::{
    RetentionCandidate, RetentionPolicy, select_children, select_outdated,
    select_outdated_per_parent,
};

/// What a sweep did.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SweepReport {
    /// Resources a delete request was accepted for.
    pub deleted: Vec<String>,
    /// Targets that disappeared before the delete request.
    pub already_deleted: Vec<String>,
    /// Project resources still draining after the sweep.
    pub still_deleting: Vec<String>,
    /// Targets whose delete was refused because dependants still exist.
    pub blocked: Vec<String>,
    /// Targets left alone because they are still being created or updated.
    pub skipped: Vec<String>,
}

impl SweepReport {
    /// Returns `true` when nothing is left to wait for.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.still_deleting.is_empty() && self.blocked.is_empty()
    }

    /// Converts the report into a step outcome for `kind`.
    #[must_use]
    pub fn into_outcome(self, kind: ResourceKind) -> StepOutcome<Self> {
        if self.is_settled() {
            return StepOutcome::Ready(self);
        }
        let detail = format!(
            "{} still deleting, {} blocked by dependants",
            self.still_deleting.len(),
            self.blocked.len()
        );
        let arns = self
            .still_deleting
            .iter()
            .chain(&self.blocked)
            .cloned()
            .collect();
        StepOutcome::Pending(Pending { kind, arns, detail })
    }
}

/// Deletes outdated generations of a project's resources.
pub struct Sweeper<'a, A: ForecastApi + ?Sized> {
    api: &'a A,
    project: &'a str,
    policies: BTreeMap<ResourceKind, RetentionPolicy>,
}

impl<'a, A: ForecastApi + ?Sized> Sweeper<'a, A> {
    /// Creates a sweeper using each kind's default policy.
    #[must_use]
    pub const fn new(api: &'a A, project: &'a str) -> Self {
        Self {
            api,
            project,
            policies: BTreeMap::new(),
        }
    }

    /// Overrides the policy used for `kind`.
    #[must_use]
    pub fn with_policy(mut self, kind: ResourceKind, policy: RetentionPolicy) -> Self {
        self.policies.insert(kind, policy);
        self
    }

    /// Policy applied to `kind`.
    #[must_use]
    pub fn policy(&self, kind: ResourceKind) -> RetentionPolicy {
        self.policies
            .get(&kind)
            .copied()
            .unwrap_or(kind.descriptor().default_policy)
    }

    /// Sweeps one kind.
    ///
    /// Deletes are issued sequentially and only for targets in a deletable
    /// status. Resources that are already draining are never deleted again.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when listing, describing or deleting fails for a
    /// reason other than the resource being gone or in use.
    pub async fn sweep(&self, kind: ResourceKind) -> Result<StepOutcome<SweepReport>, ApiError> {
        let targets = self.deletion_targets(kind).await?;
        info!(
            kind = %kind,
            project = self.project,
            policy = %self.policy(kind),
            targets = targets.len(),
            "computed deletion targets"
        );

        let mut report = SweepReport::default();
        for target in targets {
            let status = target.status.as_ref();
            if status.is_some_and(ResourceStatus::is_draining) {
                continue;
            }
            if !status.is_some_and(ResourceStatus::is_deletable) {
                info!(kind = %kind, arn = %target.arn, status = ?status, "skipping resource that is still changing");
                report.skipped.push(target.arn);
                continue;
            }
            match self.api.delete(kind, &target.arn).await {
                Ok(()) => {
                    info!(kind = %kind, arn = %target.arn, "requested deletion of outdated resource");
                    report.deleted.push(target.arn);
                }
                Err(ApiError::NotFound { .. }) => {
                    warn!(kind = %kind, arn = %target.arn, "resource already deleted");
                    report.already_deleted.push(target.arn);
                }
                Err(ApiError::ResourceInUse { .. }) => {
                    info!(kind = %kind, arn = %target.arn, "resource still has dependants");
                    report.blocked.push(target.arn);
                }
                Err(err) => return Err(err),
            }
        }

        report.still_deleting = self
            .draining(kind)
            .await?
            .into_iter()
            .map(|candidate| candidate.arn)
            .collect();
        Ok(report.into_outcome(kind))
    }

    /// Computes the outdated resources of `kind` under its policy.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when a listing or describe call fails.
    pub async fn deletion_targets(
        &self,
        kind: ResourceKind,
    ) -> Result<Vec<RetentionCandidate>, ApiError> {
        let candidates = self.candidates(kind, None).await?;
        match self.policy(kind) {
            RetentionPolicy::KeepLatest(keep) => Ok(select_outdated(&candidates, keep)
                .into_iter()
                .cloned()
                .collect()),
            RetentionPolicy::Cascade => self.cascade_targets(kind, candidates).await,
            RetentionPolicy::KeepLatestPerParent(keep) => {
                let superseded = select_outdated_per_parent(&candidates, keep)
                    .into_iter()
                    .cloned()
                    .collect::<Vec<_>>();
                let mut targets = self.cascade_targets(kind, candidates).await?;
                for candidate in superseded {
                    if !targets.iter().any(|target| target.arn == candidate.arn) {
                        targets.push(candidate);
                    }
                }
                Ok(targets)
            }
        }
    }

    async fn cascade_targets(
        &self,
        kind: ResourceKind,
        candidates: Vec<RetentionCandidate>,
    ) -> Result<Vec<RetentionCandidate>, ApiError> {
        let Some(parent) = kind.parent() else {
            debug!(kind = %kind, "cascade requested for a kind without parent");
            return Ok(Vec::new());
        };
        let parent_candidates = self.candidates(parent, None).await?;
        let parent_targets = self.boxed_targets(parent).await?;
        // Parents already draining still release their children.
        let outdated_parents = parent_targets
            .iter()
            .chain(parent_candidates.iter().filter(|candidate| candidate.is_draining()))
            .map(|candidate| candidate.arn.clone())
            .collect::<BTreeSet<_>>();

        if kind.descriptor().parent_link != ParentLink::Membership {
            return Ok(select_children(&candidates, &outdated_parents)
                .into_iter()
                .cloned()
                .collect());
        }

        let mut released = BTreeSet::new();
        let mut retained = BTreeSet::new();
        for group in &parent_candidates {
            let members = self.members(&group.arn).await?;
            if outdated_parents.contains(&group.arn) {
                released.extend(members);
            } else {
                retained.extend(members);
            }
        }
        Ok(candidates
            .into_iter()
            .filter(|candidate| released.contains(&candidate.arn) && !retained.contains(&candidate.arn))
            .collect())
    }

    fn boxed_targets(&self, kind: ResourceKind) -> ApiFuture<'_, Vec<RetentionCandidate>> {
        Box::pin(self.deletion_targets(kind))
    }

    async fn members(&self, group_arn: &str) -> Result<Vec<String>, ApiError> {
        match self.api.dataset_group_members(group_arn).await {
            Ok(members) => Ok(members),
            Err(ApiError::NotFound { .. }) => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    async fn draining(&self, kind: ResourceKind) -> Result<Vec<RetentionCandidate>, ApiError> {
        let mut found = Vec::new();
        if kind.descriptor().status_filter {
            for status in &ResourceStatus::DRAINING {
                found.extend(self.candidates(kind, Some(status)).await?);
            }
        } else {
            found = self.candidates(kind, None).await?;
        }
        found.retain(RetentionCandidate::is_draining);
        found.dedup_by(|left, right| left.arn == right.arn);
        Ok(found)
    }

    /// Lists `kind`, keeps project resources and fills in missing statuses.
    async fn candidates(
        &self,
        kind: ResourceKind,
        status: Option<&ResourceStatus>,
    ) -> Result<Vec<RetentionCandidate>, ApiError> {
        let listed = self.api.list(kind, status).await?;
        let mut candidates = Vec::new();
        for summary in listed {
            let Some(mut candidate) = RetentionCandidate::from_summary(kind, summary) else {
                continue;
            };
            if candidate.project != self.project {
                continue;
            }
            if candidate.status.is_none() {
                match self.api.describe(kind, &candidate.arn).await {
                    Ok(description) => candidate.status = Some(description.status),
                    Err(ApiError::NotFound { .. }) => continue,
                    Err(err) => return Err(err),
                }
            }
            candidates.push(candidate);
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests;
