//! Pure retention decisions over parsed candidates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::api::ResourceSummary;
use crate::resource::{ResourceKind, WorkflowTimestamp, parse_arn};
use crate::status::ResourceStatus;

/// Rule deciding which generations of a kind are outdated.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RetentionPolicy {
    /// Keep the newest `n` generations, delete the rest.
    KeepLatest(usize),
    /// Delete the children of outdated parents.
    Cascade,
    /// Delete the children of outdated parents, and keep only the newest
    /// `n` generations under each remaining parent.
    KeepLatestPerParent(usize),
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepLatest(count) => write!(f, "keep latest {count}"),
            Self::Cascade => f.write_str("cascade"),
            Self::KeepLatestPerParent(count) => write!(f, "keep latest {count} per parent"),
        }
    }
}

/// A listed resource that belongs to the project being swept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetentionCandidate {
    /// Resource ARN.
    pub arn: String,
    /// Project parsed from the ARN.
    pub project: String,
    /// Generation timestamp parsed from the ARN; absent for datasets.
    pub timestamp: Option<WorkflowTimestamp>,
    /// Lifecycle status, once known.
    pub status: Option<ResourceStatus>,
    /// Parent ARN, from the ARN path or the listing.
    pub parent_arn: Option<String>,
}

impl RetentionCandidate {
    /// Parses a listing entry, returning `None` when its ARN does not follow
    /// the naming convention.
    #[must_use]
    pub fn from_summary(kind: ResourceKind, summary: ResourceSummary) -> Option<Self> {
        let parsed = parse_arn(kind, &summary.arn)?;
        let parent_arn = parsed.parent_arn().or(summary.parent_arn);
        Some(Self {
            arn: summary.arn,
            project: parsed.project,
            timestamp: parsed.timestamp,
            status: summary.status,
            parent_arn,
        })
    }

    /// Returns `true` while a delete request is being processed.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.status.as_ref().is_some_and(ResourceStatus::is_draining)
    }
}

/// Selects every candidate except the newest `keep` generations.
///
/// Candidates that are already draining neither count towards `keep` nor
/// get selected. Ordering is a stable sort on the timestamp alone, so ties
/// keep their listing order.
#[must_use]
pub fn select_outdated(candidates: &[RetentionCandidate], keep: usize) -> Vec<&RetentionCandidate> {
    oldest_beyond(candidates.iter().collect(), keep)
}

/// Applies [`select_outdated`] separately to the children of each parent.
///
/// Candidates without a known parent form one group of their own.
#[must_use]
pub fn select_outdated_per_parent(
    candidates: &[RetentionCandidate],
    keep: usize,
) -> Vec<&RetentionCandidate> {
    let mut by_parent = BTreeMap::<Option<&str>, Vec<&RetentionCandidate>>::new();
    for candidate in candidates {
        by_parent
            .entry(candidate.parent_arn.as_deref())
            .or_default()
            .push(candidate);
    }
    by_parent
        .into_values()
        .flat_map(|siblings| oldest_beyond(siblings, keep))
        .collect()
}

fn oldest_beyond(candidates: Vec<&RetentionCandidate>, keep: usize) -> Vec<&RetentionCandidate> {
    let mut live = candidates
        .into_iter()
        .filter(|candidate| !candidate.is_draining())
        .collect::<Vec<_>>();
    live.sort_by_key(|candidate| candidate.timestamp);
    let outdated = live.len().saturating_sub(keep);
    live.truncate(outdated);
    live
}

/// Selects the candidates whose parent is in `parents`.
#[must_use]
pub fn select_children<'c>(
    candidates: &'c [RetentionCandidate],
    parents: &BTreeSet<String>,
) -> Vec<&'c RetentionCandidate> {
    candidates
        .iter()
        .filter(|candidate| {
            candidate
                .parent_arn
                .as_ref()
                .is_some_and(|parent| parents.contains(parent))
        })
        .collect()
}
