//! Lifecycle status taxonomy shared by reconciliation and retention sweeps.
//!
//! Every Forecast resource reports one of a small set of status strings. The
//! [`classify`] function is the single decision point that maps a status onto
//! [`Readiness`]: creation steps consult it after describing a resource and
//! sweeps consult it both before deleting (to skip resources that are still
//! changing) and afterwards (to detect resources that are still draining).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status reported by the Forecast API.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ResourceStatus {
    /// `CREATE_PENDING`
    CreatePending,
    /// `CREATE_IN_PROGRESS`
    CreateInProgress,
    /// `ACTIVE`
    Active,
    /// `CREATE_FAILED`
    CreateFailed,
    /// `UPDATE_PENDING`
    UpdatePending,
    /// `UPDATE_IN_PROGRESS`
    UpdateInProgress,
    /// `UPDATE_FAILED`
    UpdateFailed,
    /// `DELETE_PENDING`
    DeletePending,
    /// `DELETE_IN_PROGRESS`
    DeleteInProgress,
    /// `DELETE_FAILED`
    DeleteFailed,
    /// Any status string outside the documented set.
    Other(String),
}

/// Readiness derived from a [`ResourceStatus`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Readiness {
    /// The resource is `ACTIVE`.
    Ready,
    /// The resource is transitioning; the caller should retry later.
    Pending,
    /// The resource reached a terminal failure or an unknown status.
    Failed,
}

impl ResourceStatus {
    /// Every documented status, in the order the API documents them.
    pub const KNOWN: [Self; 10] = [
        Self::CreatePending,
        Self::CreateInProgress,
        Self::Active,
        Self::CreateFailed,
        Self::UpdatePending,
        Self::UpdateInProgress,
        Self::UpdateFailed,
        Self::DeletePending,
        Self::DeleteInProgress,
        Self::DeleteFailed,
    ];

    /// Statuses reported while a delete request is being processed.
    pub const DRAINING: [Self; 2] = [Self::DeletePending, Self::DeleteInProgress];

    /// Parses a status string. Unknown strings are preserved as
    /// [`ResourceStatus::Other`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "CREATE_PENDING" => Self::CreatePending,
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "ACTIVE" => Self::Active,
            "CREATE_FAILED" => Self::CreateFailed,
            "UPDATE_PENDING" => Self::UpdatePending,
            "UPDATE_IN_PROGRESS" => Self::UpdateInProgress,
            "UPDATE_FAILED" => Self::UpdateFailed,
            "DELETE_PENDING" => Self::DeletePending,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            "DELETE_FAILED" => Self::DeleteFailed,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CreatePending => "CREATE_PENDING",
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::Active => "ACTIVE",
            Self::CreateFailed => "CREATE_FAILED",
            Self::UpdatePending => "UPDATE_PENDING",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::DeletePending => "DELETE_PENDING",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Classifies this status. See [`classify`].
    #[must_use]
    pub const fn readiness(&self) -> Readiness {
        match self {
            Self::Active => Readiness::Ready,
            Self::CreatePending
            | Self::CreateInProgress
            | Self::UpdatePending
            | Self::UpdateInProgress
            | Self::DeletePending
            | Self::DeleteInProgress => Readiness::Pending,
            Self::CreateFailed
            | Self::UpdateFailed
            | Self::DeleteFailed
            | Self::Other(_) => Readiness::Failed,
        }
    }

    /// Returns `true` while a delete request is being processed.
    #[must_use]
    pub const fn is_draining(&self) -> bool {
        matches!(self, Self::DeletePending | Self::DeleteInProgress)
    }

    /// Returns `true` when the API accepts a delete request for a resource in
    /// this status: `ACTIVE` or any `*_FAILED` status.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        matches!(
            self,
            Self::Active | Self::CreateFailed | Self::UpdateFailed | Self::DeleteFailed
        )
    }
}

/// Maps a raw status string onto [`Readiness`].
///
/// `ACTIVE` is ready, the six pending and in-progress statuses are pending,
/// and everything else (including unknown strings) is failed.
#[must_use]
pub fn classify(status: &str) -> Readiness {
    ResourceStatus::parse(status).readiness()
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceStatus {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(value))
    }
}

impl Serialize for ResourceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
