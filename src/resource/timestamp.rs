//! Workflow timestamp embedded in generational resource names.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::NamingError;

/// `strftime` pattern used for workflow timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";

const TIMESTAMP_LEN: usize = 19;

/// UTC wall-clock instant in `YYYY_MM_DD_HH_MM_SS` form.
///
/// Ordering follows chronological order, which also matches the lexical
/// order of the formatted string.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct WorkflowTimestamp(NaiveDateTime);

impl WorkflowTimestamp {
    /// Captures the current UTC time truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now().naive_utc())
    }

    /// Wraps an existing instant, dropping sub-second precision.
    #[must_use]
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }

    /// Parses the strict `YYYY_MM_DD_HH_MM_SS` form.
    ///
    /// Every component must be zero-padded, so `2024_1_05_00_00_00` is
    /// rejected even though it names a valid instant.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::InvalidTimestamp`] when the value has the wrong
    /// shape or names an impossible date.
    pub fn parse(value: &str) -> Result<Self, NamingError> {
        let invalid = || NamingError::InvalidTimestamp {
            value: value.to_owned(),
        };
        if !has_timestamp_shape(value) {
            return Err(invalid());
        }
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
            .map(Self)
            .map_err(|_| invalid())
    }

    /// Returns the wrapped instant.
    #[must_use]
    pub const fn as_datetime(&self) -> NaiveDateTime {
        self.0
    }
}

fn has_timestamp_shape(value: &str) -> bool {
    value.len() == TIMESTAMP_LEN
        && value.bytes().enumerate().all(|(index, byte)| match index {
            4 | 7 | 10 | 13 | 16 => byte == b'_',
            _ => byte.is_ascii_digit(),
        })
}

impl fmt::Display for WorkflowTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for WorkflowTimestamp {
    type Err = NamingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for WorkflowTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkflowTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
