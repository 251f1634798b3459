//! Error types for recurrence-engine operations.

use thiserror::Error;

use crate::schedule::ScheduleId;

/// Errors raised while building, decoding or checking schedules.
///
/// Every error is terminal for the operation that produced it. Nothing here is
/// transient, so callers re-supply corrected input rather than retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    /// A required key is missing from a rule's transport map.
    #[error("missing required key '{key}' in frequency config")]
    Config { key: String },

    /// A key is present but its value has the wrong shape.
    #[error("invalid value for key '{key}' in frequency config: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// A numeric or named parameter is outside its allowed range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A new schedule overlaps an existing schedule that disallows overlaps.
    #[error("schedule conflicts with existing schedule {schedule_id}")]
    Conflict { schedule_id: ScheduleId },

    /// The stored frequency identifier does not name a known rule kind.
    #[error("unsupported frequency: {0}")]
    UnsupportedFrequency(String),

    /// A time-of-day string is not in "HH:MM" form.
    #[error("invalid time of day: {0}")]
    InvalidTime(String),
}

impl RecurrenceError {
    pub(crate) fn missing(key: &str) -> Self {
        RecurrenceError::Config {
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        RecurrenceError::InvalidConfig {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecurrenceError>;
