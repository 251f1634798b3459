//! Engine-wide settings.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// Settings that shape rule evaluation, conflict checks and slot search.
///
/// Every field has a default, so a partial JSON document is a valid config:
///
/// ```rust
/// use recurrence_engine::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{"buffer_minutes": 15}"#).unwrap();
/// assert_eq!(config.buffer_minutes, 15);
/// assert_eq!(config.week_start, chrono::Weekday::Mon);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Day a week begins on when a weekly anchor is derived from a date.
    pub week_start: Weekday,
    /// Maximum number of days inspected when two schedules' date ranges
    /// overlap without a common end.
    pub conflict_horizon_days: u32,
    /// Minutes of padding around occupied periods, applied by conflict checks
    /// and slot blocking.
    pub buffer_minutes: u32,
    /// How many days ahead `next_bookable_slot` searches.
    pub search_horizon_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            week_start: Weekday::Mon,
            conflict_horizon_days: 366,
            buffer_minutes: 0,
            search_horizon_days: 30,
        }
    }
}

impl EngineConfig {
    /// Reject settings that would make searches meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.conflict_horizon_days == 0 {
            return Err(RecurrenceError::Validation(
                "conflict_horizon_days must be at least 1".to_string(),
            ));
        }
        if self.search_horizon_days == 0 {
            return Err(RecurrenceError::Validation(
                "search_horizon_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn buffer(&self) -> i64 {
        i64::from(self.buffer_minutes)
    }
}
