//! # recurrence-engine
//!
//! Recurrence rules, overnight-aware interval arithmetic and conflict
//! detection for bookable resources.
//!
//! A schedule says *which dates* it is in effect on (its [`FrequencyRule`])
//! and *which times* on those dates (its [`Period`]s, which may run past
//! midnight). The engine answers whether a rule produces a date, what the next
//! produced date is, whether two schedules collide, and which fixed-length
//! slots are bookable on a date.
//!
//! ## Modules
//!
//! - [`frequency`]: frequency kind identifiers (`"weekly"`, `"every_3_months"`)
//! - [`rule`]: the rule variants and their evaluation
//! - [`transport`]: flat key/value encoding of rule configuration
//! - [`interval`]: `HH:MM` intervals with midnight crossing
//! - [`calendar`]: week, month and ordinal-weekday arithmetic
//! - [`schedule`]: schedules, periods and persistence records
//! - [`conflict`]: overlap detection between schedules
//! - [`slots`]: bookable slot generation
//! - [`config`]: engine-wide settings
//! - [`error`]: error types

pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod frequency;
pub mod interval;
pub mod rule;
pub mod schedule;
pub mod slots;
pub mod transport;

pub use config::EngineConfig;
pub use conflict::{check_conflicts, find_all_conflicts, find_conflicts, has_conflict, ScheduleConflict};
pub use error::RecurrenceError;
pub use frequency::{Frequency, PeriodUnit};
pub use interval::TimeOfDay;
pub use rule::{
    EveryXMonths, EveryXWeeks, FrequencyRule, MonthAnchor, MonthlyPattern, Ordinal,
    OrdinalWeekday, WeeklyPattern,
};
pub use schedule::{Period, Schedule, ScheduleId, ScheduleRecord, ScheduleType};
pub use slots::{bookable_slots, next_bookable_slot, Slot};
