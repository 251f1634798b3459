//! Schedules and their time-of-day periods.
//!
//! A [`Schedule`] is a date range, a type, an optional recurrence rule and a
//! list of [`Period`]s. Schedules arrive from the persistence layer as
//! [`ScheduleRecord`]s; converting a record decodes the stored rule and
//! resolves its anchor once, so the resulting schedule is immutable.

use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{RecurrenceError, Result};
use crate::interval::{self, TimeOfDay};
use crate::rule::FrequencyRule;
use crate::transport::{self, ConfigMap};

/// Opaque schedule identifier assigned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub String);

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScheduleId {
    fn from(value: &str) -> Self {
        ScheduleId(value.to_string())
    }
}

impl From<String> for ScheduleId {
    fn from(value: String) -> Self {
        ScheduleId(value)
    }
}

/// Identifier of the person, room or other resource that owns a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        ResourceId(value)
    }
}

/// What a schedule represents, and whether its instances may overlap others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    /// Time the resource offers for booking.
    Availability,
    /// A booking.
    Appointment,
    /// Time the resource is unavailable.
    Blocked,
    Custom,
}

impl ScheduleType {
    /// Appointments and blocked time must not overlap each other.
    pub fn prevents_overlaps(self) -> bool {
        matches!(self, ScheduleType::Appointment | ScheduleType::Blocked)
    }

    pub fn allows_overlaps(self) -> bool {
        !self.prevents_overlaps()
    }
}

fn default_true() -> bool {
    true
}

/// A time-of-day interval belonging to a schedule.
///
/// For non-recurring schedules `date` is the day the period happens on; for
/// recurring schedules it is stored but every produced date uses the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    /// At or before `start_time` for a period that runs past midnight.
    pub end_time: TimeOfDay,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

impl Period {
    pub fn new(date: NaiveDate, start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Period {
            date,
            start_time,
            end_time,
            is_available: true,
        }
    }

    pub fn is_overnight(&self) -> bool {
        interval::is_overnight(self.start_time, self.end_time)
    }

    pub fn duration_minutes(&self) -> u32 {
        interval::duration_minutes(self.start_time, self.end_time)
    }

    pub fn start_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time.to_naive_time())
    }

    /// End as a datetime; overnight periods end on the following day.
    pub fn end_datetime(&self) -> NaiveDateTime {
        let end_date = if self.is_overnight() {
            self.date.checked_add_days(Days::new(1)).unwrap_or(self.date)
        } else {
            self.date
        };
        end_date.and_time(self.end_time.to_naive_time())
    }

    /// Same date and intersecting times.
    pub fn overlaps_with(&self, other: &Period) -> bool {
        self.date == other.date
            && interval::periods_overlap(
                self.start_time,
                self.end_time,
                other.start_time,
                other.end_time,
            )
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} to {}", self.date, self.start_time, self.end_time)
    }
}

/// A resource's schedule. Recurring iff it has a frequency rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    id: ScheduleId,
    resource: ResourceId,
    schedule_type: ScheduleType,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    frequency: Option<FrequencyRule>,
    periods: Vec<Period>,
    is_active: bool,
}

impl Schedule {
    /// An active, non-recurring, open-ended schedule with no periods.
    pub fn new(
        id: impl Into<ScheduleId>,
        resource: impl Into<ResourceId>,
        schedule_type: ScheduleType,
        start_date: NaiveDate,
    ) -> Self {
        Schedule {
            id: id.into(),
            resource: resource.into(),
            schedule_type,
            start_date,
            end_date: None,
            frequency: None,
            periods: Vec::new(),
            is_active: true,
        }
    }

    /// Set the last date of the schedule.
    ///
    /// # Errors
    /// Returns `RecurrenceError::Validation` when `end_date` precedes the start.
    pub fn ending(mut self, end_date: NaiveDate) -> Result<Self> {
        if end_date < self.start_date {
            return Err(RecurrenceError::Validation(format!(
                "end date {} is before start date {}",
                end_date, self.start_date
            )));
        }
        self.end_date = Some(end_date);
        Ok(self)
    }

    /// Make the schedule recurring. The rule's anchor is resolved from the
    /// schedule's start date here, once.
    pub fn recurring(mut self, rule: FrequencyRule) -> Self {
        self.frequency = Some(rule.anchored(self.start_date));
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.periods.push(period);
        self
    }

    pub fn with_periods<I: IntoIterator<Item = Period>>(mut self, periods: I) -> Self {
        self.periods.extend(periods);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn id(&self) -> &ScheduleId {
        &self.id
    }

    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    pub fn schedule_type(&self) -> ScheduleType {
        self.schedule_type
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn frequency(&self) -> Option<&FrequencyRule> {
        self.frequency.as_ref()
    }

    pub fn is_recurring(&self) -> bool {
        self.frequency.is_some()
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Sum of all period durations, overnight-aware.
    pub fn total_duration_minutes(&self) -> u32 {
        self.periods.iter().map(Period::duration_minutes).sum()
    }

    /// Last date on which the schedule can be in effect, `None` when
    /// unbounded. A non-recurring schedule without an end date covers only
    /// its start date.
    pub fn last_effective_date(&self) -> Option<NaiveDate> {
        match (self.end_date, self.is_recurring()) {
            (Some(end), _) => Some(end),
            (None, false) => Some(self.start_date),
            (None, true) => None,
        }
    }

    /// Whether the two schedules' effective date ranges intersect.
    pub fn overlaps_with(&self, other: &Schedule) -> bool {
        let starts_before_other_ends = other
            .last_effective_date()
            .is_none_or(|end| self.start_date <= end);
        let other_starts_before_end = self
            .last_effective_date()
            .is_none_or(|end| other.start_date <= end);
        starts_before_other_ends && other_starts_before_end
    }

    /// Periods that apply on `date`, assuming the schedule is in effect then:
    /// every period for recurring schedules, the periods dated `date` otherwise.
    pub fn periods_on(&self, date: NaiveDate) -> impl Iterator<Item = &Period> + '_ {
        let recurring = self.is_recurring();
        self.periods
            .iter()
            .filter(move |p| recurring || p.date == date)
    }
}

/// A schedule as supplied (and stored) by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: String,
    pub resource_id: String,
    pub schedule_type: ScheduleType,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_recurring: bool,
    /// Frequency identifier, e.g. `"weekly"` or `"every_3_weeks"`.
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub frequency_config: Option<ConfigMap>,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ScheduleRecord {
    /// Decode the record into a schedule with its rule anchored.
    ///
    /// # Errors
    /// `RecurrenceError::Config` when a recurring record has no frequency,
    /// `RecurrenceError::Validation` when a non-recurring record has one or the
    /// date range is inverted, plus any rule decoding error.
    pub fn into_schedule(self, config: &EngineConfig) -> Result<Schedule> {
        let mut schedule = Schedule::new(
            self.id,
            self.resource_id,
            self.schedule_type,
            self.start_date,
        );
        if let Some(end) = self.end_date {
            schedule = schedule.ending(end)?;
        }

        match (self.is_recurring, self.frequency) {
            (true, Some(identifier)) => {
                let map = self.frequency_config.unwrap_or_default();
                let rule = transport::from_stored_with(&identifier, &map, config)?;
                schedule = schedule.recurring(rule);
            }
            (true, None) => return Err(RecurrenceError::missing("frequency")),
            (false, Some(identifier)) => {
                return Err(RecurrenceError::Validation(format!(
                    "schedule {} has frequency '{}' but is not recurring",
                    schedule.id, identifier
                )))
            }
            (false, None) => {}
        }

        schedule = schedule.with_periods(self.periods);
        if !self.is_active {
            schedule = schedule.inactive();
        }
        Ok(schedule)
    }

    /// Encode a schedule for storage.
    pub fn from_schedule(schedule: &Schedule) -> Self {
        ScheduleRecord {
            id: schedule.id.0.clone(),
            resource_id: schedule.resource.0.clone(),
            schedule_type: schedule.schedule_type,
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            is_recurring: schedule.is_recurring(),
            frequency: schedule.frequency.as_ref().map(|r| r.frequency().to_string()),
            frequency_config: schedule.frequency.as_ref().map(transport::to_config),
            periods: schedule.periods.clone(),
            is_active: schedule.is_active,
        }
    }
}
