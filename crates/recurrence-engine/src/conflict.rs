//! Detect overlapping schedules.
//!
//! Only schedules whose types prevent overlaps (appointments and blocked time)
//! can conflict. Two such schedules conflict when some date is in effect for
//! both and a period of one intersects a period of the other on that date.
//! Adjacent periods (one ends exactly when the other starts) are NOT conflicts.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{RecurrenceError, Result};
use crate::interval;
use crate::schedule::{Period, Schedule, ScheduleId};

/// A detected conflict between two schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleConflict {
    pub schedule_a: ScheduleId,
    pub schedule_b: ScheduleId,
    /// First date on which the two schedules collide.
    pub date: NaiveDate,
}

/// Whether `schedule` is in effect on `date`.
///
/// The schedule must be active and `date` inside its effective range; a
/// recurring schedule must also produce `date` from its rule. A non-recurring
/// schedule with an end date covers every date of its range; one without an
/// end date covers only its start date.
pub fn is_schedule_active_on(schedule: &Schedule, date: NaiveDate) -> bool {
    if !schedule.is_active() || date < schedule.start_date() {
        return false;
    }
    if schedule.last_effective_date().is_some_and(|end| date > end) {
        return false;
    }
    match schedule.frequency() {
        Some(rule) => rule.should_create_recurring_instance(schedule, date),
        None => true,
    }
}

/// Whether two periods fall on the same date and intersect in time.
pub fn periods_overlap(a: &Period, b: &Period) -> bool {
    a.overlaps_with(b)
}

/// Whether the effective date ranges of two schedules intersect.
pub fn schedule_ranges_overlap(a: &Schedule, b: &Schedule) -> bool {
    a.overlaps_with(b)
}

/// Whether two schedules conflict, with default settings.
pub fn has_conflict(a: &Schedule, b: &Schedule) -> bool {
    first_conflict_date(a, b, &EngineConfig::default()).is_some()
}

/// The first date on which `a` and `b` conflict, if any.
///
/// Dates are examined from the later of the two start dates up to the earlier
/// last effective date. When neither schedule has one, at most
/// `config.conflict_horizon_days` days are examined, so a conflict that
/// first occurs past the horizon is not reported.
pub fn first_conflict_date(a: &Schedule, b: &Schedule, config: &EngineConfig) -> Option<NaiveDate> {
    if a.schedule_type().allows_overlaps() || b.schedule_type().allows_overlaps() {
        return None;
    }
    if !a.is_active() || !b.is_active() || !a.overlaps_with(b) {
        return None;
    }

    let from = a.start_date().max(b.start_date());
    let to = match (a.last_effective_date(), b.last_effective_date()) {
        (Some(end_a), Some(end_b)) => end_a.min(end_b),
        (Some(end), None) | (None, Some(end)) => end,
        (None, None) => from
            .checked_add_days(Days::new(u64::from(config.conflict_horizon_days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX),
    };

    let buffer = config.buffer();
    let conflict = from
        .iter_days()
        .take_while(|date| *date <= to)
        .filter(|date| is_schedule_active_on(a, *date) && is_schedule_active_on(b, *date))
        .find(|date| {
            a.periods_on(*date).any(|pa| {
                b.periods_on(*date).any(|pb| {
                    interval::periods_overlap_with_buffer(
                        pa.start_time,
                        pa.end_time,
                        pb.start_time,
                        pb.end_time,
                        buffer,
                    )
                })
            })
        });

    if let Some(date) = conflict {
        debug!(a = %a.id(), b = %b.id(), %date, "schedules conflict");
    }
    conflict
}

/// Existing schedules that `candidate` conflicts with, in input order.
/// A schedule never conflicts with itself (same id).
pub fn find_conflicts<'a>(
    candidate: &Schedule,
    existing: &'a [Schedule],
    config: &EngineConfig,
) -> Vec<&'a Schedule> {
    existing
        .iter()
        .filter(|other| other.id() != candidate.id())
        .filter(|other| first_conflict_date(candidate, other, config).is_some())
        .collect()
}

/// Fail if `candidate` would conflict with any existing schedule.
///
/// # Errors
/// Returns `RecurrenceError::Conflict` naming the first conflicting schedule.
pub fn check_conflicts(candidate: &Schedule, existing: &[Schedule], config: &EngineConfig) -> Result<()> {
    match find_conflicts(candidate, existing, config).first() {
        Some(other) => Err(RecurrenceError::Conflict {
            schedule_id: other.id().clone(),
        }),
        None => Ok(()),
    }
}

/// Every conflicting pair among `schedules`, each pair reported once in
/// input order.
pub fn find_all_conflicts(schedules: &[Schedule], config: &EngineConfig) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();

    for (i, a) in schedules.iter().enumerate() {
        for b in &schedules[i + 1..] {
            if let Some(date) = first_conflict_date(a, b, config) {
                conflicts.push(ScheduleConflict {
                    schedule_a: a.id().clone(),
                    schedule_b: b.id().clone(),
                    date,
                });
            }
        }
    }

    conflicts
}
