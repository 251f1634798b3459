//! Partition availability into fixed-length bookable slots.
//!
//! Availability periods in effect on a date are cut into consecutive windows
//! of `slot_minutes`; any remainder at the end of a period is dropped. Each
//! window is marked unavailable when it intersects an appointment or blocked
//! period in effect on the same date. Overnight periods are cut along the
//! unrolled timeline and the window times wrapped back into `00:00..=23:59`.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::config::EngineConfig;
use crate::conflict::is_schedule_active_on;
use crate::error::{RecurrenceError, Result};
use crate::interval::{self, TimeOfDay};
use crate::schedule::{Period, Schedule, ScheduleType};

/// A bookable window within an availability period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub is_available: bool,
}

/// Slots for `date` with default settings.
///
/// # Errors
/// Returns `RecurrenceError::Validation` when `slot_minutes` is zero.
pub fn bookable_slots(schedules: &[Schedule], date: NaiveDate, slot_minutes: u32) -> Result<Vec<Slot>> {
    bookable_slots_with(schedules, date, slot_minutes, &EngineConfig::default())
}

/// Slots for `date`, in generation order: source periods in schedule order,
/// chronological within each period. Occupied periods are widened by
/// `config.buffer_minutes` when blocking slots.
pub fn bookable_slots_with(
    schedules: &[Schedule],
    date: NaiveDate,
    slot_minutes: u32,
    config: &EngineConfig,
) -> Result<Vec<Slot>> {
    if slot_minutes == 0 {
        return Err(RecurrenceError::Validation(
            "slot length must be at least one minute".to_string(),
        ));
    }

    let busy = busy_periods(schedules, date);
    let buffer = config.buffer();
    let mut slots = Vec::new();

    for period in availability_periods(schedules, date) {
        let start = period.start_time.minutes();
        let count = period.duration_minutes() / slot_minutes;

        for i in 0..count {
            let start_time = TimeOfDay::from_minutes_wrapping(start + i * slot_minutes);
            let end_time = TimeOfDay::from_minutes_wrapping(start + (i + 1) * slot_minutes);
            let blocked = busy.iter().any(|b| {
                interval::periods_overlap_with_buffer(
                    b.start_time,
                    b.end_time,
                    start_time,
                    end_time,
                    buffer,
                )
            });
            slots.push(Slot {
                start_time,
                end_time,
                is_available: !blocked,
            });
        }
    }

    debug!(%date, slot_minutes, count = slots.len(), "generated bookable slots");
    Ok(slots)
}

/// Whether `start..end` on `date` lies inside an availability period and is
/// clear of every appointment and blocked period (widened by the buffer).
pub fn is_available_at(
    schedules: &[Schedule],
    date: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
    config: &EngineConfig,
) -> bool {
    let offered = availability_periods(schedules, date)
        .any(|p| interval::period_contains(p.start_time, p.end_time, start, end));
    if !offered {
        return false;
    }

    let buffer = config.buffer();
    !busy_periods(schedules, date).iter().any(|b| {
        interval::periods_overlap_with_buffer(b.start_time, b.end_time, start, end, buffer)
    })
}

/// The first free slot on or after `from`, searching up to
/// `config.search_horizon_days` days.
///
/// # Errors
/// Returns `RecurrenceError::Validation` when `slot_minutes` is zero.
pub fn next_bookable_slot(
    schedules: &[Schedule],
    from: NaiveDate,
    slot_minutes: u32,
    config: &EngineConfig,
) -> Result<Option<(NaiveDate, Slot)>> {
    for offset in 0..u64::from(config.search_horizon_days) {
        let Some(date) = from.checked_add_days(Days::new(offset)) else {
            break;
        };
        let free = bookable_slots_with(schedules, date, slot_minutes, config)?
            .into_iter()
            .find(|slot| slot.is_available);
        if let Some(slot) = free {
            return Ok(Some((date, slot)));
        }
    }
    Ok(None)
}

/// Available periods of availability schedules in effect on `date`.
fn availability_periods(schedules: &[Schedule], date: NaiveDate) -> impl Iterator<Item = &Period> {
    schedules
        .iter()
        .filter(|s| s.schedule_type() == ScheduleType::Availability)
        .filter(move |s| is_schedule_active_on(s, date))
        .flat_map(move |s| s.periods_on(date))
        .filter(|p| p.is_available)
}

/// Periods of appointment and blocked schedules in effect on `date`.
fn busy_periods(schedules: &[Schedule], date: NaiveDate) -> Vec<&Period> {
    schedules
        .iter()
        .filter(|s| s.schedule_type().prevents_overlaps())
        .filter(|s| is_schedule_active_on(s, date))
        .flat_map(|s| s.periods_on(date))
        .collect()
}
