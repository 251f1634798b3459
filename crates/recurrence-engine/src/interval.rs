//! Time-of-day interval arithmetic with overnight (midnight-crossing) support.
//!
//! An interval is a pair of `HH:MM` times. When the end is not after the start
//! the interval is *overnight*: it runs from the start time to the end time on
//! the following day. All arithmetic is done on minute offsets from midnight,
//! with overnight ends pushed past 1440 so that `end > start` always holds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = 1440;

/// A wall-clock time of day with minute precision.
///
/// Parsed from `"HH:MM"`; a trailing `":SS"` component is accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Midnight, `00:00`.
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Build a time from an hour (0-23) and minute (0-59).
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(RecurrenceError::InvalidTime(format!(
                "{:02}:{:02}",
                hour, minute
            )));
        }
        Ok(TimeOfDay((hour * 60 + minute) as u16))
    }

    /// Build a time from a minute offset, wrapping offsets of a day or more
    /// back into `00:00..=23:59`.
    pub fn from_minutes_wrapping(minutes: u32) -> Self {
        TimeOfDay((minutes % MINUTES_PER_DAY) as u16)
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }

    /// Convert to a `chrono::NaiveTime`.
    pub fn to_naive_time(self) -> chrono::NaiveTime {
        // hour() < 24 and minute() < 60 by construction
        chrono::NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or_default()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RecurrenceError::InvalidTime(s.to_string());

        let mut parts = s.trim().split(':');
        let hour = parts.next().ok_or_else(invalid)?;
        let minute = parts.next().ok_or_else(invalid)?;
        if let Some(seconds) = parts.next() {
            // Seconds are accepted but must still be numeric.
            seconds.parse::<u32>().map_err(|_| invalid())?;
        }
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if parts.next().is_some() || !two_digits(hour) || !two_digits(minute) {
            return Err(invalid());
        }

        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute).map_err(|_| invalid())
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = RecurrenceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Parse an `"HH:MM"` string into minutes since midnight.
pub fn time_to_minutes(time: &str) -> Result<u32> {
    time.parse::<TimeOfDay>().map(TimeOfDay::minutes)
}

/// `true` when the interval crosses midnight, i.e. `end <= start`.
pub fn is_overnight(start: TimeOfDay, end: TimeOfDay) -> bool {
    end <= start
}

/// Length of the interval in minutes. Overnight intervals run into the next
/// day, so `22:00 -> 02:00` is 240 minutes and `09:00 -> 09:00` is a full day.
pub fn duration_minutes(start: TimeOfDay, end: TimeOfDay) -> u32 {
    let (s, e) = unrolled(start, end);
    (e - s) as u32
}

/// Whether two intervals share any minute. Touching endpoints do not overlap.
///
/// Both intervals are unrolled onto a 48-hour line and compared in three
/// positions: as-is, with the first shifted one day later, and with the second
/// shifted one day later. This catches wraparound cases such as
/// `22:00 -> 02:00` against `01:00 -> 01:30`.
pub fn periods_overlap(
    start1: TimeOfDay,
    end1: TimeOfDay,
    start2: TimeOfDay,
    end2: TimeOfDay,
) -> bool {
    overlaps_in_any_position(unrolled(start1, end1), unrolled(start2, end2))
}

/// Like [`periods_overlap`], but the first interval is widened by
/// `buffer_minutes` on both sides before comparing. A buffer of zero or less
/// is the plain check.
pub fn periods_overlap_with_buffer(
    start1: TimeOfDay,
    end1: TimeOfDay,
    start2: TimeOfDay,
    end2: TimeOfDay,
    buffer_minutes: i64,
) -> bool {
    if buffer_minutes <= 0 {
        return periods_overlap(start1, end1, start2, end2);
    }

    let (s1, e1) = unrolled(start1, end1);
    let widened = (s1 - buffer_minutes, e1 + buffer_minutes);
    overlaps_in_any_position(widened, unrolled(start2, end2))
}

/// Whether the `outer` interval covers every minute of the `inner` one. An
/// early-morning `inner` interval can sit inside the next-day tail of an
/// overnight `outer` interval.
pub fn period_contains(
    outer_start: TimeOfDay,
    outer_end: TimeOfDay,
    inner_start: TimeOfDay,
    inner_end: TimeOfDay,
) -> bool {
    let (os, oe) = unrolled(outer_start, outer_end);
    let (is, ie) = unrolled(inner_start, inner_end);
    let day = i64::from(MINUTES_PER_DAY);

    let within = |s: i64, e: i64| os <= s && e <= oe;
    within(is, ie) || within(is + day, ie + day)
}

/// Minute offsets of an interval with the end pushed into the next day when
/// the interval is overnight.
fn unrolled(start: TimeOfDay, end: TimeOfDay) -> (i64, i64) {
    let s = i64::from(start.minutes());
    let mut e = i64::from(end.minutes());
    if is_overnight(start, end) {
        e += i64::from(MINUTES_PER_DAY);
    }
    (s, e)
}

fn overlaps_in_any_position(a: (i64, i64), b: (i64, i64)) -> bool {
    let day = i64::from(MINUTES_PER_DAY);
    let hit = |(s1, e1): (i64, i64), (s2, e2): (i64, i64)| s1 < e2 && e1 > s2;

    let unshifted = hit(a, b);
    let first_shifted = hit((a.0 + day, a.1 + day), b);
    let second_shifted = hit(a, (b.0 + day, b.1 + day));

    unshifted || first_shifted || second_shifted
}
