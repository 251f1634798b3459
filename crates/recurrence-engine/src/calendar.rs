//! Calendar primitives shared by the rule variants: week starts, week and
//! month distances, ordinal weekdays and weekday names.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

/// Lowercase English weekday names, indexed from Sunday = 0.
const WEEKDAY_NAMES: [(&str, Weekday); 7] = [
    ("sunday", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
];

/// Lowercase English name of a weekday (`"monday"`).
pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_sunday() as usize].0
}

/// Parse an English weekday name, case-insensitively.
pub fn parse_weekday_name(name: &str) -> Option<Weekday> {
    let name = name.trim();
    WEEKDAY_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, day)| *day)
}

/// Weekday from its Sunday-based index (0 = Sunday .. 6 = Saturday).
pub fn weekday_from_sunday_index(index: u32) -> Option<Weekday> {
    WEEKDAY_NAMES.get(index as usize).map(|(_, day)| *day)
}

/// The first day of the week containing `date`, for weeks beginning on `week_start`.
pub fn week_start_of(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back =
        (date.weekday().num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(date)
}

/// Whole weeks from `anchor` to `date`, rounding toward negative infinity so
/// dates before the anchor keep the same cadence (`-1` for the week before).
pub fn weeks_between(anchor: NaiveDate, date: NaiveDate) -> i64 {
    (date - anchor).num_days().div_euclid(7)
}

/// Number of days in the given month, or `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((next - first).num_days() as u32)
}

/// First day of the month `months` after the month containing `date`.
pub fn first_of_month_after(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.with_day(1)?.checked_add_months(Months::new(months))
}

/// The `ordinal`-th occurrence of `weekday` in a month, with `ordinal` 1-4, or
/// the last occurrence when `ordinal` is 5.
///
/// For 1-4 this finds the first matching day and adds whole weeks; the fourth
/// occurrence always falls on or before the 28th. For "last" it walks
/// backward from the final day of the month.
pub fn ordinal_weekday_in_month(
    year: i32,
    month: u32,
    ordinal: u32,
    weekday: Weekday,
) -> Option<NaiveDate> {
    if ordinal == 5 {
        let last_day = days_in_month(year, month)?;
        let mut date = NaiveDate::from_ymd_opt(year, month, last_day)?;
        while date.weekday() != weekday {
            date = date.pred_opt()?;
        }
        return Some(date);
    }

    if !(1..=4).contains(&ordinal) {
        return None;
    }

    let mut date = NaiveDate::from_ymd_opt(year, month, 1)?;
    while date.weekday() != weekday {
        date = date.succ_opt()?;
    }
    date.checked_add_days(Days::new(u64::from(7 * (ordinal - 1))))
}
