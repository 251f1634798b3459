//! Recurrence rules: which calendar dates a recurring schedule lands on.
//!
//! [`FrequencyRule`] is a closed set of variants. Every variant answers the same
//! three questions:
//!
//! - [`should_create_instance`](FrequencyRule::should_create_instance): does the
//!   rule on its own produce `date`?
//! - [`should_create_recurring_instance`](FrequencyRule::should_create_recurring_instance):
//!   does it produce `date` for a given schedule, with missing anchors taken
//!   from the schedule's start date?
//! - [`next_occurrence`](FrequencyRule::next_occurrence): the first produced date
//!   strictly after a given one.
//!
//! Weekly rules count whole weeks from an *anchor week*; monthly rules count
//! months from an *anchor month*. An anchor is resolved once, from the
//! schedule's start date, and never changes afterwards.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use tracing::{debug, trace};

use crate::calendar::{
    days_in_month, first_of_month_after, ordinal_weekday_in_month, week_start_of, weeks_between,
};
use crate::error::{RecurrenceError, Result};
use crate::frequency::{Frequency, PeriodUnit};
use crate::schedule::Schedule;

/// Upper bound on months examined by the monthly family's next-occurrence
/// search. Forty-eight years covers every period/leap-day combination.
const MAX_MONTH_SCAN: u32 = 576;

/// Days examined when searching the next even/odd ISO week match. The longest
/// run of weeks with the wrong parity is two (week 52 -> 53 -> 1 -> 2).
const PARITY_SCAN_DAYS: u64 = 28;

// ---------------------------------------------------------------------------
// Weekly patterns
// ---------------------------------------------------------------------------

/// Allowed weekdays plus the anchor week for the weekly family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPattern {
    days: Vec<Weekday>,
    anchor: Option<NaiveDate>,
    week_start: Weekday,
}

impl Default for WeeklyPattern {
    fn default() -> Self {
        WeeklyPattern {
            days: Vec::new(),
            anchor: None,
            week_start: Weekday::Mon,
        }
    }
}

impl WeeklyPattern {
    /// Pattern for the given weekdays. Duplicates are dropped; an empty list
    /// means "any day" for preview checks and "Monday" when a concrete day is
    /// needed.
    pub fn new<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        let mut unique: Vec<Weekday> = Vec::new();
        for day in days {
            if !unique.contains(&day) {
                unique.push(day);
            }
        }
        WeeklyPattern {
            days: unique,
            ..WeeklyPattern::default()
        }
    }

    /// Use `week_start` as the first day of the week. An anchor that is
    /// already set is snapped back to the new week start.
    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self.anchor = self.anchor.map(|a| week_start_of(a, week_start));
        self
    }

    /// Anchor the pattern to the week containing `date`.
    pub fn starting_on(mut self, date: NaiveDate) -> Self {
        self.anchor = Some(week_start_of(date, self.week_start));
        self
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// First day of the anchor week, if resolved.
    pub fn anchor(&self) -> Option<NaiveDate> {
        self.anchor
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    fn effective_days(&self) -> &[Weekday] {
        if self.days.is_empty() {
            &[Weekday::Mon]
        } else {
            &self.days
        }
    }

    fn allows_any(&self, day: Weekday) -> bool {
        self.days.is_empty() || self.days.contains(&day)
    }

    fn resolve_anchor(&mut self, start: NaiveDate) {
        if self.anchor.is_none() {
            let anchor = week_start_of(start, self.week_start);
            debug!(%start, %anchor, "resolved weekly anchor");
            self.anchor = Some(anchor);
        }
    }
}

/// A weekly rule repeating every `weeks` weeks (1-52).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EveryXWeeks {
    weeks: u8,
    pattern: WeeklyPattern,
}

impl EveryXWeeks {
    /// # Errors
    /// Returns `RecurrenceError::Validation` unless `1 <= weeks <= 52`.
    pub fn new(weeks: u32, pattern: WeeklyPattern) -> Result<Self> {
        let weeks = PeriodUnit::Weeks.validate(weeks)?;
        Ok(EveryXWeeks { weeks, pattern })
    }

    pub fn weeks(&self) -> u32 {
        u32::from(self.weeks)
    }

    pub fn pattern(&self) -> &WeeklyPattern {
        &self.pattern
    }
}

/// How the weekly family picks eligible weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeekCadence {
    /// Every `n` weeks counted from the anchor week.
    Every(u32),
    /// ISO weeks whose number has the given remainder mod 2.
    IsoParity(u32),
}

impl WeekCadence {
    fn eligible(self, anchor: Option<NaiveDate>, date: NaiveDate) -> bool {
        match self {
            WeekCadence::Every(n) => match anchor {
                Some(anchor) => weeks_between(anchor, date).rem_euclid(i64::from(n)) == 0,
                None => true,
            },
            WeekCadence::IsoParity(rem) => date.iso_week().week() % 2 == rem,
        }
    }
}

// ---------------------------------------------------------------------------
// Monthly patterns
// ---------------------------------------------------------------------------

/// Reference month from which monthly periods are counted.
///
/// With a year, offsets are exact month counts. Without one, only the month
/// number is known and the offset is `month - anchor + 12`, as stored rules
/// have always been evaluated. That is exact for periods that divide twelve;
/// for other periods the anchor month itself may be out of phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthAnchor {
    month: u32,
    year: Option<i32>,
}

impl MonthAnchor {
    /// # Errors
    /// Returns `RecurrenceError::Validation` unless `1 <= month <= 12`.
    pub fn new(month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(RecurrenceError::Validation(format!(
                "start month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(MonthAnchor { month, year: None })
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Anchor at the month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        MonthAnchor {
            month: date.month(),
            year: Some(date.year()),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    fn offset(&self, date: NaiveDate) -> i64 {
        let months = i64::from(date.month()) - i64::from(self.month);
        match self.year {
            Some(year) => (i64::from(date.year()) - i64::from(year)) * 12 + months,
            None => months + 12,
        }
    }

    fn in_phase(&self, date: NaiveDate, period: u32) -> bool {
        self.offset(date).rem_euclid(i64::from(period)) == 0
    }
}

/// Allowed days of month plus the anchor month for the monthly family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonthlyPattern {
    days_of_month: Option<Vec<u32>>,
    anchor: Option<MonthAnchor>,
}

impl MonthlyPattern {
    /// Pattern for the given days of month (sorted, duplicates dropped).
    /// `None` means "the same day of month as the reference date".
    ///
    /// # Errors
    /// Returns `RecurrenceError::Validation` for a day outside 1-31 or an empty list.
    pub fn new(days_of_month: Option<Vec<u32>>) -> Result<Self> {
        let days_of_month = match days_of_month {
            None => None,
            Some(mut days) => {
                if days.is_empty() {
                    return Err(RecurrenceError::Validation(
                        "days of month must not be empty".to_string(),
                    ));
                }
                if let Some(bad) = days.iter().find(|d| !(1..=31).contains(*d)) {
                    return Err(RecurrenceError::Validation(format!(
                        "day of month must be between 1 and 31, got {}",
                        bad
                    )));
                }
                days.sort_unstable();
                days.dedup();
                Some(days)
            }
        };
        Ok(MonthlyPattern {
            days_of_month,
            anchor: None,
        })
    }

    /// Pattern for a single day of month.
    pub fn on_day(day: u32) -> Result<Self> {
        MonthlyPattern::new(Some(vec![day]))
    }

    pub fn with_anchor(mut self, anchor: MonthAnchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// Anchor the pattern at the month containing `date`.
    pub fn starting_in(self, date: NaiveDate) -> Self {
        self.with_anchor(MonthAnchor::of(date))
    }

    pub fn days_of_month(&self) -> Option<&[u32]> {
        self.days_of_month.as_deref()
    }

    pub fn anchor(&self) -> Option<MonthAnchor> {
        self.anchor
    }

    fn resolve_anchor(&mut self, start: NaiveDate) {
        if self.anchor.is_none() {
            debug!(%start, month = start.month(), "resolved monthly anchor");
            self.anchor = Some(MonthAnchor::of(start));
        }
    }

    fn matches(&self, date: NaiveDate, fallback_day: u32, anchor: Option<MonthAnchor>, period: u32) -> bool {
        let day_ok = match &self.days_of_month {
            Some(days) => days.contains(&date.day()),
            None => date.day() == fallback_day,
        };
        day_ok && anchor.is_none_or(|a| a.in_phase(date, period))
    }

    fn next_after(&self, current: NaiveDate, period: u32) -> Option<NaiveDate> {
        let fallback = [current.day()];
        let days = self.days_of_month().unwrap_or(&fallback);
        let anchor = self.anchor.unwrap_or_else(|| MonthAnchor::of(current));

        if anchor.in_phase(current, period) {
            if let Some(next) = earliest_day_in_month(days, current, current.day()) {
                return Some(next);
            }
        }

        for k in 1..=MAX_MONTH_SCAN {
            let month = first_of_month_after(current, k)?;
            if !anchor.in_phase(month, period) {
                continue;
            }
            if let Some(next) = earliest_day_in_month(days, month, 0) {
                return Some(next);
            }
        }
        None
    }
}

/// Smallest allowed day greater than `after` that exists in `month`'s month.
fn earliest_day_in_month(days: &[u32], month: NaiveDate, after: u32) -> Option<NaiveDate> {
    let len = days_in_month(month.year(), month.month())?;
    days.iter()
        .copied()
        .filter(|d| *d > after && *d <= len)
        .min()
        .and_then(|d| NaiveDate::from_ymd_opt(month.year(), month.month(), d))
}

/// A monthly rule repeating every `months` months (1-12).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EveryXMonths {
    months: u8,
    pattern: MonthlyPattern,
}

impl EveryXMonths {
    /// # Errors
    /// Returns `RecurrenceError::Validation` unless `1 <= months <= 12`.
    pub fn new(months: u32, pattern: MonthlyPattern) -> Result<Self> {
        let months = PeriodUnit::Months.validate(months)?;
        Ok(EveryXMonths { months, pattern })
    }

    pub fn months(&self) -> u32 {
        u32::from(self.months)
    }

    pub fn pattern(&self) -> &MonthlyPattern {
        &self.pattern
    }
}

// ---------------------------------------------------------------------------
// Ordinal weekday
// ---------------------------------------------------------------------------

/// Which occurrence of a weekday within its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Ordinal {
    /// # Errors
    /// Returns `RecurrenceError::Validation` unless `1 <= n <= 5` (5 = last).
    pub fn from_number(n: i64) -> Result<Self> {
        match n {
            1 => Ok(Ordinal::First),
            2 => Ok(Ordinal::Second),
            3 => Ok(Ordinal::Third),
            4 => Ok(Ordinal::Fourth),
            5 => Ok(Ordinal::Last),
            _ => Err(RecurrenceError::Validation(format!(
                "ordinal must be 1-5 (first, second, third, fourth, last), got {}",
                n
            ))),
        }
    }

    /// Parse `"first"` .. `"fourth"` or `"last"`, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let ordinal = match name.trim().to_ascii_lowercase().as_str() {
            "first" => Ordinal::First,
            "second" => Ordinal::Second,
            "third" => Ordinal::Third,
            "fourth" => Ordinal::Fourth,
            "last" => Ordinal::Last,
            _ => return None,
        };
        Some(ordinal)
    }

    pub fn number(self) -> u32 {
        match self {
            Ordinal::First => 1,
            Ordinal::Second => 2,
            Ordinal::Third => 3,
            Ordinal::Fourth => 4,
            Ordinal::Last => 5,
        }
    }
}

/// The Nth (or last) given weekday of every month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalWeekday {
    ordinal: Ordinal,
    weekday: Weekday,
}

impl OrdinalWeekday {
    pub fn new(ordinal: Ordinal, weekday: Weekday) -> Self {
        OrdinalWeekday { ordinal, weekday }
    }

    /// Build from raw numbers: `ordinal` 1-5 (5 = last) and `weekday` 0-6
    /// counted from Sunday.
    ///
    /// # Errors
    /// Returns `RecurrenceError::Validation` when either number is out of range.
    pub fn from_numbers(ordinal: i64, weekday: i64) -> Result<Self> {
        let ordinal = Ordinal::from_number(ordinal)?;
        let weekday = u32::try_from(weekday)
            .ok()
            .and_then(crate::calendar::weekday_from_sunday_index)
            .ok_or_else(|| {
                RecurrenceError::Validation(format!(
                    "day of week must be 0-6 (Sunday-Saturday), got {}",
                    weekday
                ))
            })?;
        Ok(OrdinalWeekday { ordinal, weekday })
    }

    pub fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// The matching date in the given month.
    pub fn in_month(&self, year: i32, month: u32) -> Option<NaiveDate> {
        ordinal_weekday_in_month(year, month, self.ordinal.number(), self.weekday)
    }

    fn matches(&self, date: NaiveDate) -> bool {
        date.weekday() == self.weekday && self.in_month(date.year(), date.month()) == Some(date)
    }
}

// ---------------------------------------------------------------------------
// FrequencyRule
// ---------------------------------------------------------------------------

/// A recurrence rule. One variant per [`Frequency`] kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrequencyRule {
    Daily,
    Weekly(WeeklyPattern),
    BiWeekly(WeeklyPattern),
    WeeklyEven(WeeklyPattern),
    WeeklyOdd(WeeklyPattern),
    EveryXWeeks(EveryXWeeks),
    Monthly(MonthlyPattern),
    BiMonthly(MonthlyPattern),
    Quarterly(MonthlyPattern),
    SemiAnnually(MonthlyPattern),
    Annually(MonthlyPattern),
    EveryXMonths(EveryXMonths),
    MonthlyOrdinalWeekday(OrdinalWeekday),
}

/// Borrowed view of a rule reduced to the data the algorithms need.
enum Shape<'a> {
    Daily,
    Weekly(&'a WeeklyPattern, WeekCadence),
    Monthly(&'a MonthlyPattern, u32),
    Ordinal(&'a OrdinalWeekday),
}

impl FrequencyRule {
    /// A weekly-family rule for `kind`.
    ///
    /// # Errors
    /// Returns `RecurrenceError::UnsupportedFrequency` when `kind` is not weekly,
    /// or `RecurrenceError::Validation` for an out-of-range period.
    pub fn weekly_kind(kind: Frequency, pattern: WeeklyPattern) -> Result<Self> {
        Ok(match kind {
            Frequency::Weekly => FrequencyRule::Weekly(pattern),
            Frequency::BiWeekly => FrequencyRule::BiWeekly(pattern),
            Frequency::WeeklyEven => FrequencyRule::WeeklyEven(pattern),
            Frequency::WeeklyOdd => FrequencyRule::WeeklyOdd(pattern),
            Frequency::EveryXWeeks(n) => {
                FrequencyRule::EveryXWeeks(EveryXWeeks::new(u32::from(n), pattern)?)
            }
            other => {
                return Err(RecurrenceError::UnsupportedFrequency(format!(
                    "{} is not a weekly frequency",
                    other
                )))
            }
        })
    }

    /// A monthly-family rule for `kind`.
    ///
    /// # Errors
    /// Returns `RecurrenceError::UnsupportedFrequency` when `kind` is not a
    /// day-of-month frequency, or `RecurrenceError::Validation` for an
    /// out-of-range period.
    pub fn monthly_kind(kind: Frequency, pattern: MonthlyPattern) -> Result<Self> {
        Ok(match kind {
            Frequency::Monthly => FrequencyRule::Monthly(pattern),
            Frequency::BiMonthly => FrequencyRule::BiMonthly(pattern),
            Frequency::Quarterly => FrequencyRule::Quarterly(pattern),
            Frequency::SemiAnnually => FrequencyRule::SemiAnnually(pattern),
            Frequency::Annually => FrequencyRule::Annually(pattern),
            Frequency::EveryXMonths(n) => {
                FrequencyRule::EveryXMonths(EveryXMonths::new(u32::from(n), pattern)?)
            }
            other => {
                return Err(RecurrenceError::UnsupportedFrequency(format!(
                    "{} is not a day-of-month frequency",
                    other
                )))
            }
        })
    }

    /// "Every `n` weeks", using `weekly`/`biweekly` for 1 and 2.
    pub fn every_weeks(n: u32, pattern: WeeklyPattern) -> Result<Self> {
        FrequencyRule::weekly_kind(Frequency::every(n, PeriodUnit::Weeks)?, pattern)
    }

    /// "Every `n` months", using the named kinds for 1, 2, 3, 6 and 12.
    pub fn every_months(n: u32, pattern: MonthlyPattern) -> Result<Self> {
        FrequencyRule::monthly_kind(Frequency::every(n, PeriodUnit::Months)?, pattern)
    }

    /// The kind identifier of this rule.
    pub fn frequency(&self) -> Frequency {
        match self {
            FrequencyRule::Daily => Frequency::Daily,
            FrequencyRule::Weekly(_) => Frequency::Weekly,
            FrequencyRule::BiWeekly(_) => Frequency::BiWeekly,
            FrequencyRule::WeeklyEven(_) => Frequency::WeeklyEven,
            FrequencyRule::WeeklyOdd(_) => Frequency::WeeklyOdd,
            FrequencyRule::EveryXWeeks(r) => Frequency::EveryXWeeks(r.weeks),
            FrequencyRule::Monthly(_) => Frequency::Monthly,
            FrequencyRule::BiMonthly(_) => Frequency::BiMonthly,
            FrequencyRule::Quarterly(_) => Frequency::Quarterly,
            FrequencyRule::SemiAnnually(_) => Frequency::SemiAnnually,
            FrequencyRule::Annually(_) => Frequency::Annually,
            FrequencyRule::EveryXMonths(r) => Frequency::EveryXMonths(r.months),
            FrequencyRule::MonthlyOrdinalWeekday(_) => Frequency::MonthlyOrdinalWeekday,
        }
    }

    fn shape(&self) -> Shape<'_> {
        match self {
            FrequencyRule::Daily => Shape::Daily,
            FrequencyRule::Weekly(p) => Shape::Weekly(p, WeekCadence::Every(1)),
            FrequencyRule::BiWeekly(p) => Shape::Weekly(p, WeekCadence::Every(2)),
            FrequencyRule::WeeklyEven(p) => Shape::Weekly(p, WeekCadence::IsoParity(0)),
            FrequencyRule::WeeklyOdd(p) => Shape::Weekly(p, WeekCadence::IsoParity(1)),
            FrequencyRule::EveryXWeeks(r) => Shape::Weekly(&r.pattern, WeekCadence::Every(r.weeks())),
            FrequencyRule::Monthly(p) => Shape::Monthly(p, 1),
            FrequencyRule::BiMonthly(p) => Shape::Monthly(p, 2),
            FrequencyRule::Quarterly(p) => Shape::Monthly(p, 3),
            FrequencyRule::SemiAnnually(p) => Shape::Monthly(p, 6),
            FrequencyRule::Annually(p) => Shape::Monthly(p, 12),
            FrequencyRule::EveryXMonths(r) => Shape::Monthly(&r.pattern, r.months()),
            FrequencyRule::MonthlyOrdinalWeekday(o) => Shape::Ordinal(o),
        }
    }

    /// Whether the rule alone produces `date`.
    ///
    /// Weekly rules with no allowed days accept any weekday; an unresolved
    /// anchor skips the period check. Monthly rules with no days of month
    /// accept any day.
    pub fn should_create_instance(&self, date: NaiveDate) -> bool {
        match self.shape() {
            Shape::Daily => true,
            Shape::Weekly(p, cadence) => {
                p.allows_any(date.weekday()) && cadence.eligible(p.anchor, date)
            }
            Shape::Monthly(p, period) => p.matches(date, date.day(), p.anchor, period),
            Shape::Ordinal(o) => o.matches(date),
        }
    }

    /// Whether the rule produces `date` for `schedule`.
    ///
    /// Unresolved anchors come from the schedule's start date, an empty weekday
    /// set means Monday, and ordinal-weekday rules never match before the
    /// schedule starts.
    pub fn should_create_recurring_instance(&self, schedule: &Schedule, date: NaiveDate) -> bool {
        let start = schedule.start_date();
        let produced = match self.shape() {
            Shape::Daily => true,
            Shape::Weekly(p, cadence) => {
                let anchor = p.anchor.unwrap_or_else(|| week_start_of(start, p.week_start));
                p.effective_days().contains(&date.weekday())
                    && cadence.eligible(Some(anchor), date)
            }
            Shape::Monthly(p, period) => {
                let anchor = p.anchor.unwrap_or_else(|| MonthAnchor::of(start));
                p.matches(date, start.day(), Some(anchor), period)
            }
            Shape::Ordinal(o) => date >= start && o.matches(date),
        };
        trace!(schedule = %schedule.id(), %date, produced, "evaluated recurrence");
        produced
    }

    /// The first date strictly after `current` that the rule produces, or
    /// `None` when no such date exists (a monthly rule whose days never occur
    /// in an eligible month, or the end of the representable calendar).
    pub fn next_occurrence(&self, current: NaiveDate) -> Option<NaiveDate> {
        match self.shape() {
            Shape::Daily => current.succ_opt(),
            Shape::Weekly(p, cadence) => {
                let anchor = p.anchor.unwrap_or_else(|| week_start_of(current, p.week_start));
                let window = match cadence {
                    // The next eligible week begins within 7n days and spans a
                    // full week, so 7(n+1) days always reach an allowed day.
                    WeekCadence::Every(n) => 7 * (u64::from(n) + 1),
                    WeekCadence::IsoParity(_) => PARITY_SCAN_DAYS,
                };
                let days = p.effective_days();
                (1..=window)
                    .filter_map(|offset| current.checked_add_days(Days::new(offset)))
                    .find(|d| days.contains(&d.weekday()) && cadence.eligible(Some(anchor), *d))
            }
            Shape::Monthly(p, period) => p.next_after(current, period),
            Shape::Ordinal(o) => {
                let next_month = first_of_month_after(current, 1)?;
                o.in_month(next_month.year(), next_month.month())
            }
        }
    }

    /// Produced dates on or after `from`, in order. An unresolved anchor is
    /// resolved at `from` first.
    pub fn occurrences(&self, from: NaiveDate) -> Occurrences {
        let rule = self.clone().anchored(from);
        let first = rule.first_on_or_after(from);
        Occurrences { rule, next: first }
    }

    fn first_on_or_after(&self, from: NaiveDate) -> Option<NaiveDate> {
        if self.should_create_instance(from) {
            return Some(from);
        }
        if let Shape::Ordinal(o) = self.shape() {
            if let Some(date) = o.in_month(from.year(), from.month()) {
                if date > from {
                    return Some(date);
                }
            }
        }
        self.next_occurrence(from)
    }

    /// Resolve the anchor from a schedule start date. Idempotent: an anchor
    /// that is already set is left alone. Even/odd-week, daily and ordinal
    /// rules carry no anchor.
    pub fn set_start_from_start_date(&mut self, start: NaiveDate) {
        match self {
            FrequencyRule::Weekly(p) | FrequencyRule::BiWeekly(p) => p.resolve_anchor(start),
            FrequencyRule::EveryXWeeks(r) => r.pattern.resolve_anchor(start),
            FrequencyRule::Monthly(p)
            | FrequencyRule::BiMonthly(p)
            | FrequencyRule::Quarterly(p)
            | FrequencyRule::SemiAnnually(p)
            | FrequencyRule::Annually(p) => p.resolve_anchor(start),
            FrequencyRule::EveryXMonths(r) => r.pattern.resolve_anchor(start),
            FrequencyRule::Daily
            | FrequencyRule::WeeklyEven(_)
            | FrequencyRule::WeeklyOdd(_)
            | FrequencyRule::MonthlyOrdinalWeekday(_) => {}
        }
    }

    /// Value-style [`set_start_from_start_date`](Self::set_start_from_start_date).
    pub fn anchored(mut self, start: NaiveDate) -> Self {
        self.set_start_from_start_date(start);
        self
    }

    /// Whether every anchor this rule evaluates against is resolved.
    pub fn is_anchored(&self) -> bool {
        match self.shape() {
            Shape::Weekly(p, WeekCadence::Every(_)) => p.anchor.is_some(),
            Shape::Monthly(p, _) => p.anchor.is_some(),
            Shape::Daily | Shape::Weekly(_, WeekCadence::IsoParity(_)) | Shape::Ordinal(_) => true,
        }
    }

    /// RFC 5545 `RRULE` value equivalent to this rule when paired with a
    /// `DTSTART` inside the anchor week (weekly) or anchor month (monthly).
    pub fn to_rrule(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self.shape() {
            Shape::Daily => parts.push("FREQ=DAILY".to_string()),
            Shape::Weekly(p, WeekCadence::Every(n)) => {
                parts.push("FREQ=WEEKLY".to_string());
                if n > 1 {
                    parts.push(format!("INTERVAL={}", n));
                }
                parts.push(format!("BYDAY={}", rrule_days(p.effective_days())));
                parts.push(format!("WKST={}", rrule_day(p.week_start)));
            }
            Shape::Weekly(p, WeekCadence::IsoParity(rem)) => {
                let weeks: Vec<String> = (1..=53u32)
                    .filter(|w| w % 2 == rem)
                    .map(|w| w.to_string())
                    .collect();
                parts.push("FREQ=YEARLY".to_string());
                parts.push(format!("BYWEEKNO={}", weeks.join(",")));
                parts.push(format!("BYDAY={}", rrule_days(p.effective_days())));
                parts.push("WKST=MO".to_string());
            }
            Shape::Monthly(p, period) => {
                parts.push("FREQ=MONTHLY".to_string());
                if period > 1 {
                    parts.push(format!("INTERVAL={}", period));
                }
                if let Some(days) = p.days_of_month() {
                    let days: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                    parts.push(format!("BYMONTHDAY={}", days.join(",")));
                }
            }
            Shape::Ordinal(o) => {
                let position = match o.ordinal {
                    Ordinal::Last => "-1".to_string(),
                    other => other.number().to_string(),
                };
                parts.push("FREQ=MONTHLY".to_string());
                parts.push(format!("BYDAY={}{}", position, rrule_day(o.weekday)));
            }
        }
        parts.join(";")
    }
}

fn rrule_day(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn rrule_days(days: &[Weekday]) -> String {
    days.iter().map(|d| rrule_day(*d)).collect::<Vec<_>>().join(",")
}

/// Iterator over a rule's produced dates. See [`FrequencyRule::occurrences`].
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: FrequencyRule,
    next: Option<NaiveDate>,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = self.rule.next_occurrence(current);
        Some(current)
    }
}
