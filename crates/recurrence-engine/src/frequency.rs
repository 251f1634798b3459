//! Frequency kind identifiers.
//!
//! A [`Frequency`] names *which* rule a schedule uses (`"weekly"`,
//! `"every_3_weeks"`, ...) without carrying the rule's configuration. It is the
//! string the persistence layer stores next to the serialized config, and the
//! key used to pick a [`FrequencyRule`](crate::rule::FrequencyRule) variant when
//! a schedule is reconstructed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RecurrenceError, Result};

/// Unit of a numeric "every N ..." period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Weeks,
    Months,
}

impl PeriodUnit {
    /// Largest period accepted for this unit.
    pub fn max(self) -> u32 {
        match self {
            PeriodUnit::Weeks => 52,
            PeriodUnit::Months => 12,
        }
    }

    /// Check that `n` lies in `1..=max()`.
    pub fn validate(self, n: u32) -> Result<u8> {
        if n == 0 || n > self.max() {
            return Err(RecurrenceError::Validation(format!(
                "period must be between 1 and {} {}, got {}",
                self.max(),
                self.as_str(),
                n
            )));
        }
        Ok(n as u8)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeriodUnit::Weeks => "weeks",
            PeriodUnit::Months => "months",
        }
    }
}

/// The kind of a recurrence rule, as stored by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    WeeklyEven,
    WeeklyOdd,
    BiWeekly,
    Monthly,
    BiMonthly,
    Quarterly,
    SemiAnnually,
    Annually,
    EveryXWeeks(u8),
    EveryXMonths(u8),
    MonthlyOrdinalWeekday,
}

/// Periods that have a dedicated named kind. Asking for "every 2 weeks" yields
/// `biweekly`, not `every_2_weeks`.
const WEEKLY_NAMED: [(u32, Frequency); 2] = [(1, Frequency::Weekly), (2, Frequency::BiWeekly)];

const MONTHLY_NAMED: [(u32, Frequency); 5] = [
    (1, Frequency::Monthly),
    (2, Frequency::BiMonthly),
    (3, Frequency::Quarterly),
    (6, Frequency::SemiAnnually),
    (12, Frequency::Annually),
];

impl Frequency {
    /// Resolve "every `n` `unit`" to a kind, preferring the named kinds for the
    /// periods that have one.
    ///
    /// # Errors
    /// Returns `RecurrenceError::Validation` when `n` is outside the unit's range.
    pub fn every(n: u32, unit: PeriodUnit) -> Result<Frequency> {
        let n = unit.validate(n)?;
        let table: &[(u32, Frequency)] = match unit {
            PeriodUnit::Weeks => &WEEKLY_NAMED,
            PeriodUnit::Months => &MONTHLY_NAMED,
        };

        if let Some((_, named)) = table.iter().find(|(period, _)| *period == u32::from(n)) {
            return Ok(*named);
        }

        Ok(match unit {
            PeriodUnit::Weeks => Frequency::EveryXWeeks(n),
            PeriodUnit::Months => Frequency::EveryXMonths(n),
        })
    }

    /// Number of weeks between eligible weeks, for the weekly family.
    pub fn period_weeks(self) -> Option<u32> {
        match self {
            Frequency::Weekly => Some(1),
            Frequency::BiWeekly => Some(2),
            Frequency::EveryXWeeks(n) => Some(u32::from(n)),
            _ => None,
        }
    }

    /// Number of months between eligible months, for the monthly family.
    pub fn period_months(self) -> Option<u32> {
        match self {
            Frequency::Monthly => Some(1),
            Frequency::BiMonthly => Some(2),
            Frequency::Quarterly => Some(3),
            Frequency::SemiAnnually => Some(6),
            Frequency::Annually => Some(12),
            Frequency::EveryXMonths(n) => Some(u32::from(n)),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::WeeklyEven => "weekly_even",
            Frequency::WeeklyOdd => "weekly_odd",
            Frequency::BiWeekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::BiMonthly => "bimonthly",
            Frequency::Quarterly => "quarterly",
            Frequency::SemiAnnually => "semiannually",
            Frequency::Annually => "annually",
            Frequency::MonthlyOrdinalWeekday => "monthly_ordinal_weekday",
            Frequency::EveryXWeeks(n) => return write!(f, "every_{}_weeks", n),
            Frequency::EveryXMonths(n) => return write!(f, "every_{}_months", n),
        };
        f.write_str(name)
    }
}

impl FromStr for Frequency {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        let fixed = match s {
            "daily" => Some(Frequency::Daily),
            "weekly" => Some(Frequency::Weekly),
            "weekly_even" => Some(Frequency::WeeklyEven),
            "weekly_odd" => Some(Frequency::WeeklyOdd),
            "biweekly" => Some(Frequency::BiWeekly),
            "monthly" => Some(Frequency::Monthly),
            "bimonthly" => Some(Frequency::BiMonthly),
            "quarterly" => Some(Frequency::Quarterly),
            "semiannually" => Some(Frequency::SemiAnnually),
            "annually" => Some(Frequency::Annually),
            "monthly_ordinal_weekday" => Some(Frequency::MonthlyOrdinalWeekday),
            _ => None,
        };
        if let Some(kind) = fixed {
            return Ok(kind);
        }

        match parse_every_n(s) {
            Some((n, PeriodUnit::Weeks)) => Ok(Frequency::EveryXWeeks(PeriodUnit::Weeks.validate(n)?)),
            Some((n, PeriodUnit::Months)) => {
                Ok(Frequency::EveryXMonths(PeriodUnit::Months.validate(n)?))
            }
            None => Err(RecurrenceError::UnsupportedFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = RecurrenceError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.to_string()
    }
}

/// Match `every_<digits>_weeks` / `every_<digits>_months`.
fn parse_every_n(s: &str) -> Option<(u32, PeriodUnit)> {
    let rest = s.strip_prefix("every_")?;
    let (digits, unit) = if let Some(d) = rest.strip_suffix("_weeks") {
        (d, PeriodUnit::Weeks)
    } else if let Some(d) = rest.strip_suffix("_months") {
        (d, PeriodUnit::Months)
    } else {
        return None;
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Absurdly long digit runs overflow u32; they are out of range anyway.
    Some((digits.parse().unwrap_or(u32::MAX), unit))
}
