//! Flat key/value encoding of rule configuration.
//!
//! The persistence layer stores a rule as a frequency identifier plus a JSON
//! object. Key names are fixed by that storage format:
//!
//! | family | keys |
//! |---|---|
//! | weekly | `days` (weekday names), `startsOn` (ISO date or null), `frequencyWeeks` for `every_N_weeks` |
//! | monthly | `days_of_month` (ints or null; legacy `day_of_month`), `start_month` (int or null), `frequencyMonths` for `every_N_months` |
//! | ordinal weekday | `ordinal` (1-5 or `"last"`), `day_of_week` (0-6 or name; alias `day`) |
//!
//! Two optional keys are written only when they carry information:
//! `start_year` pins a monthly anchor to a year, and `week_start` records a
//! non-Monday week start for weekly anchors.

use chrono::{NaiveDate, Weekday};
use serde_json::{Map, Value};

use crate::calendar::{parse_weekday_name, weekday_from_sunday_index, weekday_name};
use crate::config::EngineConfig;
use crate::error::{RecurrenceError, Result};
use crate::frequency::Frequency;
use crate::rule::{
    EveryXMonths, EveryXWeeks, FrequencyRule, MonthAnchor, MonthlyPattern, Ordinal,
    OrdinalWeekday, WeeklyPattern,
};

/// Transport map of a rule's configuration.
pub type ConfigMap = Map<String, Value>;

/// Encode a rule's configuration (the kind itself is stored separately, see
/// [`FrequencyRule::frequency`]).
pub fn to_config(rule: &FrequencyRule) -> ConfigMap {
    let mut map = ConfigMap::new();
    match rule {
        FrequencyRule::Daily => {}
        FrequencyRule::Weekly(p)
        | FrequencyRule::BiWeekly(p)
        | FrequencyRule::WeeklyEven(p)
        | FrequencyRule::WeeklyOdd(p) => write_weekly(&mut map, p),
        FrequencyRule::EveryXWeeks(r) => {
            write_weekly(&mut map, r.pattern());
            map.insert("frequencyWeeks".into(), Value::from(r.weeks()));
        }
        FrequencyRule::Monthly(p)
        | FrequencyRule::BiMonthly(p)
        | FrequencyRule::Quarterly(p)
        | FrequencyRule::SemiAnnually(p)
        | FrequencyRule::Annually(p) => write_monthly(&mut map, p),
        FrequencyRule::EveryXMonths(r) => {
            write_monthly(&mut map, r.pattern());
            map.insert("frequencyMonths".into(), Value::from(r.months()));
        }
        FrequencyRule::MonthlyOrdinalWeekday(o) => {
            map.insert("ordinal".into(), Value::from(o.ordinal().number()));
            map.insert(
                "day_of_week".into(),
                Value::from(o.weekday().num_days_from_sunday()),
            );
        }
    }
    map
}

fn write_weekly(map: &mut ConfigMap, pattern: &WeeklyPattern) {
    let days: Vec<Value> = pattern
        .days()
        .iter()
        .map(|d| Value::from(weekday_name(*d)))
        .collect();
    map.insert("days".into(), Value::Array(days));
    map.insert(
        "startsOn".into(),
        pattern
            .anchor()
            .map_or(Value::Null, |a| Value::from(a.to_string())),
    );
    if pattern.week_start() != Weekday::Mon {
        map.insert("week_start".into(), Value::from(weekday_name(pattern.week_start())));
    }
}

fn write_monthly(map: &mut ConfigMap, pattern: &MonthlyPattern) {
    map.insert(
        "days_of_month".into(),
        pattern.days_of_month().map_or(Value::Null, |days| {
            Value::Array(days.iter().map(|d| Value::from(*d)).collect())
        }),
    );
    let anchor = pattern.anchor();
    map.insert(
        "start_month".into(),
        anchor.map_or(Value::Null, |a| Value::from(a.month())),
    );
    if let Some(year) = anchor.and_then(|a| a.year()) {
        map.insert("start_year".into(), Value::from(year));
    }
}

/// Decode a rule of the given kind with default engine settings.
///
/// # Errors
/// `RecurrenceError::Config` names a missing required key;
/// `RecurrenceError::InvalidConfig` a value of the wrong shape;
/// `RecurrenceError::Validation` an out-of-range value.
pub fn from_config(kind: Frequency, map: &ConfigMap) -> Result<FrequencyRule> {
    from_config_with(kind, map, &EngineConfig::default())
}

/// Decode a rule of the given kind; weekly anchors snap to `config.week_start`
/// unless the map records its own `week_start`.
pub fn from_config_with(
    kind: Frequency,
    map: &ConfigMap,
    config: &EngineConfig,
) -> Result<FrequencyRule> {
    match kind {
        Frequency::Daily => Ok(FrequencyRule::Daily),
        Frequency::Weekly | Frequency::BiWeekly | Frequency::WeeklyEven | Frequency::WeeklyOdd => {
            let pattern = read_weekly(map, config, true)?;
            FrequencyRule::weekly_kind(kind, pattern)
        }
        Frequency::EveryXWeeks(_) => {
            let weeks = read_period(map, "frequencyWeeks")?;
            let pattern = read_weekly(map, config, false)?;
            Ok(FrequencyRule::EveryXWeeks(EveryXWeeks::new(weeks, pattern)?))
        }
        Frequency::Monthly
        | Frequency::BiMonthly
        | Frequency::Quarterly
        | Frequency::SemiAnnually
        | Frequency::Annually => FrequencyRule::monthly_kind(kind, read_monthly(map)?),
        Frequency::EveryXMonths(_) => {
            let months = read_period(map, "frequencyMonths")?;
            let pattern = read_monthly(map)?;
            Ok(FrequencyRule::EveryXMonths(EveryXMonths::new(months, pattern)?))
        }
        Frequency::MonthlyOrdinalWeekday => {
            Ok(FrequencyRule::MonthlyOrdinalWeekday(read_ordinal_weekday(map)?))
        }
    }
}

/// Rebuild a rule from a stored frequency identifier and config map. For
/// `every_N_weeks` / `every_N_months` the `N` in the identifier overrides any
/// period recorded in the map.
///
/// # Errors
/// `RecurrenceError::UnsupportedFrequency` for an unknown identifier, plus
/// everything [`from_config`] reports.
pub fn from_stored(identifier: &str, map: &ConfigMap) -> Result<FrequencyRule> {
    from_stored_with(identifier, map, &EngineConfig::default())
}

/// [`from_stored`] with explicit engine settings.
pub fn from_stored_with(
    identifier: &str,
    map: &ConfigMap,
    config: &EngineConfig,
) -> Result<FrequencyRule> {
    let kind: Frequency = identifier.parse()?;
    let mut merged = map.clone();
    match kind {
        Frequency::EveryXWeeks(n) => {
            merged.insert("frequencyWeeks".into(), Value::from(n));
        }
        Frequency::EveryXMonths(n) => {
            merged.insert("frequencyMonths".into(), Value::from(n));
        }
        _ => {}
    }
    from_config_with(kind, &merged, config)
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

fn present<'a>(map: &'a ConfigMap, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn read_weekly(map: &ConfigMap, config: &EngineConfig, days_required: bool) -> Result<WeeklyPattern> {
    let days = match map.get("days") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|value| read_weekday("days", value))
            .collect::<Result<Vec<_>>>()?,
        Some(Value::Null) | None if !days_required => Vec::new(),
        Some(Value::Null) | None => return Err(RecurrenceError::missing("days")),
        Some(_) => return Err(RecurrenceError::invalid("days", "expected an array of weekday names")),
    };

    let week_start = match present(map, "week_start") {
        Some(value) => read_weekday("week_start", value)?,
        None => config.week_start,
    };

    let mut pattern = WeeklyPattern::new(days).with_week_start(week_start);
    if let Some(value) = present(map, "startsOn") {
        pattern = pattern.starting_on(read_date("startsOn", value)?);
    }
    Ok(pattern)
}

fn read_monthly(map: &ConfigMap) -> Result<MonthlyPattern> {
    let days = match present(map, "days_of_month") {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|v| read_u32("days_of_month", v))
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(_) => {
            return Err(RecurrenceError::invalid(
                "days_of_month",
                "expected an array of integers",
            ))
        }
        // Legacy single-day key, only consulted when the list form is absent.
        None if !map.contains_key("days_of_month") => match present(map, "day_of_month") {
            Some(value) => Some(vec![read_u32("day_of_month", value)?]),
            None => None,
        },
        None => None,
    };

    let mut pattern = MonthlyPattern::new(days)?;
    if let Some(value) = present(map, "start_month") {
        let mut anchor = MonthAnchor::new(read_u32("start_month", value)?)?;
        if let Some(year) = present(map, "start_year") {
            let year = read_int("start_year", year)?;
            let year = i32::try_from(year)
                .map_err(|_| RecurrenceError::invalid("start_year", "year out of range"))?;
            anchor = anchor.with_year(year);
        }
        pattern = pattern.with_anchor(anchor);
    }
    Ok(pattern)
}

fn read_ordinal_weekday(map: &ConfigMap) -> Result<OrdinalWeekday> {
    let ordinal = match present(map, "ordinal") {
        None => return Err(RecurrenceError::missing("ordinal")),
        Some(Value::String(s)) => match Ordinal::from_name(s) {
            Some(ordinal) => ordinal,
            None => Ordinal::from_number(read_int("ordinal", &Value::String(s.clone()))?)?,
        },
        Some(value) => Ordinal::from_number(read_int("ordinal", value)?)?,
    };

    let weekday = match present(map, "day_of_week") {
        Some(value) => read_weekday("day_of_week", value)?,
        None => match present(map, "day") {
            Some(value) => read_weekday("day", value)?,
            None => return Err(RecurrenceError::missing("day_of_week")),
        },
    };

    Ok(OrdinalWeekday::new(ordinal, weekday))
}

fn read_period(map: &ConfigMap, key: &str) -> Result<u32> {
    let value = present(map, key).ok_or_else(|| RecurrenceError::missing(key))?;
    let n = read_int(key, value)?;
    u32::try_from(n).map_err(|_| {
        RecurrenceError::Validation(format!("{} must be positive, got {}", key, n))
    })
}

/// A weekday given as a name (`"monday"`) or a Sunday-based index (`1`).
fn read_weekday(key: &str, value: &Value) -> Result<Weekday> {
    match value {
        Value::String(name) => parse_weekday_name(name).ok_or_else(|| {
            RecurrenceError::Validation(format!("unknown weekday name '{}'", name))
        }),
        Value::Number(_) => {
            let index = read_int(key, value)?;
            u32::try_from(index)
                .ok()
                .and_then(weekday_from_sunday_index)
                .ok_or_else(|| {
                    RecurrenceError::Validation(format!(
                        "day of week must be 0-6 (Sunday-Saturday), got {}",
                        index
                    ))
                })
        }
        _ => Err(RecurrenceError::invalid(key, "expected a weekday name or index")),
    }
}

fn read_int(key: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| RecurrenceError::invalid(key, "expected an integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| RecurrenceError::invalid(key, format!("'{}' is not an integer", s))),
        _ => Err(RecurrenceError::invalid(key, "expected an integer")),
    }
}

fn read_u32(key: &str, value: &Value) -> Result<u32> {
    let n = read_int(key, value)?;
    u32::try_from(n).map_err(|_| RecurrenceError::Validation(format!("{} out of range: {}", key, n)))
}

/// An ISO date, or a longer ISO timestamp whose first ten characters are a date.
fn read_date(key: &str, value: &Value) -> Result<NaiveDate> {
    let Value::String(s) = value else {
        return Err(RecurrenceError::invalid(key, "expected an ISO date string"));
    };
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map_err(|_| RecurrenceError::invalid(key, format!("'{}' is not an ISO date", s)))
}
