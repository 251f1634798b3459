//! Tests for recurrence rule evaluation: membership, next occurrence and
//! anchoring for every rule family.

use chrono::{NaiveDate, Weekday};
use recurrence_engine::{
    EveryXMonths, EveryXWeeks, Frequency, FrequencyRule, MonthAnchor, MonthlyPattern, Ordinal,
    OrdinalWeekday, RecurrenceError, Schedule, ScheduleType, WeeklyPattern,
};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn next(rule: &FrequencyRule, from: &str) -> String {
    rule.next_occurrence(d(from))
        .map(|date| date.to_string())
        .unwrap_or_default()
}

fn monthly(days: &[u32]) -> MonthlyPattern {
    MonthlyPattern::new(Some(days.to_vec())).unwrap()
}

fn schedule_from(start: &str, rule: FrequencyRule) -> Schedule {
    Schedule::new("s-1", "room-1", ScheduleType::Availability, d(start)).recurring(rule)
}

// ---------------------------------------------------------------------------
// Daily and weekly
// ---------------------------------------------------------------------------

#[test]
fn daily_advances_one_day() {
    assert_eq!(next(&FrequencyRule::Daily, "2025-01-01"), "2025-01-02");
    assert_eq!(next(&FrequencyRule::Daily, "2024-12-31"), "2025-01-01");
}

#[test]
fn weekly_advances_across_allowed_days() {
    let rule = FrequencyRule::Weekly(WeeklyPattern::new([Weekday::Mon, Weekday::Thu]));

    // Wednesday -> Thursday of the same week
    assert_eq!(next(&rule, "2025-01-01"), "2025-01-02");
    // Thursday -> Monday of the following week
    assert_eq!(next(&rule, "2025-01-02"), "2025-01-06");
}

#[test]
fn weekly_membership_checks_weekday() {
    let rule = FrequencyRule::Weekly(WeeklyPattern::new([Weekday::Mon, Weekday::Thu]));
    assert!(rule.should_create_instance(d("2025-01-06")));
    assert!(!rule.should_create_instance(d("2025-01-07")));
}

#[test]
fn biweekly_respects_anchor_week_and_allowed_days() {
    let rule = FrequencyRule::BiWeekly(WeeklyPattern::new([Weekday::Mon, Weekday::Wed]))
        .anchored(d("2025-01-06"));

    assert_eq!(next(&rule, "2025-01-06"), "2025-01-08");
    assert_eq!(next(&rule, "2025-01-08"), "2025-01-20");
    assert!(!rule.should_create_instance(d("2025-01-13")));
    assert!(rule.should_create_instance(d("2025-01-20")));
}

#[test]
fn biweekly_keeps_cadence_before_anchor() {
    let rule = FrequencyRule::BiWeekly(WeeklyPattern::new([Weekday::Mon]))
        .anchored(d("2025-01-06"));
    assert!(rule.should_create_instance(d("2024-12-23")));
    assert!(!rule.should_create_instance(d("2024-12-30")));
}

#[test]
fn every_three_weeks_from_schedule_start() {
    let pattern = WeeklyPattern::new([Weekday::Mon]);
    let rule = FrequencyRule::every_weeks(3, pattern).unwrap();
    let schedule = schedule_from("2025-01-06", rule);
    let rule = schedule.frequency().unwrap();

    assert!(rule.should_create_recurring_instance(&schedule, d("2025-01-06")));
    assert!(!rule.should_create_recurring_instance(&schedule, d("2025-01-13")));
    assert!(!rule.should_create_recurring_instance(&schedule, d("2025-01-20")));
    assert!(rule.should_create_recurring_instance(&schedule, d("2025-01-27")));

    assert_eq!(next(rule, "2025-01-06"), "2025-01-27");
}

#[test]
fn every_four_weeks_with_explicit_start() {
    let pattern = WeeklyPattern::new([Weekday::Fri]).starting_on(d("2025-01-06"));
    let rule = FrequencyRule::EveryXWeeks(EveryXWeeks::new(4, pattern).unwrap());

    assert!(rule.should_create_instance(d("2025-01-10")));
    assert!(!rule.should_create_instance(d("2025-01-17")));
    assert!(rule.should_create_instance(d("2025-02-07")));
    assert_eq!(next(&rule, "2025-01-10"), "2025-02-07");
}

#[test]
fn recurring_instance_without_days_means_monday() {
    let rule = FrequencyRule::Weekly(WeeklyPattern::default());
    let schedule = schedule_from("2025-01-01", rule);
    let rule = schedule.frequency().unwrap();

    assert!(rule.should_create_recurring_instance(&schedule, d("2025-01-06")));
    assert!(!rule.should_create_recurring_instance(&schedule, d("2025-01-07")));
}

#[test]
fn preview_without_days_accepts_any_weekday() {
    let rule = FrequencyRule::Weekly(WeeklyPattern::default());
    assert!(rule.should_create_instance(d("2025-01-07")));
    assert!(rule.should_create_instance(d("2025-01-11")));
}

#[test]
fn week_start_moves_the_anchor_week() {
    let days = [Weekday::Sun, Weekday::Mon];
    let start = d("2025-01-05"); // Sunday

    let monday_weeks = FrequencyRule::BiWeekly(WeeklyPattern::new(days)).anchored(start);
    assert!(monday_weeks.should_create_instance(d("2025-01-05")));
    assert!(!monday_weeks.should_create_instance(d("2025-01-06")));

    let sunday_weeks = FrequencyRule::BiWeekly(
        WeeklyPattern::new(days).with_week_start(Weekday::Sun),
    )
    .anchored(start);
    assert!(sunday_weeks.should_create_instance(d("2025-01-05")));
    assert!(sunday_weeks.should_create_instance(d("2025-01-06")));
}

#[test]
fn even_and_odd_weeks_follow_iso_week_number() {
    let even = FrequencyRule::WeeklyEven(WeeklyPattern::new([Weekday::Mon]));
    let odd = FrequencyRule::WeeklyOdd(WeeklyPattern::new([Weekday::Mon]));

    // 2025-01-06 is ISO week 2, 2025-01-13 is week 3.
    assert!(even.should_create_instance(d("2025-01-06")));
    assert!(!even.should_create_instance(d("2025-01-13")));
    assert!(odd.should_create_instance(d("2025-01-13")));

    assert_eq!(next(&even, "2025-01-06"), "2025-01-20");
    assert_eq!(next(&odd, "2025-01-06"), "2025-01-13");
}

#[test]
fn even_weeks_cross_year_with_53_weeks() {
    // 2026 has 53 ISO weeks; Monday 2026-12-28 is week 53, 2027-01-04 is week 1.
    let even = FrequencyRule::WeeklyEven(WeeklyPattern::new([Weekday::Mon]));
    assert_eq!(next(&even, "2026-12-21"), "2027-01-11");
}

// ---------------------------------------------------------------------------
// Monthly family
// ---------------------------------------------------------------------------

#[test]
fn monthly_advances_across_days_of_month() {
    let rule = FrequencyRule::Monthly(monthly(&[5, 20]));
    assert_eq!(next(&rule, "2025-01-05"), "2025-01-20");
    assert_eq!(next(&rule, "2025-01-20"), "2025-02-05");
}

#[test]
fn bimonthly_honors_anchor_month() {
    let rule = FrequencyRule::BiMonthly(monthly(&[5, 20])).anchored(d("2025-01-05"));
    assert_eq!(next(&rule, "2025-01-05"), "2025-01-20");
    assert_eq!(next(&rule, "2025-01-20"), "2025-03-05");
}

#[test]
fn quarterly_from_start_and_early_in_month() {
    let rule = FrequencyRule::Quarterly(monthly(&[15])).anchored(d("2025-02-15"));
    assert_eq!(next(&rule, "2025-02-15"), "2025-05-15");
    assert_eq!(next(&rule, "2025-02-01"), "2025-02-15");
}

#[test]
fn semiannual_from_start_and_early_in_month() {
    let rule = FrequencyRule::SemiAnnually(monthly(&[10])).anchored(d("2025-01-10"));
    assert_eq!(next(&rule, "2025-01-10"), "2025-07-10");
    assert_eq!(next(&rule, "2025-01-05"), "2025-01-10");
}

#[test]
fn annual_rolls_to_next_year() {
    let rule = FrequencyRule::Annually(monthly(&[1, 15])).anchored(d("2025-04-01"));
    assert_eq!(next(&rule, "2025-04-01"), "2025-04-15");
    assert_eq!(next(&rule, "2025-04-20"), "2026-04-01");
}

#[test]
fn every_four_months_from_schedule_start() {
    let rule = FrequencyRule::every_months(4, monthly(&[15])).unwrap();
    assert_eq!(rule.frequency(), Frequency::EveryXMonths(4));

    let schedule = schedule_from("2025-01-15", rule);
    let rule = schedule.frequency().unwrap();
    assert!(rule.should_create_recurring_instance(&schedule, d("2025-01-15")));
    assert!(!rule.should_create_recurring_instance(&schedule, d("2025-03-15")));
    assert!(rule.should_create_recurring_instance(&schedule, d("2025-05-15")));
    assert_eq!(next(rule, "2025-01-15"), "2025-05-15");
}

#[test]
fn every_five_months_with_explicit_start_month() {
    // A start month without a year wraps as `(month - start_month + 12) % 5`.
    let pattern = monthly(&[10]).with_anchor(MonthAnchor::new(2).unwrap());
    let rule = FrequencyRule::EveryXMonths(EveryXMonths::new(5, pattern).unwrap());
    assert!(rule.should_create_instance(d("2025-05-10")));
    assert!(rule.should_create_instance(d("2025-10-10")));
    assert!(!rule.should_create_instance(d("2025-02-10")));
    assert!(!rule.should_create_instance(d("2025-07-10")));
    assert_eq!(next(&rule, "2025-05-10"), "2025-10-10");
}

#[test]
fn every_five_months_with_start_month_and_year() {
    let anchor = MonthAnchor::new(2).unwrap().with_year(2025);
    let pattern = monthly(&[10]).with_anchor(anchor);
    let rule = FrequencyRule::EveryXMonths(EveryXMonths::new(5, pattern).unwrap());
    assert!(rule.should_create_instance(d("2025-02-10")));
    assert!(rule.should_create_instance(d("2025-07-10")));
    assert!(!rule.should_create_instance(d("2025-05-10")));
}

#[test]
fn monthly_skips_months_without_the_day() {
    let rule = FrequencyRule::Monthly(monthly(&[31]));
    assert_eq!(next(&rule, "2025-01-31"), "2025-03-31");

    let rule = FrequencyRule::Monthly(monthly(&[30, 31]));
    assert_eq!(next(&rule, "2025-02-10"), "2025-03-30");
}

#[test]
fn leap_day_rule_waits_for_leap_year() {
    let rule = FrequencyRule::Annually(monthly(&[29])).anchored(d("2024-02-29"));
    assert_eq!(next(&rule, "2024-02-29"), "2028-02-29");
}

#[test]
fn monthly_without_days_uses_start_day() {
    let rule = FrequencyRule::Monthly(MonthlyPattern::default());
    let schedule = schedule_from("2025-01-12", rule);
    let rule = schedule.frequency().unwrap();
    assert!(rule.should_create_recurring_instance(&schedule, d("2025-02-12")));
    assert!(!rule.should_create_recurring_instance(&schedule, d("2025-02-13")));
}

#[test]
fn monthly_preview_without_anchor_skips_phase_check() {
    let rule = FrequencyRule::Quarterly(monthly(&[1]));
    assert!(!rule.is_anchored());
    assert!(rule.should_create_instance(d("2025-01-01")));
    assert!(rule.should_create_instance(d("2025-02-01")));
    assert!(!rule.should_create_instance(d("2025-02-02")));
}

#[test]
fn period_that_does_not_divide_a_year_stays_exact_across_years() {
    let rule = FrequencyRule::every_months(5, monthly(&[1])).unwrap().anchored(d("2025-01-01"));
    let dates: Vec<String> = rule
        .occurrences(d("2025-01-01"))
        .take(4)
        .map(|date| date.to_string())
        .collect();
    assert_eq!(dates, ["2025-01-01", "2025-06-01", "2025-11-01", "2026-04-01"]);
}

// ---------------------------------------------------------------------------
// Ordinal weekday
// ---------------------------------------------------------------------------

#[test]
fn ordinal_weekday_advances_to_next_month() {
    let first_wed = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::from_numbers(1, 3).unwrap());
    let second_fri = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::from_numbers(2, 5).unwrap());
    let last_mon = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::from_numbers(5, 1).unwrap());

    assert_eq!(next(&first_wed, "2025-01-01"), "2025-02-05");
    assert_eq!(next(&second_fri, "2025-01-10"), "2025-02-14");
    assert_eq!(next(&last_mon, "2025-01-27"), "2025-02-24");
}

#[test]
fn ordinal_weekday_membership() {
    let first_wed = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::First, Weekday::Wed));
    assert!(first_wed.should_create_instance(d("2025-01-01")));
    assert!(!first_wed.should_create_instance(d("2025-01-08")));
    assert!(first_wed.should_create_instance(d("2025-02-05")));
    assert!(!first_wed.should_create_instance(d("2025-02-04")));

    let second_fri = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::Second, Weekday::Fri));
    assert!(second_fri.should_create_instance(d("2025-01-10")));
    assert!(!second_fri.should_create_instance(d("2025-01-03")));
    assert!(second_fri.should_create_instance(d("2025-02-14")));

    let last_mon = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::Last, Weekday::Mon));
    assert!(last_mon.should_create_instance(d("2025-01-27")));
    assert!(last_mon.should_create_instance(d("2025-02-24")));
    assert!(!last_mon.should_create_instance(d("2025-01-20")));
}

#[test]
fn fourth_and_last_differ_in_five_occurrence_months() {
    let fourth = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::Fourth, Weekday::Fri));
    let last = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::Last, Weekday::Fri));

    // March 2025 has four Fridays; the 28th is both.
    assert!(fourth.should_create_instance(d("2025-03-28")));
    assert!(last.should_create_instance(d("2025-03-28")));
    // January 2025 has five: 4th is the 24th, last is the 31st.
    assert!(fourth.should_create_instance(d("2025-01-24")));
    assert!(!fourth.should_create_instance(d("2025-01-31")));
    assert!(last.should_create_instance(d("2025-01-31")));
}

#[test]
fn ordinal_weekday_never_before_schedule_start() {
    let rule = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::First, Weekday::Wed));
    let schedule = schedule_from("2025-02-01", rule);
    let rule = schedule.frequency().unwrap();

    assert!(!rule.should_create_recurring_instance(&schedule, d("2025-01-01")));
    assert!(rule.should_create_recurring_instance(&schedule, d("2025-02-05")));
}

#[test]
fn ordinal_occurrences_include_later_date_in_same_month() {
    let rule = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::Last, Weekday::Mon));
    let dates: Vec<NaiveDate> = rule.occurrences(d("2025-01-02")).take(2).collect();
    assert_eq!(dates, [d("2025-01-27"), d("2025-02-24")]);
}

#[test]
fn ordinal_numbers_out_of_range_are_rejected() {
    assert!(matches!(OrdinalWeekday::from_numbers(0, 1), Err(RecurrenceError::Validation(_))));
    assert!(matches!(OrdinalWeekday::from_numbers(6, 1), Err(RecurrenceError::Validation(_))));
    assert!(matches!(OrdinalWeekday::from_numbers(1, 7), Err(RecurrenceError::Validation(_))));
}

// ---------------------------------------------------------------------------
// Construction and anchoring
// ---------------------------------------------------------------------------

#[test]
fn every_n_prefers_named_kinds() {
    let weekly = WeeklyPattern::new([Weekday::Mon]);
    assert_eq!(FrequencyRule::every_weeks(1, weekly.clone()).unwrap().frequency(), Frequency::Weekly);
    assert_eq!(FrequencyRule::every_weeks(2, weekly.clone()).unwrap().frequency(), Frequency::BiWeekly);
    assert_eq!(
        FrequencyRule::every_weeks(21, weekly).unwrap().frequency(),
        Frequency::EveryXWeeks(21)
    );
    assert_eq!(
        FrequencyRule::every_months(6, monthly(&[1])).unwrap().frequency(),
        Frequency::SemiAnnually
    );
    assert_eq!(
        FrequencyRule::every_months(12, monthly(&[1])).unwrap().frequency(),
        Frequency::Annually
    );
}

#[test]
fn periods_out_of_range_are_rejected() {
    let weekly = WeeklyPattern::new([Weekday::Mon]);
    assert!(matches!(FrequencyRule::every_weeks(0, weekly.clone()), Err(RecurrenceError::Validation(_))));
    assert!(matches!(FrequencyRule::every_weeks(53, weekly), Err(RecurrenceError::Validation(_))));
    assert!(FrequencyRule::every_weeks(52, WeeklyPattern::default()).is_ok());
    assert!(matches!(FrequencyRule::every_months(13, monthly(&[1])), Err(RecurrenceError::Validation(_))));
}

#[test]
fn invalid_days_of_month_are_rejected() {
    assert!(MonthlyPattern::new(Some(vec![0])).is_err());
    assert!(MonthlyPattern::new(Some(vec![32])).is_err());
    assert!(MonthlyPattern::new(Some(Vec::new())).is_err());
    assert_eq!(monthly(&[20, 5, 20]).days_of_month(), Some(&[5, 20][..]));
}

#[test]
fn kind_mismatch_is_unsupported() {
    let err = FrequencyRule::weekly_kind(Frequency::Monthly, WeeklyPattern::default()).unwrap_err();
    assert!(matches!(err, RecurrenceError::UnsupportedFrequency(_)));
}

#[test]
fn anchoring_is_idempotent() {
    let rule = FrequencyRule::BiWeekly(WeeklyPattern::new([Weekday::Mon]));
    assert!(!rule.is_anchored());

    let once = rule.anchored(d("2025-01-06"));
    let twice = once.clone().anchored(d("2025-03-03"));
    assert!(once.is_anchored());
    assert_eq!(once, twice);
}

#[test]
fn anchoring_leaves_unanchored_kinds_alone() {
    let rule = FrequencyRule::WeeklyOdd(WeeklyPattern::new([Weekday::Tue]));
    assert_eq!(rule.clone().anchored(d("2025-01-06")), rule);
    assert!(FrequencyRule::Daily.is_anchored());
}

#[test]
fn occurrences_are_strictly_increasing() {
    let rule = FrequencyRule::Weekly(WeeklyPattern::new([Weekday::Mon, Weekday::Thu]));
    let dates: Vec<NaiveDate> = rule.occurrences(d("2025-01-01")).take(4).collect();
    assert_eq!(
        dates,
        [d("2025-01-02"), d("2025-01-06"), d("2025-01-09"), d("2025-01-13")]
    );
}

// ---------------------------------------------------------------------------
// RRULE export
// ---------------------------------------------------------------------------

#[test]
fn rrule_strings_for_each_family() {
    let weekly = FrequencyRule::Weekly(WeeklyPattern::new([Weekday::Mon, Weekday::Thu]));
    assert_eq!(weekly.to_rrule(), "FREQ=WEEKLY;BYDAY=MO,TH;WKST=MO");

    let every3 = FrequencyRule::every_weeks(3, WeeklyPattern::new([Weekday::Fri])).unwrap();
    assert_eq!(every3.to_rrule(), "FREQ=WEEKLY;INTERVAL=3;BYDAY=FR;WKST=MO");

    let quarterly = FrequencyRule::Quarterly(monthly(&[1, 15]));
    assert_eq!(quarterly.to_rrule(), "FREQ=MONTHLY;INTERVAL=3;BYMONTHDAY=1,15");

    let last_mon = FrequencyRule::MonthlyOrdinalWeekday(OrdinalWeekday::new(Ordinal::Last, Weekday::Mon));
    assert_eq!(last_mon.to_rrule(), "FREQ=MONTHLY;BYDAY=-1MO");

    assert_eq!(FrequencyRule::Daily.to_rrule(), "FREQ=DAILY");
}
