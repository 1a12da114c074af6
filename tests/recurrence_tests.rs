use chrono::{Datelike, NaiveDate, Weekday};
use taskplan::error::RecurrenceError;
use taskplan::models::{Priority, Subtask, Task, TaskKind};
use taskplan::recurrence::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn daily(start: NaiveDate) -> Task {
    Task::new("Base", start)
}

#[test]
fn test_daily_interval_and_count() {
    let base = daily(date(2025, 1, 1));
    let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Count(4)).every(2);
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 3), date(2025, 1, 5), date(2025, 1, 7)]);
}

#[test]
fn test_weekly_on_weekdays() {
    let base = daily(date(2024, 1, 1));
    let spec = RecurrenceSpec::new(Frequency::Weekly, EndCondition::Count(4))
        .on_weekdays([Weekday::Wed, Weekday::Mon]);
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 8), date(2024, 1, 10)]);
}

#[test]
fn test_weekly_skips_days_before_start() {
    // Starts on a Wednesday: the Monday of the first week is not emitted.
    let base = daily(date(2024, 1, 3));
    let spec = RecurrenceSpec::new(Frequency::Weekly, EndCondition::Count(3))
        .on_weekdays([Weekday::Mon, Weekday::Wed]);
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 8), date(2024, 1, 10)]);
}

#[test]
fn test_biweekly_monday() {
    let base = daily(date(2025, 1, 6));
    let spec = RecurrenceSpec::new(Frequency::Weekly, EndCondition::Count(3))
        .every(2)
        .on_weekdays([Weekday::Mon]);
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 1, 6), date(2025, 1, 20), date(2025, 2, 3)]);
}

#[test]
fn test_weekly_task_repeats_on_mondays() {
    let mut base = daily(date(2025, 3, 5));
    base.kind = TaskKind::Weekly;
    base.normalize_dates();
    let spec = RecurrenceSpec::new(Frequency::Weekly, EndCondition::Count(3));
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 3, 3), date(2025, 3, 10), date(2025, 3, 17)]);
    assert!(dates.iter().all(|d| d.weekday() == Weekday::Mon));

    let tasks = materialize(&base, &dates, None);
    assert!(tasks.iter().all(|t| t.validate().is_ok()));
    assert_eq!(tasks[2].end, date(2025, 3, 23));
}

#[test]
fn test_monthly_day_of_base() {
    let base = daily(date(2025, 1, 15));
    let spec = RecurrenceSpec::new(Frequency::Monthly, EndCondition::Count(3));
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 1, 15), date(2025, 2, 15), date(2025, 3, 15)]);
}

#[test]
fn test_monthly_explicit_days() {
    let base = daily(date(2025, 1, 10));
    let spec = RecurrenceSpec::new(Frequency::Monthly, EndCondition::Count(4))
        .with_month_rule(MonthRule::Days(vec![15, 1, 15]));
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 1, 15), date(2025, 2, 1), date(2025, 2, 15), date(2025, 3, 1)]);
}

#[test]
fn test_monthly_31st_skips_short_months() {
    let base = daily(date(2025, 1, 31));
    let spec = RecurrenceSpec::new(Frequency::Monthly, EndCondition::Count(3));
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 1, 31), date(2025, 3, 31), date(2025, 5, 31)]);
}

#[test]
fn test_monthly_ordinal_weekday() {
    let base = daily(date(2025, 1, 1));
    let spec = RecurrenceSpec::new(Frequency::Monthly, EndCondition::Count(2))
        .with_month_rule(MonthRule::Ordinal { ordinal: WeekOrdinal::Last, weekday: Weekday::Fri });
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 1, 31), date(2025, 2, 28)]);

    assert_eq!(nth_weekday_of_month(2025, 2, Weekday::Tue, WeekOrdinal::Second), Some(date(2025, 2, 11)));
    assert_eq!(nth_weekday_of_month(2025, 2, Weekday::Mon, WeekOrdinal::Fifth), None);
}

#[test]
fn test_yearly_leap_day() {
    let base = daily(date(2024, 2, 29));
    let spec = RecurrenceSpec::new(Frequency::Yearly, EndCondition::Count(2));
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2024, 2, 29), date(2028, 2, 29)]);
}

#[test]
fn test_until_is_inclusive() {
    let base = daily(date(2025, 1, 1));
    let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Until(date(2025, 1, 5)));
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates.len(), 5);
    assert_eq!(dates.last(), Some(&date(2025, 1, 5)));
}

#[test]
fn test_occurrence_ceiling() {
    let base = daily(date(2025, 1, 1));
    let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Count(5000));
    let dates = expand(&base, &spec, usize::MAX).unwrap();
    assert_eq!(dates.len(), MAX_OCCURRENCES);
    assert!(dates.windows(2).all(|w| w[0] < w[1]));

    let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Until(date(2030, 1, 1)));
    assert_eq!(expand(&base, &spec, 10).unwrap().len(), 10);
}

#[test]
fn test_invalid_rules() {
    let base = daily(date(2025, 1, 10));

    let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Count(3)).every(0);
    assert_eq!(expand(&base, &spec, MAX_OCCURRENCES), Err(RecurrenceError::InvalidInterval(0)));

    let spec = RecurrenceSpec::new(Frequency::Weekly, EndCondition::Count(3));
    assert_eq!(expand(&base, &spec, MAX_OCCURRENCES), Err(RecurrenceError::EmptyWeekdays));

    let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Count(0));
    assert_eq!(expand(&base, &spec, MAX_OCCURRENCES), Err(RecurrenceError::InvalidCount));

    let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Until(date(2025, 1, 9)));
    assert_eq!(
        expand(&base, &spec, MAX_OCCURRENCES),
        Err(RecurrenceError::EndBeforeStart { start: date(2025, 1, 10), until: date(2025, 1, 9) })
    );

    let spec = RecurrenceSpec::new(Frequency::Monthly, EndCondition::Count(3))
        .with_month_rule(MonthRule::Days(vec![1, 32]));
    assert_eq!(expand(&base, &spec, MAX_OCCURRENCES), Err(RecurrenceError::InvalidMonthDay(32)));

    let spec = RecurrenceSpec::new(Frequency::Monthly, EndCondition::Count(3))
        .with_month_rule(MonthRule::Days(vec![]));
    assert_eq!(expand(&base, &spec, MAX_OCCURRENCES), Err(RecurrenceError::EmptyMonthDays));
}

#[test]
fn test_materialize_keeps_attributes() {
    let mut base = daily(date(2025, 1, 1));
    base.kind = TaskKind::Custom;
    base.end = date(2025, 1, 3);
    base.priority = Priority::High;
    base.color = "#d32f2f".into();
    base.subtasks = vec![Subtask { title: "Pack".into(), completed: false }];

    let dates = [date(2025, 1, 1), date(2025, 2, 1)];
    let tasks = materialize(&base, &dates, Some("series-1"));
    assert_eq!(tasks.len(), 2);
    for t in &tasks {
        assert_eq!(t.duration_days(), 3);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.color, "#d32f2f");
        assert_eq!(t.subtasks.len(), 1);
        assert_eq!(t.group_id.as_deref(), Some("series-1"));
    }
    assert_eq!(tasks[1].end, date(2025, 2, 3));
}

#[test]
fn test_rule_parsers() {
    assert_eq!(parse_weekdays("MO,we, fri").unwrap(), vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    assert!(parse_weekday("xx").is_err());
    assert_eq!(parse_month_days("1, 15,31").unwrap(), vec![1, 15, 31]);
    assert_eq!(
        parse_ordinal_rule("second tue").unwrap(),
        MonthRule::Ordinal { ordinal: WeekOrdinal::Second, weekday: Weekday::Tue }
    );
    assert_eq!(
        parse_ordinal_rule("last:FR").unwrap(),
        MonthRule::Ordinal { ordinal: WeekOrdinal::Last, weekday: Weekday::Fri }
    );
    assert!(parse_ordinal_rule("tuesday").is_err());
    assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
}

#[test]
fn test_daily_spacing_for_several_intervals() {
    let base = daily(date(2025, 1, 1));
    for (interval, count) in [(1, 1), (1, 10), (3, 5), (7, 4), (30, 12)] {
        let spec = RecurrenceSpec::new(Frequency::Daily, EndCondition::Count(count)).every(interval);
        let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
        assert_eq!(dates.len(), count as usize);
        assert_eq!(dates[0], base.start);
        assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == interval));
    }
}

#[test]
fn test_monthly_explicit_31st_skips_short_months() {
    let base = daily(date(2025, 3, 1));
    let spec = RecurrenceSpec::new(Frequency::Monthly, EndCondition::Until(date(2025, 8, 31)))
        .with_month_rule(MonthRule::Days(vec![31]));
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2025, 3, 31), date(2025, 5, 31), date(2025, 7, 31), date(2025, 8, 31)]);
}

#[test]
fn test_weekly_until_date() {
    let base = daily(date(2024, 1, 1));
    let spec = RecurrenceSpec::new(Frequency::Weekly, EndCondition::Until(date(2024, 1, 15)))
        .on_weekdays([Weekday::Mon, Weekday::Fri]);
    let dates = expand(&base, &spec, MAX_OCCURRENCES).unwrap();
    assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 12), date(2024, 1, 15)]);
}

#[test]
fn test_weekly_task_rejects_other_frequencies() {
    let mut base = daily(date(2025, 3, 3));
    base.kind = TaskKind::Weekly;
    base.normalize_dates();
    for frequency in [Frequency::Daily, Frequency::Monthly, Frequency::Yearly] {
        let spec = RecurrenceSpec::new(frequency, EndCondition::Count(3));
        assert_eq!(expand(&base, &spec, MAX_OCCURRENCES), Err(RecurrenceError::WeeklyTaskFrequency));
    }
}

#[test]
fn test_yearly_huge_interval_stops() {
    let base = daily(date(2024, 1, 1));
    let spec = RecurrenceSpec::new(Frequency::Yearly, EndCondition::Count(2)).every(i64::MAX);
    assert_eq!(expand(&base, &spec, MAX_OCCURRENCES).unwrap(), vec![date(2024, 1, 1)]);

    // Years past the supported calendar end the series.
    let spec = RecurrenceSpec::new(Frequency::Yearly, EndCondition::Count(3)).every(200_000);
    assert_eq!(expand(&base, &spec, MAX_OCCURRENCES).unwrap(), vec![date(2024, 1, 1), date(202024, 1, 1)]);
}
