//! Recurrence rules and their expansion into concrete occurrence dates.
//!
//! A [`RecurrenceSpec`] is only used while a task is being created: it is
//! expanded against the base task into a list of dates, and each date becomes
//! its own stored [`Task`] (see [`materialize`]). The rule itself is never saved.

use std::fmt;
use std::str::FromStr;
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use crate::error::{PlannerError, RecurrenceError};
use crate::layout::week_bounds;
use crate::models::{Task, TaskKind};

/// Hard ceiling on the number of occurrences a single rule may produce.
///
/// Rules asking for more are truncated silently; this is not an error.
pub const MAX_OCCURRENCES: usize = 1000;

/// Number of periods (days, weeks, months or years) scanned before giving up on
/// a rule that keeps producing nothing, such as a yearly Feb 29 rule stepping
/// only through common years.
const MAX_PERIODS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Which occurrence of a weekday inside a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekOrdinal {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Last,
}

/// How a monthly rule picks its days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthRule {
    /// Explicit days of the month. Days the month does not have are skipped.
    Days(Vec<u32>),
    /// "The second Tuesday", "the last Friday", ...
    Ordinal { ordinal: WeekOrdinal, weekday: Weekday },
}

/// When a rule stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCondition {
    /// Last allowed date, inclusive.
    Until(NaiveDate),
    /// Total number of occurrences, the first one included.
    Count(u32),
}

/// A recurrence rule attached to a task at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSpec {
    pub frequency: Frequency,
    /// Step between periods. Kept signed so bad input can be reported rather than wrapped.
    pub interval: i64,
    /// Days of the week for weekly rules.
    pub weekdays: Vec<Weekday>,
    /// Day selection for monthly rules. `None` repeats the base task's day of month.
    pub month_rule: Option<MonthRule>,
    pub end: EndCondition,
}

impl RecurrenceSpec {
    pub fn new(frequency: Frequency, end: EndCondition) -> RecurrenceSpec {
        RecurrenceSpec {
            frequency,
            interval: 1,
            weekdays: Vec::new(),
            month_rule: None,
            end,
        }
    }

    pub fn every(mut self, interval: i64) -> RecurrenceSpec {
        self.interval = interval;
        self
    }

    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> RecurrenceSpec {
        self.weekdays = weekdays.into_iter().collect();
        self
    }

    pub fn with_month_rule(mut self, rule: MonthRule) -> RecurrenceSpec {
        self.month_rule = Some(rule);
        self
    }

    /// Checks the rule against the task it will be expanded from.
    pub fn validate(&self, base: &Task) -> Result<(), RecurrenceError> {
        if self.interval < 1 {
            return Err(RecurrenceError::InvalidInterval(self.interval));
        }
        // Occurrences of a weekly task must land on Mondays.
        if base.kind == TaskKind::Weekly && self.frequency != Frequency::Weekly {
            return Err(RecurrenceError::WeeklyTaskFrequency);
        }
        if self.frequency == Frequency::Weekly
            && base.kind != TaskKind::Weekly
            && self.weekdays.is_empty()
        {
            return Err(RecurrenceError::EmptyWeekdays);
        }
        if self.frequency == Frequency::Monthly {
            if let Some(MonthRule::Days(days)) = &self.month_rule {
                if days.is_empty() {
                    return Err(RecurrenceError::EmptyMonthDays);
                }
                if let Some(&bad) = days.iter().find(|d| !(1..=31).contains(*d)) {
                    return Err(RecurrenceError::InvalidMonthDay(bad));
                }
            }
        }
        match self.end {
            EndCondition::Count(0) => Err(RecurrenceError::InvalidCount),
            EndCondition::Until(until) if until < base.start => Err(RecurrenceError::EndBeforeStart {
                start: base.start,
                until,
            }),
            _ => Ok(()),
        }
    }

    /// Candidate dates of one period, ascending and without duplicates.
    ///
    /// `offset` is the number of days/weeks/months/years since the base period.
    /// Returns `None` once the period falls off the supported calendar.
    fn period_dates(&self, base: &Task, offset: i64) -> Option<Vec<NaiveDate>> {
        let start = base.start;
        let steps = u64::try_from(offset).ok()?;
        match self.frequency {
            Frequency::Daily => start.checked_add_days(Days::new(steps)).map(|d| vec![d]),
            Frequency::Weekly => {
                let (monday, _) = week_bounds(start);
                let monday = monday.checked_add_days(Days::new(steps.checked_mul(7)?))?;
                if base.kind == TaskKind::Weekly {
                    return Some(vec![monday]);
                }
                let mut offsets: Vec<u64> = self.weekdays.iter()
                    .map(|w| w.num_days_from_monday() as u64)
                    .collect();
                offsets.sort_unstable();
                offsets.dedup();
                offsets.into_iter()
                    .map(|o| monday.checked_add_days(Days::new(o)))
                    .collect()
            }
            Frequency::Monthly => {
                let first = start.with_day(1)?.checked_add_months(Months::new(u32::try_from(steps).ok()?))?;
                let (year, month) = (first.year(), first.month());
                match &self.month_rule {
                    None => Some(NaiveDate::from_ymd_opt(year, month, start.day()).into_iter().collect()),
                    Some(MonthRule::Days(days)) => {
                        let mut days = days.clone();
                        days.sort_unstable();
                        days.dedup();
                        Some(days.into_iter()
                            .filter_map(|d| NaiveDate::from_ymd_opt(year, month, d))
                            .collect())
                    }
                    Some(MonthRule::Ordinal { ordinal, weekday }) => {
                        Some(nth_weekday_of_month(year, month, *weekday, *ordinal).into_iter().collect())
                    }
                }
            }
            Frequency::Yearly => {
                let year = i32::try_from((start.year() as i64).checked_add(offset)?).ok()?;
                if year > NaiveDate::MAX.year() {
                    return None;
                }
                // Feb 29 bases produce nothing in common years.
                Some(NaiveDate::from_ymd_opt(year, start.month(), start.day()).into_iter().collect())
            }
        }
    }
}

/// Expands `spec` against `base` into the ordered list of occurrence dates.
///
/// The result is ascending, free of duplicates, starts no earlier than
/// `base.start`, and holds at most `min(horizon_limit, MAX_OCCURRENCES)` dates.
/// The rule is validated first; an invalid rule yields an error and no dates.
pub fn expand(base: &Task, spec: &RecurrenceSpec, horizon_limit: usize) -> Result<Vec<NaiveDate>, RecurrenceError> {
    spec.validate(base)?;

    let limit = horizon_limit.min(MAX_OCCURRENCES);
    let (wanted, until) = match spec.end {
        EndCondition::Count(n) => ((n as usize).min(limit), None),
        EndCondition::Until(date) => (limit, Some(date)),
    };

    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut reached_end = false;
    let mut period = 0;
    'periods: while period < MAX_PERIODS && dates.len() < wanted {
        let Some(offset) = period.checked_mul(spec.interval) else { break };
        let Some(candidates) = spec.period_dates(base, offset) else { break };
        for date in candidates {
            if date < base.start {
                continue;
            }
            if until.is_some_and(|u| date > u) {
                reached_end = true;
                break 'periods;
            }
            if dates.last().is_some_and(|last| *last >= date) {
                continue;
            }
            dates.push(date);
            if dates.len() == wanted {
                break 'periods;
            }
        }
        period += 1;
    }

    let requested_more = match spec.end {
        EndCondition::Count(n) => n as usize > dates.len(),
        EndCondition::Until(_) => !reached_end,
    };
    if requested_more {
        log::warn!(
            "Recurrence for '{}' truncated at {} occurrences (limit {})",
            base.title, dates.len(), limit
        );
    }
    Ok(dates)
}

/// Builds one task per occurrence date, copying every attribute of `base`.
///
/// Each copy keeps the base task's length in days and gets `group_id`.
/// Ids are left at `0` for storage to assign.
pub fn materialize(base: &Task, dates: &[NaiveDate], group_id: Option<&str>) -> Vec<Task> {
    let length = base.end - base.start;
    dates.iter()
        .map(|&date| {
            let mut t = base.clone();
            t.id = 0;
            t.start = date;
            t.end = date + length;
            t.group_id = group_id.map(str::to_string);
            t
        })
        .collect()
}

/// Date of the `ordinal` `weekday` of the given month, if the month has one.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, ordinal: WeekOrdinal) -> Option<NaiveDate> {
    let n = match ordinal {
        WeekOrdinal::First => 1,
        WeekOrdinal::Second => 2,
        WeekOrdinal::Third => 3,
        WeekOrdinal::Fourth => 4,
        WeekOrdinal::Fifth => 5,
        WeekOrdinal::Last => {
            let last = last_day_of_month(year, month)?;
            let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
            return last.checked_sub_days(Days::new(back as u64));
        }
    };
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// Last day of the given month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

impl FromStr for Frequency {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(PlannerError::Parse(format!(
                "unknown frequency '{}'. Supported: daily, weekly, monthly, yearly.", other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(s)
    }
}

impl FromStr for WeekOrdinal {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "first" => Ok(WeekOrdinal::First),
            "2" | "second" => Ok(WeekOrdinal::Second),
            "3" | "third" => Ok(WeekOrdinal::Third),
            "4" | "fourth" => Ok(WeekOrdinal::Fourth),
            "5" | "fifth" => Ok(WeekOrdinal::Fifth),
            "-1" | "last" => Ok(WeekOrdinal::Last),
            other => Err(PlannerError::Parse(format!(
                "unknown ordinal '{}'. Supported: first..fifth, last.", other
            ))),
        }
    }
}

/// Parses one weekday, accepting two-letter codes (`MO`, `WE`) as well as
/// English names and abbreviations.
pub fn parse_weekday(s: &str) -> Result<Weekday, PlannerError> {
    let s = s.trim();
    match s.to_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        _ => s.parse::<Weekday>()
            .map_err(|_| PlannerError::Parse(format!("unknown weekday '{}'", s))),
    }
}

/// Parses a comma separated weekday list such as `mon,wed` or `MO,WE`.
pub fn parse_weekdays(s: &str) -> Result<Vec<Weekday>, PlannerError> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(parse_weekday)
        .collect()
}

/// Parses a comma separated list of days of the month such as `1,15,31`.
pub fn parse_month_days(s: &str) -> Result<Vec<u32>, PlannerError> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().parse::<u32>()
            .map_err(|_| PlannerError::Parse(format!("invalid day of month '{}'", p.trim()))))
        .collect()
}

/// Parses an ordinal weekday rule such as `second tue` or `last:fri`.
pub fn parse_ordinal_rule(s: &str) -> Result<MonthRule, PlannerError> {
    let parts: Vec<&str> = s.split(|c: char| c == ':' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [ordinal, weekday] => Ok(MonthRule::Ordinal {
            ordinal: ordinal.parse()?,
            weekday: parse_weekday(weekday)?,
        }),
        _ => Err(PlannerError::Parse(format!(
            "invalid ordinal rule '{}'. Use e.g. 'second tue' or 'last:fri'.", s
        ))),
    }
}
