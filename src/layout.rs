//! Placement of tasks on a Monday-first, seven-column calendar grid.

use std::cmp::{Ordering, Reverse};
use chrono::{Datelike, Duration, NaiveDate};
use crate::models::{Task, TaskKind};

/// Columns in a week row.
pub const DAYS_PER_WEEK: i64 = 7;

/// Where a multi-day task sits inside one week row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// 1-based column, Monday = 1.
    pub start_column: u8,
    /// Number of columns covered, 1..=7.
    pub span_columns: u8,
}

/// Monday and Sunday of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(DAYS_PER_WEEK - 1))
}

/// Computes the visible part of `task` in the week `[week_start, week_end]`.
///
/// Returns `None` when the task does not overlap the week, and always for
/// daily tasks, which are laid out per day instead.
pub fn visible_span(task: &Task, week_start: NaiveDate, week_end: NaiveDate) -> Option<Span> {
    if task.kind == TaskKind::Daily {
        return None;
    }
    if task.start > week_end || task.end < week_start {
        return None;
    }
    let visible_start = task.start.max(week_start);
    let visible_end = task.end.min(week_end);

    let offset = (visible_start - week_start).num_days();
    if offset >= DAYS_PER_WEEK {
        return None;
    }
    let span = ((visible_end - visible_start).num_days() + 1).min(DAYS_PER_WEEK - offset);
    Some(Span {
        start_column: (offset + 1) as u8,
        span_columns: span as u8,
    })
}

/// The Monday..Sunday windows needed to show every day of a month.
pub fn month_weeks(year: i32, month: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let Some(last) = crate::recurrence::last_day_of_month(year, month) else {
        return Vec::new();
    };
    let (mut monday, _) = week_bounds(first);
    let mut weeks = Vec::new();
    while monday <= last {
        weeks.push((monday, monday + Duration::days(DAYS_PER_WEEK - 1)));
        monday += Duration::days(DAYS_PER_WEEK);
    }
    weeks
}

/// One week row of a calendar grid.
#[derive(Debug, Clone)]
pub struct WeekLayout<'a> {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// Multi-day tasks drawn as bars across the row.
    pub bars: Vec<(&'a Task, Span)>,
    /// Single-day tasks, one slot list per day, Monday first.
    pub days: [Vec<&'a Task>; 7],
}

impl<'a> WeekLayout<'a> {
    /// Date shown in the given 0-based column.
    pub fn day(&self, column: usize) -> NaiveDate {
        self.week_start + Duration::days(column as i64)
    }
}

/// Splits `tasks` into the bars and day slots of the week starting on the
/// Monday of `anchor`'s week.
///
/// Daily tasks and custom/weekly tasks that start and end on the same day go
/// to the slot of their day. Everything else becomes a bar.
pub fn layout_week(tasks: &[Task], anchor: NaiveDate) -> WeekLayout<'_> {
    let (week_start, week_end) = week_bounds(anchor);
    let mut layout = WeekLayout {
        week_start,
        week_end,
        bars: Vec::new(),
        days: Default::default(),
    };

    for task in tasks {
        if task.kind == TaskKind::Daily || !task.is_multi_day() {
            if task.start >= week_start && task.start <= week_end {
                let column = (task.start - week_start).num_days() as usize;
                layout.days[column].push(task);
            }
        } else if let Some(span) = visible_span(task, week_start, week_end) {
            layout.bars.push((task, span));
        }
    }

    layout.bars.sort_by_key(|(t, s)| (s.start_column, Reverse(s.span_columns), t.id));
    for slot in layout.days.iter_mut() {
        slot.sort_by(|a, b| slot_order(a, b));
    }
    layout
}

/// Order of tasks inside one day: timed tasks first by time, then higher
/// priority, then title.
pub fn slot_order(a: &Task, b: &Task) -> Ordering {
    let by_time = match (a.time, b.time) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_time
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| a.title.cmp(&b.title))
}

/// Tasks covering `date`, in slot order.
pub fn tasks_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    let mut found: Vec<&Task> = tasks.iter().filter(|t| t.covers(date)).collect();
    found.sort_by(|a, b| slot_order(a, b));
    found
}
