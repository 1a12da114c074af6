use std::fmt;
use std::str::FromStr;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use crate::error::{PlannerError, Result};
use crate::layout::week_bounds;

/// Color given to tasks created without one.
pub const DEFAULT_COLOR: &str = "#1976d2";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// How urgent a task is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// The date-span category of a task.
///
/// - `Daily`: a single day, `start == end`.
/// - `Weekly`: one ISO week, Monday to Sunday.
/// - `Custom`: any range with `end >= start`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    Daily,
    Weekly,
    Custom,
}

/// A checklist item inside a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subtask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// Represents a single task in the planner.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: u64,
    /// Short title shown in every view.
    pub title: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// First day of the task.
    pub start: NaiveDate,
    /// Last day of the task (inclusive).
    pub end: NaiveDate,
    /// Optional time of day.
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub kind: TaskKind,
    /// Display color as `#rrggbb`.
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// Shared by every occurrence materialized from the same recurrence rule.
    #[serde(default)]
    pub group_id: Option<String>,
    /// Timestamp when the task was created (ISO 8601).
    #[serde(default)]
    pub created_at: String,
}

impl Task {
    /// Creates a single-day task with default attributes.
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Task {
        Task {
            id: 0,
            title: title.into(),
            description: None,
            start: date,
            end: date,
            time: None,
            priority: Priority::default(),
            kind: TaskKind::Daily,
            color: default_color(),
            completed: false,
            subtasks: Vec::new(),
            group_id: None,
            created_at: String::new(),
        }
    }

    /// True when the task covers more than one day.
    pub fn is_multi_day(&self) -> bool {
        self.start != self.end
    }

    /// True when `date` falls inside `[start, end]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Snaps the dates onto the shape required by the task kind.
    ///
    /// Daily tasks collapse to their start day, weekly tasks expand to the
    /// Monday..Sunday week containing their start day. Custom ranges are left alone.
    pub fn normalize_dates(&mut self) {
        match self.kind {
            TaskKind::Daily => self.end = self.start,
            TaskKind::Weekly => {
                let (monday, sunday) = week_bounds(self.start);
                self.start = monday;
                self.end = sunday;
            }
            TaskKind::Custom => {}
        }
    }

    /// Checks the task invariants.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PlannerError::Invalid("title must not be empty".into()));
        }
        if self.end < self.start {
            return Err(PlannerError::Invalid(format!(
                "end date {} is before start date {}", self.end, self.start
            )));
        }
        match self.kind {
            TaskKind::Daily if self.start != self.end => {
                return Err(PlannerError::Invalid("a daily task must start and end on the same day".into()));
            }
            TaskKind::Weekly if week_bounds(self.start) != (self.start, self.end) => {
                return Err(PlannerError::Invalid("a weekly task must run from Monday to Sunday".into()));
            }
            _ => {}
        }
        if !is_hex_color(&self.color) {
            return Err(PlannerError::Invalid(format!("'{}' is not a #rrggbb color", self.color)));
        }
        Ok(())
    }

    /// Number of completed subtasks and the total.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }

    /// Display color as RGB components.
    pub fn rgb(&self) -> (u8, u8, u8) {
        hex_to_rgb(&self.color)
            .or_else(|| hex_to_rgb(DEFAULT_COLOR))
            .unwrap_or((25, 118, 210))
    }
}

/// Orders tasks by start date, then time of day (untimed last), then id.
pub fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.start.cmp(&b.start)
            .then_with(|| match (a.time, b.time) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Splits `#rrggbb` into its components.
pub fn hex_to_rgb(s: &str) -> Option<(u8, u8, u8)> {
    if !is_hex_color(s) {
        return None;
    }
    let r = u8::from_str_radix(&s[1..3], 16).ok()?;
    let g = u8::from_str_radix(&s[3..5], 16).ok()?;
    let b = u8::from_str_radix(&s[5..7], 16).ok()?;
    Some((r, g, b))
}

/// Returns true for `#rrggbb` strings.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Shortens `s` to at most `max` characters, ending with `…` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| PlannerError::Parse(format!("invalid date '{}': {}. Use YYYY-MM-DD.", s, e)))
}

/// Parses a time of day as `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| PlannerError::Parse(format!("invalid time '{}'. Use HH:MM or HH:MM:SS.", s)))
}

impl FromStr for Priority {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(PlannerError::Parse(format!("unknown priority '{}'. Supported: low, medium, high.", other))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(TaskKind::Daily),
            "weekly" => Ok(TaskKind::Weekly),
            "custom" => Ok(TaskKind::Custom),
            other => Err(PlannerError::Parse(format!("unknown kind '{}'. Supported: daily, weekly, custom.", other))),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Daily => "daily",
            TaskKind::Weekly => "weekly",
            TaskKind::Custom => "custom",
        };
        f.write_str(s)
    }
}
