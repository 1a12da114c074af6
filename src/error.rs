//! Error types for the planner.

use chrono::NaiveDate;

/// Reasons a recurrence rule is rejected before any occurrence is generated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecurrenceError {
    #[error("interval must be at least 1 (got {0})")]
    InvalidInterval(i64),

    #[error("a weekly task can only repeat weekly")]
    WeeklyTaskFrequency,

    #[error("weekly recurrence needs at least one weekday")]
    EmptyWeekdays,

    #[error("monthly recurrence needs at least one day of month")]
    EmptyMonthDays,

    #[error("day of month {0} is out of range (1-31)")]
    InvalidMonthDay(u32),

    #[error("repetition count must be at least 1")]
    InvalidCount,

    #[error("recurrence ends on {until}, before the task starts on {start}")]
    EndBeforeStart { start: NaiveDate, until: NaiveDate },
}

/// Top-level error type for storage, configuration and input parsing.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Invalid recurrence rule.
    #[error("recurrence error: {0}")]
    Recurrence(#[from] RecurrenceError),

    /// A task field failed validation.
    #[error("invalid task: {0}")]
    Invalid(String),

    /// User input that could not be parsed (dates, times, enums).
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PlannerError>;
