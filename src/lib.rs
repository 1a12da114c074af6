//! Calendar task planner: daily, weekly and custom-range tasks with
//! priorities, colors, subtasks and recurrence rules.
//!
//! The scheduling logic lives in [`recurrence`] (turning a rule into
//! occurrence dates) and [`layout`] (placing tasks on a seven-column week
//! grid). Both are pure; [`commands`] and [`tui`] wire them to storage.

pub mod commands;
pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod recurrence;
pub mod storage;
pub mod tui;
