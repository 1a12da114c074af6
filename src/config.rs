//! User preferences shared by the command line and the terminal UI.
//!
//! The configuration is loaded once at startup and handed to the rendering
//! layer explicitly; nothing reads it from global state.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{PlannerError, Result};
use crate::models::{is_hex_color, DEFAULT_COLOR};
use crate::recurrence::MAX_OCCURRENCES;
use crate::storage::{config_path, read_file, write_file};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Which calendar view opens first.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    List,
    Week,
    Month,
}

impl ViewKind {
    /// The view after this one when cycling.
    pub fn next(self) -> ViewKind {
        match self {
            ViewKind::List => ViewKind::Week,
            ViewKind::Week => ViewKind::Month,
            ViewKind::Month => ViewKind::List,
        }
    }
}

fn default_presets() -> Vec<String> {
    ["#1976d2", "#6750a4", "#2e7d32", "#ed6c02", "#d32f2f", "#0288d1", "#ff5722", "#607d8b"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_max_occurrences() -> usize {
    MAX_OCCURRENCES
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub default_view: ViewKind,
    /// Colors offered when adding a task.
    #[serde(default = "default_presets")]
    pub color_presets: Vec<String>,
    #[serde(default = "default_color")]
    pub default_color: String,
    /// Per-series occurrence limit. Never above [`MAX_OCCURRENCES`].
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            theme: Theme::default(),
            default_view: ViewKind::default(),
            color_presets: default_presets(),
            default_color: default_color(),
            max_occurrences: default_max_occurrences(),
        }
    }
}

impl Config {
    /// Loads the configuration file, falling back to defaults when it is
    /// missing or malformed.
    pub fn load() -> Config {
        let path = config_path();
        let Some(s) = read_file(&path) else {
            return Config::default();
        };
        serde_json::from_str(&s).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed config {}: {}", path.display(), e);
            Config::default()
        })
    }

    /// Writes the configuration file.
    pub fn save(&self) -> Result<()> {
        let s = serde_json::to_string_pretty(self)?;
        write_file(&config_path(), &s)
    }

    /// Occurrence limit actually applied to recurrence expansion.
    pub fn occurrence_limit(&self) -> usize {
        self.max_occurrences.clamp(1, MAX_OCCURRENCES)
    }

    /// Updates one setting from its textual form.
    ///
    /// Keys: `theme`, `view`, `color`, `presets` (comma separated), `max-occurrences`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "theme" => self.theme = value.parse()?,
            "view" => self.default_view = value.parse()?,
            "color" => {
                let color = value.trim().to_lowercase();
                if !is_hex_color(&color) {
                    return Err(PlannerError::Parse(format!("'{}' is not a #rrggbb color", value)));
                }
                self.default_color = color;
            }
            "presets" => {
                let presets: Vec<String> = value.split(',')
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .collect();
                if let Some(bad) = presets.iter().find(|c| !is_hex_color(c)) {
                    return Err(PlannerError::Parse(format!("'{}' is not a #rrggbb color", bad)));
                }
                self.color_presets = presets;
            }
            "max-occurrences" => {
                let n: usize = value.trim().parse()
                    .map_err(|_| PlannerError::Parse(format!("invalid number '{}'", value)))?;
                self.max_occurrences = n.clamp(1, MAX_OCCURRENCES);
            }
            other => return Err(PlannerError::Parse(format!(
                "unknown setting '{}'. Supported: theme, view, color, presets, max-occurrences.", other
            ))),
        }
        Ok(())
    }

    /// Resolves a color argument: a preset number (1-based), a hex color, or
    /// the default color when absent.
    pub fn resolve_color(&self, arg: Option<&str>) -> Result<String> {
        let Some(arg) = arg else {
            return Ok(self.default_color.clone());
        };
        if let Ok(n) = arg.trim().parse::<usize>() {
            return self.color_presets.get(n.wrapping_sub(1)).cloned()
                .ok_or_else(|| PlannerError::Parse(format!("no color preset #{}", n)));
        }
        let color = arg.trim().to_lowercase();
        if is_hex_color(&color) {
            Ok(color)
        } else {
            Err(PlannerError::Parse(format!("'{}' is not a #rrggbb color or preset number", arg)))
        }
    }
}

impl FromStr for Theme {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(PlannerError::Parse(format!("unknown theme '{}'. Supported: light, dark.", other))),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for ViewKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "list" => Ok(ViewKind::List),
            "week" => Ok(ViewKind::Week),
            "month" => Ok(ViewKind::Month),
            other => Err(PlannerError::Parse(format!("unknown view '{}'. Supported: list, week, month.", other))),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewKind::List => "list",
            ViewKind::Week => "week",
            ViewKind::Month => "month",
        })
    }
}
