//! # taskplan
//!
//! A terminal task planner organised around a calendar. Tasks cover a single
//! day, an ISO week or a custom date range, carry a priority, a color and an
//! optional checklist, and can be repeated with recurrence rules.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! taskplan
//! # or explicitly
//! taskplan ui
//! ```
//!
//! `v` cycles the list, week and month views, `[`/`]` move between weeks or
//! months, `T` switches the theme.
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! # Single-day task
//! taskplan add "Dentist" --start 2025-03-04 --time 09:30 --priority high
//!
//! # Week-long task
//! taskplan add "Sprint review prep" --kind weekly --start 2025-03-05
//!
//! # Every Monday and Wednesday, four times
//! taskplan add "Gym" --start 2025-01-06 --freq weekly --weekdays mon,wed --count 4
//!
//! # Last Friday of each month until the end of the year
//! taskplan add "Report" --start 2025-01-01 --freq monthly --ordinal "last fri" --until 2025-12-31
//!
//! taskplan list --all
//! taskplan list --done
//! taskplan week 2025-03-04
//! taskplan month 2025-03
//! ```
//!
//! ## Data Storage
//!
//! Tasks are saved in your local data directory (`~/.local/share/taskplan/tasks.json`
//! on Linux). Override it with the `TASKS_DB` environment variable.
//! Preferences live in `config.json` next to it, or at `TASKPLAN_CONFIG`.
//!
//! Set `RUST_LOG=debug` to see what the planner is doing.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use taskplan::commands::*;
use taskplan::config::Config;
use taskplan::tui::run_tui;

#[derive(Parser)]
#[command(name = "taskplan")]
#[command(about = "Calendar task planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task, or a recurring series of tasks
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Start date in YYYY-MM-DD (default: today)
        #[arg(short, long)]
        start: Option<String>,
        /// End date in YYYY-MM-DD (custom ranges)
        #[arg(short, long)]
        end: Option<String>,
        /// Time of day, HH:MM
        #[arg(short, long)]
        time: Option<String>,
        /// Priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<String>,
        /// Kind (daily, weekly, custom)
        #[arg(short, long)]
        kind: Option<String>,
        /// Color as #rrggbb or a preset number
        #[arg(short, long)]
        color: Option<String>,
        /// Subtask title (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
        /// Repeat frequency (daily, weekly, monthly, yearly)
        #[arg(short, long)]
        freq: Option<String>,
        /// Repeat every N periods
        #[arg(short, long, allow_negative_numbers = true)]
        interval: Option<i64>,
        /// Weekdays for weekly repeats, e.g. mon,wed
        #[arg(short, long)]
        weekdays: Option<String>,
        /// Days of the month for monthly repeats, e.g. 1,15
        #[arg(long)]
        month_days: Option<String>,
        /// Ordinal weekday for monthly repeats, e.g. "second tue" or "last fri"
        #[arg(long)]
        ordinal: Option<String>,
        /// Last date of the series (YYYY-MM-DD)
        #[arg(short, long)]
        until: Option<String>,
        /// Number of occurrences in the series
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },
    /// List tasks sorted by date
    List {
        /// Show pending and completed tasks
        #[arg(short, long)]
        all: bool,
        /// Show only completed tasks
        #[arg(long, conflicts_with = "all")]
        done: bool,
        /// Only tasks covering this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show every detail of a task
    Show {
        id: u64,
    },
    /// Mark a task as done, or back to pending
    Toggle {
        id: u64,
    },
    /// Remove a task
    Remove {
        id: u64,
        /// Remove every task of the same recurring series
        #[arg(short, long)]
        group: bool,
    },
    /// Edit a task
    Edit {
        id: u64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description (empty clears it)
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New start date; the task keeps its length
        #[arg(short, long)]
        start: Option<String>,
        /// New end date
        #[arg(short, long)]
        end: Option<String>,
        /// New time (empty clears it)
        #[arg(short, long)]
        time: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
        /// New kind
        #[arg(short, long)]
        kind: Option<String>,
        /// New color
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Manage the subtasks of a task
    Subtask {
        #[command(subcommand)]
        command: SubtaskCommands,
    },
    /// Show a week as a seven-column grid
    Week {
        /// Any date inside the week (default: today)
        date: Option<String>,
    },
    /// Show a month as a calendar grid
    Month {
        /// Month as YYYY-MM (default: current month)
        month: Option<String>,
    },
    /// Show or change preferences
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Reset the database (delete all tasks)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum SubtaskCommands {
    /// Add a subtask
    Add {
        id: u64,
        title: String,
    },
    /// Toggle a subtask (1-based index)
    Toggle {
        id: u64,
        index: usize,
    },
    /// Remove a subtask (1-based index)
    Remove {
        id: u64,
        index: usize,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current settings
    Show,
    /// Change a setting (theme, view, color, presets, max-occurrences)
    Set {
        key: String,
        value: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = Config::load();
    match cli.command {
        Some(Commands::Add {
            title, description, start, end, time, priority, kind, color, subtasks,
            freq, interval, weekdays, month_days, ordinal, until, count,
        }) => {
            let input = NewTask { title, description, start, end, time, priority, kind, color, subtasks };
            let recur = RecurrenceArgs { freq, interval, weekdays, month_days, ordinal, until, count };
            cmd_add(input, recur, &config, false);
        }
        Some(Commands::List { all, done, date }) => {
            let filter = if all {
                StatusFilter::All
            } else if done {
                StatusFilter::Done
            } else {
                StatusFilter::Pending
            };
            cmd_list(filter, date)
        }
        Some(Commands::Show { id }) => cmd_show(id),
        Some(Commands::Toggle { id }) => { cmd_toggle(id, false); }
        Some(Commands::Remove { id, group }) => { cmd_remove(id, group, false); }
        Some(Commands::Edit { id, title, description, start, end, time, priority, kind, color }) => {
            let edit = TaskEdit { title, description, start, end, time, priority, kind, color };
            cmd_edit(id, edit, &config, false);
        }
        Some(Commands::Subtask { command }) => match command {
            SubtaskCommands::Add { id, title } => { cmd_subtask_add(id, title, false); }
            SubtaskCommands::Toggle { id, index } => { cmd_subtask_toggle(id, index, false); }
            SubtaskCommands::Remove { id, index } => { cmd_subtask_remove(id, index, false); }
        },
        Some(Commands::Week { date }) => cmd_week(date),
        Some(Commands::Month { month }) => cmd_month(month),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cmd_config_show(&config),
            ConfigCommands::Set { key, value } => { cmd_config_set(&mut config, &key, &value, false); }
        },
        Some(Commands::Reset { force }) => cmd_reset(force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "taskplan", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui(config) {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
