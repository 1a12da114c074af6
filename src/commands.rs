use std::io::{self, Write};
use chrono::{Datelike, Local, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use crate::config::Config;
use crate::error::{PlannerError, Result};
use crate::layout::{layout_week, month_weeks, tasks_on, WeekLayout};
use crate::models::{parse_date, parse_time, sort_for_listing, truncate, Priority, Subtask, Task, TaskKind};
use crate::recurrence::{
    expand, materialize, parse_month_days, parse_ordinal_rule, parse_weekdays, EndCondition,
    Frequency, MonthRule, RecurrenceSpec,
};
use crate::storage::{delete_database, delete_group, delete_task, insert_tasks, load_task, load_tasks, save_task};

/// Fields of a task being created, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Start date, `YYYY-MM-DD`. Today when absent.
    pub start: Option<String>,
    /// End date for custom ranges.
    pub end: Option<String>,
    pub time: Option<String>,
    pub priority: Option<String>,
    pub kind: Option<String>,
    /// Hex color or 1-based preset number.
    pub color: Option<String>,
    pub subtasks: Vec<String>,
}

/// Recurrence options of the `add` command.
#[derive(Debug, Clone, Default)]
pub struct RecurrenceArgs {
    pub freq: Option<String>,
    pub interval: Option<i64>,
    pub weekdays: Option<String>,
    pub month_days: Option<String>,
    pub ordinal: Option<String>,
    pub until: Option<String>,
    pub count: Option<u32>,
}

impl RecurrenceArgs {
    /// Builds the recurrence rule, or `None` when no frequency was given.
    pub fn to_spec(&self) -> Result<Option<RecurrenceSpec>> {
        let Some(freq) = &self.freq else {
            return Ok(None);
        };
        let frequency: Frequency = freq.parse()?;
        let end = match (&self.until, self.count) {
            (Some(_), Some(_)) => {
                return Err(PlannerError::Parse("use either --until or --count, not both".into()));
            }
            (Some(until), None) => EndCondition::Until(parse_date(until)?),
            (None, Some(count)) => EndCondition::Count(count),
            (None, None) => {
                return Err(PlannerError::Parse("a recurring task needs --until or --count".into()));
            }
        };
        let mut spec = RecurrenceSpec::new(frequency, end).every(self.interval.unwrap_or(1));
        if let Some(w) = &self.weekdays {
            spec = spec.on_weekdays(parse_weekdays(w)?);
        }
        match (&self.month_days, &self.ordinal) {
            (Some(_), Some(_)) => {
                return Err(PlannerError::Parse("use either --month-days or --ordinal, not both".into()));
            }
            (Some(days), None) => spec = spec.with_month_rule(MonthRule::Days(parse_month_days(days)?)),
            (None, Some(rule)) => spec = spec.with_month_rule(parse_ordinal_rule(rule)?),
            (None, None) => {}
        }
        Ok(Some(spec))
    }
}

/// Turns user input into a validated task (not yet stored).
pub fn build_task(input: &NewTask, config: &Config) -> Result<Task> {
    let start = match &input.start {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let mut task = Task::new(input.title.trim(), start);
    task.description = input.description.as_ref()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    task.kind = match &input.kind {
        Some(k) => k.parse()?,
        None if input.end.is_some() => TaskKind::Custom,
        None => TaskKind::Daily,
    };
    if let Some(e) = &input.end {
        task.end = parse_date(e)?;
    }
    task.normalize_dates();
    task.time = input.time.as_deref().map(parse_time).transpose()?;
    if let Some(p) = &input.priority {
        task.priority = p.parse()?;
    }
    task.color = config.resolve_color(input.color.as_deref())?;
    task.subtasks = input.subtasks.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| Subtask { title: s.to_string(), completed: false })
        .collect();
    task.created_at = Local::now().to_rfc3339();
    task.validate()?;
    Ok(task)
}

/// Builds every task row a creation request produces.
///
/// Without recurrence this is the single base task. With recurrence the rule
/// is expanded and one row per occurrence is returned, all sharing a fresh
/// group id.
pub fn plan_tasks(input: &NewTask, recur: &RecurrenceArgs, config: &Config) -> Result<Vec<Task>> {
    let base = build_task(input, config)?;
    let Some(spec) = recur.to_spec()? else {
        return Ok(vec![base]);
    };
    let dates = expand(&base, &spec, config.occurrence_limit())?;
    let group_id = uuid::Uuid::new_v4().to_string();
    log::debug!("Expanded '{}' into {} occurrence(s), group {}", base.title, dates.len(), group_id);
    let tasks = materialize(&base, &dates, Some(&group_id));
    for t in &tasks {
        t.validate()?;
    }
    Ok(tasks)
}

/// Adds a new task, or a whole recurring series, to the database.
///
/// Returns the ids of the stored tasks.
pub fn cmd_add(input: NewTask, recur: RecurrenceArgs, config: &Config, silent: bool) -> Option<Vec<u64>> {
    let tasks = match plan_tasks(&input, &recur, config) {
        Ok(t) => t,
        Err(e) => {
            if !silent { eprintln!("{}", e); }
            return None;
        }
    };
    if tasks.is_empty() {
        if !silent { println!("The recurrence rule produced no dates; nothing added."); }
        return Some(Vec::new());
    }
    match insert_tasks(tasks) {
        Ok(ids) => {
            if !silent {
                match ids.as_slice() {
                    [id] => println!("Task added (id = {})", id),
                    _ => println!("{} tasks added (ids {}-{})", ids.len(), ids[0], ids[ids.len() - 1]),
                }
            }
            Some(ids)
        }
        Err(e) => {
            if !silent { eprintln!("Failed to save tasks: {}", e); }
            None
        }
    }
}

/// Flips the completion flag of a task. Returns the new state.
pub fn cmd_toggle(id: u64, silent: bool) -> Option<bool> {
    let Some(mut t) = load_task(id) else {
        if !silent { eprintln!("Task {} not found.", id); }
        return None;
    };
    t.completed = !t.completed;
    if let Err(e) = save_task(&t) {
        if !silent { eprintln!("Failed to save tasks: {}", e); }
        return None;
    }
    if !silent {
        println!("Task {} marked as {}.", id, if t.completed { "done" } else { "pending" });
    }
    Some(t.completed)
}

/// Removes a task from the database by ID, or its whole recurring series
/// when `group` is set.
pub fn cmd_remove(id: u64, group: bool, silent: bool) -> bool {
    let group_id = if group {
        match load_task(id) {
            Some(t) => t.group_id,
            None => {
                if !silent { eprintln!("Task {} not found.", id); }
                return false;
            }
        }
    } else {
        None
    };

    let result = match &group_id {
        Some(g) => delete_group(g).map(|n| n > 0),
        None => {
            if group && !silent { println!("Task {} is not part of a series; removing it alone.", id); }
            delete_task(id)
        }
    };
    match result {
        Ok(true) => {
            if !silent {
                match group_id {
                    Some(_) => println!("Series of task {} removed.", id),
                    None => println!("Task {} removed.", id),
                }
            }
            true
        }
        Ok(false) => {
            if !silent { eprintln!("Task {} not found.", id); }
            false
        }
        Err(e) => {
            if !silent { eprintln!("Failed to save tasks: {}", e); }
            false
        }
    }
}

/// Changes to apply to an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// An empty string clears the time.
    pub time: Option<String>,
    pub priority: Option<String>,
    pub kind: Option<String>,
    pub color: Option<String>,
}

fn apply_edit(t: &mut Task, edit: &TaskEdit, config: &Config) -> Result<()> {
    if let Some(title) = &edit.title {
        t.title = title.trim().to_string();
    }
    if let Some(d) = &edit.description {
        t.description = Some(d.trim().to_string()).filter(|d| !d.is_empty());
    }
    if let Some(k) = &edit.kind {
        t.kind = k.parse()?;
    }
    if let Some(s) = &edit.start {
        let new_start = parse_date(s)?;
        // Moving the start keeps the length unless an end is given too.
        let length = t.end - t.start;
        t.start = new_start;
        t.end = new_start + length;
    }
    if let Some(e) = &edit.end {
        t.end = parse_date(e)?;
    }
    t.normalize_dates();
    if let Some(time) = &edit.time {
        t.time = if time.trim().is_empty() { None } else { Some(parse_time(time)?) };
    }
    if let Some(p) = &edit.priority {
        t.priority = p.parse()?;
    }
    if let Some(c) = &edit.color {
        t.color = config.resolve_color(Some(c))?;
    }
    t.validate()
}

/// Edits an existing task's details.
pub fn cmd_edit(id: u64, edit: TaskEdit, config: &Config, silent: bool) -> bool {
    let Some(mut t) = load_task(id) else {
        if !silent { eprintln!("Task {} not found.", id); }
        return false;
    };
    if let Err(e) = apply_edit(&mut t, &edit, config) {
        if !silent { eprintln!("{}", e); }
        return false;
    }
    if let Err(e) = save_task(&t) {
        if !silent { eprintln!("Failed to save tasks: {}", e); }
        return false;
    }
    if !silent { println!("Task {} updated.", id); }
    true
}

/// Appends a subtask to a task.
pub fn cmd_subtask_add(id: u64, title: String, silent: bool) -> bool {
    let title = title.trim().to_string();
    if title.is_empty() {
        if !silent { eprintln!("Subtask title must not be empty."); }
        return false;
    }
    update_subtasks(id, silent, |subtasks| {
        subtasks.push(Subtask { title, completed: false });
        Ok(())
    })
}

/// Flips the completion flag of the subtask at 1-based `index`.
pub fn cmd_subtask_toggle(id: u64, index: usize, silent: bool) -> bool {
    update_subtasks(id, silent, |subtasks| {
        let s = subtask_at(subtasks, index)?;
        s.completed = !s.completed;
        Ok(())
    })
}

/// Removes the subtask at 1-based `index`.
pub fn cmd_subtask_remove(id: u64, index: usize, silent: bool) -> bool {
    update_subtasks(id, silent, |subtasks| {
        subtask_at(subtasks, index)?;
        subtasks.remove(index - 1);
        Ok(())
    })
}

fn subtask_at(subtasks: &mut [Subtask], index: usize) -> Result<&mut Subtask> {
    let len = subtasks.len();
    index.checked_sub(1)
        .and_then(|i| subtasks.get_mut(i))
        .ok_or_else(|| PlannerError::Invalid(format!("subtask {} does not exist (task has {})", index, len)))
}

fn update_subtasks<F>(id: u64, silent: bool, f: F) -> bool
where
    F: FnOnce(&mut Vec<Subtask>) -> Result<()>,
{
    let Some(mut t) = load_task(id) else {
        if !silent { eprintln!("Task {} not found.", id); }
        return false;
    };
    if let Err(e) = f(&mut t.subtasks) {
        if !silent { eprintln!("{}", e); }
        return false;
    }
    if let Err(e) = save_task(&t) {
        if !silent { eprintln!("Failed to save tasks: {}", e); }
        return false;
    }
    if !silent {
        let (done, total) = t.subtask_progress();
        println!("Task {} subtasks: {}/{} done.", id, done, total);
    }
    true
}

fn color_of(t: &Task) -> Color {
    let (r, g, b) = t.rgb();
    Color::Rgb { r, g, b }
}

fn date_range_label(t: &Task) -> String {
    if t.is_multi_day() {
        format!("{} → {}", t.start, t.end)
    } else {
        t.start.to_string()
    }
}

/// Which tasks `list` shows, by completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Pending,
    Done,
    All,
}

impl StatusFilter {
    pub fn matches(self, t: &Task) -> bool {
        match self {
            StatusFilter::Pending => !t.completed,
            StatusFilter::Done => t.completed,
            StatusFilter::All => true,
        }
    }
}

/// Tasks matching `filter`, limited to those covering `date` when given,
/// in listing order.
pub fn select_tasks(tasks: &[Task], filter: StatusFilter, date: Option<NaiveDate>) -> Vec<Task> {
    let mut selected: Vec<Task> = match date {
        Some(day) => tasks_on(tasks, day).into_iter().cloned().collect(),
        None => tasks.to_vec(),
    };
    selected.retain(|t| filter.matches(t));
    sort_for_listing(&mut selected);
    selected
}

/// Number of pending and completed tasks.
pub fn status_counts(tasks: &[Task]) -> (usize, usize) {
    let done = tasks.iter().filter(|t| t.completed).count();
    (tasks.len() - done, done)
}

/// Lists tasks in a formatted table, sorted by date.
///
/// `filter` picks pending, completed or all tasks. `date` restricts the list
/// to tasks covering that day. The footer counts both states.
pub fn cmd_list(filter: StatusFilter, date: Option<String>) {
    let day = match date.as_deref().map(parse_date).transpose() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let all_tasks = load_tasks();
    let in_range = select_tasks(&all_tasks, StatusFilter::All, day);
    let (pending, completed) = status_counts(&in_range);
    let tasks = select_tasks(&all_tasks, filter, day);
    if tasks.is_empty() {
        println!("No tasks found ({} pending, {} done).", pending, completed);
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Dates").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Kind").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Subtasks").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let today = Local::now().date_naive();

    for t in tasks {
        let overdue = !t.completed && t.end < today;
        let (done, total) = t.subtask_progress();
        let status = if t.completed { "Done" } else if overdue { "Overdue" } else { "Pending" };
        let status_color = if t.completed { Color::Green } else if overdue { Color::Red } else { Color::Yellow };
        let priority_color = match t.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
            Priority::Low => Color::Grey,
        };

        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.title).fg(color_of(&t)),
            Cell::new(date_range_label(&t)),
            Cell::new(t.time.map(|h| h.format("%H:%M").to_string()).unwrap_or_default()),
            Cell::new(t.kind),
            Cell::new(t.priority).fg(priority_color),
            Cell::new(if total == 0 { String::new() } else { format!("{}/{}", done, total) }),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
    println!("{} pending, {} done.", pending, completed);
}

/// Prints every field of one task.
pub fn cmd_show(id: u64) {
    let Some(t) = load_task(id) else {
        eprintln!("Task {} not found.", id);
        return;
    };
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.add_row(vec![Cell::new("Title").add_attribute(Attribute::Bold), Cell::new(&t.title).fg(color_of(&t))]);
    table.add_row(vec!["Description".to_string(), t.description.clone().unwrap_or_else(|| "-".into())]);
    table.add_row(vec!["Dates".to_string(), date_range_label(&t)]);
    table.add_row(vec!["Time".to_string(), t.time.map(|h| h.format("%H:%M").to_string()).unwrap_or_else(|| "-".into())]);
    table.add_row(vec!["Kind".to_string(), t.kind.to_string()]);
    table.add_row(vec!["Priority".to_string(), t.priority.to_string()]);
    table.add_row(vec!["Color".to_string(), t.color.clone()]);
    table.add_row(vec!["Status".to_string(), if t.completed { "Done".into() } else { "Pending".into() }]);
    if let Some(g) = &t.group_id {
        table.add_row(vec!["Series".to_string(), g.clone()]);
    }
    for (i, s) in t.subtasks.iter().enumerate() {
        let mark = if s.completed { "[x]" } else { "[ ]" };
        table.add_row(vec![format!("Subtask {}", i + 1), format!("{} {}", mark, s.title)]);
    }
    println!("{table}");
}

fn week_header(week: &WeekLayout) -> Vec<Cell> {
    (0..7)
        .map(|i| {
            let day = week.day(i);
            Cell::new(day.format("%a %d").to_string()).add_attribute(Attribute::Bold)
        })
        .collect()
}

/// Prints the week containing `date` (today by default) as a seven-column grid.
pub fn cmd_week(date: Option<String>) {
    let anchor = match date.as_deref().map(parse_date).transpose() {
        Ok(d) => d.unwrap_or_else(|| Local::now().date_naive()),
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let tasks = load_tasks();
    let week = layout_week(&tasks, anchor);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(week_header(&week));

    for (t, span) in &week.bars {
        let first = span.start_column as usize - 1;
        let last = first + span.span_columns as usize - 1;
        let row: Vec<Cell> = (0..7)
            .map(|col| {
                if col == first {
                    Cell::new(format!("▶ {}", t.title)).fg(color_of(t))
                } else if col > first && col <= last {
                    Cell::new("━━━━").fg(color_of(t))
                } else {
                    Cell::new("")
                }
            })
            .collect();
        table.add_row(row);
    }

    let slots: Vec<Cell> = week.days.iter()
        .map(|slot| {
            let lines: Vec<String> = slot.iter()
                .map(|t| {
                    let mark = if t.completed { "✓" } else { "•" };
                    match t.time {
                        Some(h) => format!("{} {} {}", mark, h.format("%H:%M"), t.title),
                        None => format!("{} {}", mark, t.title),
                    }
                })
                .collect();
            Cell::new(lines.join("\n"))
        })
        .collect();
    table.add_row(slots);

    println!("Week of {} - {}", week.week_start.format("%d %b %Y"), week.week_end.format("%d %b %Y"));
    println!("{table}");
}

/// Prints a month (`YYYY-MM`, current month by default) as a calendar grid.
pub fn cmd_month(month: Option<String>) {
    let (year, month) = match month {
        Some(m) => match parse_date(&format!("{}-01", m.trim())) {
            Ok(d) => (d.year(), d.month()),
            Err(_) => {
                eprintln!("Invalid month '{}'. Use YYYY-MM.", m);
                return;
            }
        },
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };
    let tasks = load_tasks();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
            .iter()
            .map(|d| Cell::new(d).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>());

    for (week_start, _) in month_weeks(year, month) {
        let week = layout_week(&tasks, week_start);
        let row: Vec<Cell> = (0..7)
            .map(|col| {
                let day = week.day(col);
                let mut lines = vec![day.day().to_string()];
                for (t, span) in &week.bars {
                    let first = span.start_column as usize - 1;
                    if col >= first && col < first + span.span_columns as usize {
                        lines.push(format!("▬ {}", truncate(&t.title, 12)));
                    }
                }
                let slot = &week.days[col];
                lines.extend(slot.iter().take(2).map(|t| format!("• {}", truncate(&t.title, 12))));
                if slot.len() > 2 {
                    lines.push(format!("+{} more", slot.len() - 2));
                }
                let cell = Cell::new(lines.join("\n"));
                if day.month() == month { cell } else { cell.fg(Color::DarkGrey) }
            })
            .collect();
        table.add_row(row);
    }

    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();
    println!("{}", title);
    println!("{table}");
}

/// Prints the current configuration.
pub fn cmd_config_show(config: &Config) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["theme".to_string(), config.theme.to_string()]);
    table.add_row(vec!["view".to_string(), config.default_view.to_string()]);
    table.add_row(vec!["color".to_string(), config.default_color.clone()]);
    let presets: Vec<String> = config.color_presets.iter()
        .enumerate()
        .map(|(i, c)| format!("{}: {}", i + 1, c))
        .collect();
    table.add_row(vec!["presets".to_string(), presets.join("\n")]);
    table.add_row(vec!["max-occurrences".to_string(), config.occurrence_limit().to_string()]);
    println!("{table}");
}

/// Changes one setting and writes the configuration file.
pub fn cmd_config_set(config: &mut Config, key: &str, value: &str, silent: bool) -> bool {
    if let Err(e) = config.set(key, value) {
        if !silent { eprintln!("{}", e); }
        return false;
    }
    if let Err(e) = config.save() {
        if !silent { eprintln!("Failed to save config: {}", e); }
        return false;
    }
    if !silent { println!("Setting '{}' updated.", key); }
    true
}

/// Resets the database by deleting all tasks.
pub fn cmd_reset(force: bool) {
    if !force {
        print!("Are you sure you want to delete all tasks? This cannot be undone. [y/N] ");
        let mut input = String::new();
        if io::stdout().flush().is_err() || io::stdin().read_line(&mut input).is_err() {
            eprintln!("Unable to read confirmation.");
            return;
        }
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }

    if let Err(e) = delete_database() {
        eprintln!("Failed to reset database: {}", e);
    } else {
        println!("Database reset successfully.");
    }
}
