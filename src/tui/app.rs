use chrono::{Local, NaiveDate};
use ratatui::widgets::TableState;
use crate::commands::{
    cmd_add, cmd_edit, cmd_remove, cmd_subtask_add, cmd_toggle, NewTask, RecurrenceArgs, TaskEdit,
};
use crate::config::{Config, Theme};
use crate::models::{sort_for_listing, Task, TaskKind};
use crate::storage::load_tasks;
use super::views::{view_for, CalendarView};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

pub enum InputField {
    None,
    Title,
    Start,
    Time,
    Priority,
    Color,
    Subtask,
}

/// Steps of the "Add Task" wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddStep {
    #[default]
    Title,
    Start,
    Kind,
    End,
    Priority,
    Color,
    Frequency,
    Weekdays,
    RecurEnd,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub step: AddStep,
    pub task: NewTask,
    pub recur: RecurrenceArgs,
}

pub struct App {
    /// Tasks inside the current view's period, in display order.
    pub tasks: Vec<Task>,
    pub config: Config,
    pub view: Box<dyn CalendarView>,
    /// Date the week and month views are centred on.
    pub anchor: NaiveDate,
    pub state: TableState,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<u64>,
    pub add_state: AddState,
    pub show_completed: bool,
    /// Last error or confirmation, shown in the help bar.
    pub status: Option<String>,
}

impl App {
    /// Creates a new App instance and loads initial data.
    pub fn new(config: Config) -> App {
        let view = view_for(config.default_view);
        let mut app = App {
            tasks: Vec::new(),
            config,
            view,
            anchor: Local::now().date_naive(),
            state: TableState::default(),
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            show_completed: false,
            status: None,
        };
        app.reload();
        app
    }

    /// Selects the next task.
    pub fn next(&mut self) {
        if self.tasks.is_empty() { return; }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.tasks.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous task.
    pub fn previous(&mut self) {
        if self.tasks.is_empty() { return; }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    self.tasks.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn selected_task(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Toggles completion of the currently selected task.
    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            if cmd_toggle(id, true).is_none() {
                self.status = Some(format!("Could not update task {}", id));
            }
            self.reload();
        }
    }

    /// Deletes the currently selected task, or its whole series.
    pub fn delete_selected(&mut self, whole_series: bool) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            if !cmd_remove(id, whole_series, true) {
                self.status = Some(format!("Could not delete task {}", id));
            }
            self.reload();
        }
    }

    /// Reloads tasks from storage, keeping those inside the current view's
    /// period, and refreshes the selection.
    pub fn reload(&mut self) {
        let mut tasks = load_tasks();
        if !self.show_completed {
            tasks.retain(|t| !t.completed);
        }
        if let Some((from, to)) = self.view.period(self.anchor) {
            tasks.retain(|t| t.start <= to && t.end >= from);
        }
        sort_for_listing(&mut tasks);
        self.tasks = tasks;

        if self.tasks.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.tasks.len() {
                self.state.select(Some(self.tasks.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    /// Cycles list -> week -> month and remembers the choice.
    pub fn cycle_view(&mut self) {
        let next = self.view.kind().next();
        self.view = view_for(next);
        self.config.default_view = next;
        self.save_config();
        self.state.select(None);
        self.reload();
    }

    /// Moves the week/month views by `steps` periods.
    pub fn shift_period(&mut self, steps: i32) {
        self.anchor = self.view.shift(self.anchor, steps);
        self.reload();
    }

    /// Jumps back to the period containing today.
    pub fn go_today(&mut self) {
        self.anchor = Local::now().date_naive();
        self.reload();
    }

    /// Switches between the light and dark theme.
    pub fn toggle_theme(&mut self) {
        self.config.theme = match self.config.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.save_config();
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config.save() {
            log::warn!("Unable to save config: {}", e);
            self.status = Some(format!("Config not saved: {}", e));
        }
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(t) = self.selected_task() else { return; };
        let id = t.id;
        let prefill = match field {
            InputField::Title => t.title.clone(),
            InputField::Start => t.start.to_string(),
            InputField::Time => t.time.map(|h| h.format("%H:%M").to_string()).unwrap_or_default(),
            InputField::Priority => t.priority.to_string(),
            InputField::Color => t.color.clone(),
            InputField::Subtask | InputField::None => String::new(),
        };
        self.target_id = Some(id);
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer = prefill;
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            _ => {}
        }
    }

    /// Leaves any input mode without saving.
    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    fn take_buffer(&mut self) -> Option<String> {
        let value = self.input_buffer.trim().to_string();
        self.input_buffer.clear();
        if value.is_empty() { None } else { Some(value) }
    }

    /// Handles input for the "Add Task" wizard.
    fn handle_adding_input(&mut self) {
        let value = self.take_buffer();
        let anchor = self.anchor;
        let add = &mut self.add_state;
        // `None` means the wizard is complete.
        let next = match add.step {
            AddStep::Title => {
                let Some(title) = value else { return; };
                add.task.title = title;
                Some(AddStep::Start)
            }
            AddStep::Start => {
                add.task.start = Some(value.unwrap_or_else(|| anchor.to_string()));
                Some(AddStep::Kind)
            }
            AddStep::Kind => {
                let custom = value.as_deref().is_some_and(|k| k.eq_ignore_ascii_case("custom"));
                add.task.kind = value;
                Some(if custom { AddStep::End } else { AddStep::Priority })
            }
            AddStep::End => {
                add.task.end = value;
                Some(AddStep::Priority)
            }
            AddStep::Priority => {
                add.task.priority = value;
                Some(AddStep::Color)
            }
            AddStep::Color => {
                add.task.color = value;
                Some(AddStep::Frequency)
            }
            AddStep::Frequency => match value {
                None => None,
                Some(freq) => {
                    let weekly = freq.eq_ignore_ascii_case("weekly");
                    add.recur.freq = Some(freq);
                    let weekly_kind = add.task.kind.as_deref()
                        .and_then(|k| k.parse::<TaskKind>().ok()) == Some(TaskKind::Weekly);
                    Some(if weekly && !weekly_kind { AddStep::Weekdays } else { AddStep::RecurEnd })
                }
            },
            AddStep::Weekdays => {
                add.recur.weekdays = value;
                Some(AddStep::RecurEnd)
            }
            AddStep::RecurEnd => {
                // A number is a repetition count, anything else an end date.
                match value {
                    Some(v) => match v.parse::<u32>() {
                        Ok(n) => add.recur.count = Some(n),
                        Err(_) => add.recur.until = Some(v),
                    },
                    None => add.recur.count = Some(1),
                }
                None
            }
        };
        match next {
            Some(step) => self.add_state.step = step,
            None => self.finish_add(),
        }
    }

    fn finish_add(&mut self) {
        let add = std::mem::take(&mut self.add_state);
        match cmd_add(add.task, add.recur, &self.config, true) {
            Some(ids) => self.status = Some(format!("{} task(s) added", ids.len())),
            None => self.status = Some("Task not added: check the values entered".to_string()),
        }
        self.input_mode = InputMode::Normal;
        self.reload();
    }

    /// Handles input for the "Edit Task" mode.
    fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id else { return; };
        let value = self.input_buffer.clone();
        let ok = match self.input_field {
            InputField::Title => cmd_edit(id, TaskEdit { title: Some(value), ..Default::default() }, &self.config, true),
            InputField::Start => cmd_edit(id, TaskEdit { start: Some(value), ..Default::default() }, &self.config, true),
            InputField::Time => cmd_edit(id, TaskEdit { time: Some(value), ..Default::default() }, &self.config, true),
            InputField::Priority => cmd_edit(id, TaskEdit { priority: Some(value), ..Default::default() }, &self.config, true),
            InputField::Color => cmd_edit(id, TaskEdit { color: Some(value), ..Default::default() }, &self.config, true),
            InputField::Subtask => cmd_subtask_add(id, value, true),
            InputField::None => true,
        };
        if !ok {
            self.status = Some(format!("Task {} not updated: invalid value", id));
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.reload();
    }
}
