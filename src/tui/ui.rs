use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use super::app::{AddStep, App, InputField, InputMode};
use super::views::{Palette, ViewContext};

pub fn ui(f: &mut Frame, app: &mut App) {
    let palette = Palette::for_theme(app.config.theme);
    f.render_widget(Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)), f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // View
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    let mut ctx = ViewContext {
        tasks: &app.tasks,
        anchor: app.anchor,
        palette: &palette,
        state: &mut app.state,
    };
    app.view.render(f, chunks[0], &mut ctx);

    let help_text = match app.input_mode {
        InputMode::Normal => match &app.status {
            Some(status) => status.clone(),
            None => "q: Quit | a: Add | Space: Done | d/D: Del task/series | n: Title | t: Date | h: Time | p: Prio | o: Color | s: Subtask | c: Show done | v: View | [ ]: Prev/Next | g: Today | T: Theme".to_string(),
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel".to_string(),
        InputMode::Adding => "Enter: Next Step (empty keeps the default) | Esc: Cancel".to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(palette.muted))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    // Render Input Box if needed
    if app.input_mode == InputMode::Normal {
        return;
    }
    let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
    f.render_widget(Clear, area); // Clear the area first

    let title = match app.input_mode {
        InputMode::Adding => match app.add_state.step {
            AddStep::Title => "Add Task: Enter Title".to_string(),
            AddStep::Start => format!("Add Task: Start Date (YYYY-MM-DD, default {})", app.anchor),
            AddStep::Kind => "Add Task: Kind (daily, weekly, custom)".to_string(),
            AddStep::End => "Add Task: End Date (YYYY-MM-DD)".to_string(),
            AddStep::Priority => "Add Task: Priority (low, medium, high)".to_string(),
            AddStep::Color => {
                let presets: Vec<String> = app.config.color_presets.iter()
                    .enumerate()
                    .map(|(i, c)| format!("{}={}", i + 1, c))
                    .collect();
                format!("Add Task: Color (#rrggbb or {})", presets.join(" "))
            }
            AddStep::Frequency => "Add Task: Repeat (daily, weekly, monthly, yearly; empty for none)".to_string(),
            AddStep::Weekdays => "Add Task: Weekdays (e.g. mon,wed)".to_string(),
            AddStep::RecurEnd => "Add Task: Repeat Count or End Date".to_string(),
        },
        InputMode::Editing => match app.input_field {
            InputField::Title => "Edit Title",
            InputField::Start => "Edit Start Date (YYYY-MM-DD)",
            InputField::Time => "Edit Time (HH:MM, empty clears)",
            InputField::Priority => "Edit Priority",
            InputField::Color => "Edit Color (#rrggbb or preset number)",
            InputField::Subtask => "Add Subtask",
            InputField::None => "Edit",
        }.to_string(),
        InputMode::Normal => String::new(),
    };

    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(input, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
