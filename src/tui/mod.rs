pub mod app;
pub mod ui;
pub mod views;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use crate::config::Config;
use app::{App, InputMode, InputField};
use ui::ui;

pub fn run_tui(config: Config) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(config);

    // Run loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("TUI loop failed: {}", err);
        println!("{:?}", err)
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match app.input_mode {
                InputMode::Normal => {
                    app.status = None;
                    match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Down | KeyCode::Char('j') => app.next(),
                        KeyCode::Up | KeyCode::Char('k') => app.previous(),
                        KeyCode::Char(' ') => app.toggle_selected(),
                        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(false),
                        KeyCode::Char('D') => app.delete_selected(true),
                        KeyCode::Char('a') => app.start_add(),
                        KeyCode::Char('n') => app.start_edit(InputField::Title),
                        KeyCode::Char('t') => app.start_edit(InputField::Start),
                        KeyCode::Char('h') => app.start_edit(InputField::Time),
                        KeyCode::Char('p') => app.start_edit(InputField::Priority),
                        KeyCode::Char('o') => app.start_edit(InputField::Color),
                        KeyCode::Char('s') => app.start_edit(InputField::Subtask),
                        KeyCode::Char('c') => app.toggle_completed(),
                        KeyCode::Char('v') => app.cycle_view(),
                        KeyCode::Char('[') | KeyCode::Left => app.shift_period(-1),
                        KeyCode::Char(']') | KeyCode::Right => app.shift_period(1),
                        KeyCode::Char('g') => app.go_today(),
                        KeyCode::Char('T') => app.toggle_theme(),
                        _ => {}
                    }
                }
                InputMode::Editing | InputMode::Adding => match key.code {
                    KeyCode::Enter => app.handle_input(),
                    KeyCode::Esc => app.cancel_input(),
                    KeyCode::Char(c) => {
                        app.input_buffer.push(c);
                    }
                    KeyCode::Backspace => {
                        app.input_buffer.pop();
                    }
                    _ => {}
                }
            }
        }
    }
}
