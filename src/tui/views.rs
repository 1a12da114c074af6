//! The calendar views of the terminal UI.
//!
//! Every view implements [`CalendarView`]; the app keeps one boxed view and
//! swaps it when the user cycles views.

use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span as TextSpan},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use crate::config::{Theme, ViewKind};
use crate::layout::{layout_week, month_weeks, week_bounds, WeekLayout};
use crate::models::{truncate, Priority, Task};

/// Colors derived from the configured theme.
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub highlight_bg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Palette {
        match theme {
            Theme::Dark => Palette {
                fg: Color::Gray,
                bg: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                highlight_bg: Color::DarkGray,
            },
            Theme::Light => Palette {
                fg: Color::Black,
                bg: Color::White,
                muted: Color::Gray,
                accent: Color::Blue,
                highlight_bg: Color::Gray,
            },
        }
    }
}

/// What a view needs to draw itself.
pub struct ViewContext<'a> {
    /// Tasks inside the view's period, in display order.
    pub tasks: &'a [Task],
    pub anchor: NaiveDate,
    pub palette: &'a Palette,
    pub state: &'a mut TableState,
}

impl ViewContext<'_> {
    fn selected_id(&self) -> Option<u64> {
        self.state.selected().and_then(|i| self.tasks.get(i)).map(|t| t.id)
    }
}

pub trait CalendarView {
    fn kind(&self) -> ViewKind;

    /// Heading for the period around `anchor`.
    fn title(&self, anchor: NaiveDate) -> String;

    /// Inclusive date window shown around `anchor`; `None` shows everything.
    fn period(&self, anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)>;

    /// Moves `anchor` forward (positive) or back by whole periods.
    fn shift(&self, anchor: NaiveDate, steps: i32) -> NaiveDate;

    fn render(&self, f: &mut Frame, area: Rect, ctx: &mut ViewContext);
}

/// Returns the view implementing `kind`.
pub fn view_for(kind: ViewKind) -> Box<dyn CalendarView> {
    match kind {
        ViewKind::List => Box::new(ListView),
        ViewKind::Week => Box::new(WeekView),
        ViewKind::Month => Box::new(MonthView),
    }
}

fn task_color(t: &Task) -> Color {
    let (r, g, b) = t.rgb();
    Color::Rgb(r, g, b)
}

fn task_style(t: &Task, selected: bool) -> Style {
    let mut style = Style::default().fg(task_color(t));
    if t.completed {
        style = style.add_modifier(Modifier::CROSSED_OUT | Modifier::DIM);
    }
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

pub struct ListView;

impl CalendarView for ListView {
    fn kind(&self) -> ViewKind {
        ViewKind::List
    }

    fn title(&self, _anchor: NaiveDate) -> String {
        "All tasks".to_string()
    }

    fn period(&self, _anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        None
    }

    fn shift(&self, anchor: NaiveDate, _steps: i32) -> NaiveDate {
        anchor
    }

    fn render(&self, f: &mut Frame, area: Rect, ctx: &mut ViewContext) {
        let today = Local::now().date_naive();
        let rows: Vec<Row> = ctx.tasks
            .iter()
            .map(|t| {
                let dates = if t.is_multi_day() {
                    format!("{} → {}", t.start, t.end)
                } else {
                    t.start.to_string()
                };
                let (done, total) = t.subtask_progress();
                let status = if t.completed {
                    "Done"
                } else if t.end < today {
                    "Overdue"
                } else {
                    "Pending"
                };
                let priority_style = match t.priority {
                    Priority::High => Style::default().fg(Color::Red),
                    Priority::Medium => Style::default().fg(Color::Yellow),
                    Priority::Low => Style::default().fg(ctx.palette.muted),
                };

                Row::new(vec![
                    Cell::from(t.id.to_string()),
                    Cell::from(t.title.clone()).style(task_style(t, false)),
                    Cell::from(dates),
                    Cell::from(t.time.map(|h| h.format("%H:%M").to_string()).unwrap_or_default()),
                    Cell::from(t.kind.to_string()),
                    Cell::from(t.priority.to_string()).style(priority_style),
                    Cell::from(if total == 0 { String::new() } else { format!("{}/{}", done, total) }),
                    Cell::from(status),
                ]).style(Style::default().fg(ctx.palette.fg))
            })
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Min(20),
            Constraint::Length(25),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
        ];

        let table = Table::new(rows, widths)
            .header(Row::new(vec!["ID", "Title", "Dates", "Time", "Kind", "Priority", "Subtasks", "Status"])
                .style(Style::default().fg(ctx.palette.accent).add_modifier(Modifier::BOLD))
                .bottom_margin(1))
            .block(Block::default().borders(Borders::ALL).title(self.title(ctx.anchor)))
            .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(ctx.palette.highlight_bg))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut *ctx.state);
    }
}

/// Lines of one day column: the bars crossing it, then its own tasks.
fn day_lines<'a>(week: &WeekLayout<'a>, col: usize, width: usize, selected: Option<u64>, max_slots: usize) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for (t, span) in &week.bars {
        let first = span.start_column as usize - 1;
        let last = first + span.span_columns as usize - 1;
        if col < first || col > last {
            continue;
        }
        let text = if col == first {
            format!("▶ {}", truncate(&t.title, width.saturating_sub(2)))
        } else {
            "━".repeat(width.max(1))
        };
        lines.push(Line::from(TextSpan::styled(text, task_style(t, selected == Some(t.id)))));
    }
    let slot = &week.days[col];
    for t in slot.iter().take(max_slots) {
        let text = match t.time {
            Some(h) => format!("{} {}", h.format("%H:%M"), t.title),
            None => format!("• {}", t.title),
        };
        lines.push(Line::from(TextSpan::styled(truncate(&text, width), task_style(t, selected == Some(t.id)))));
    }
    if slot.len() > max_slots {
        lines.push(Line::from(format!("+{} more", slot.len() - max_slots)));
    }
    lines
}

fn seven_columns(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 7); 7].as_ref())
        .split(area)
        .to_vec()
}

pub struct WeekView;

impl CalendarView for WeekView {
    fn kind(&self) -> ViewKind {
        ViewKind::Week
    }

    fn title(&self, anchor: NaiveDate) -> String {
        let (monday, sunday) = week_bounds(anchor);
        format!("Week of {} - {}", monday.format("%d %b"), sunday.format("%d %b %Y"))
    }

    fn period(&self, anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        Some(week_bounds(anchor))
    }

    fn shift(&self, anchor: NaiveDate, steps: i32) -> NaiveDate {
        anchor + Duration::weeks(steps as i64)
    }

    fn render(&self, f: &mut Frame, area: Rect, ctx: &mut ViewContext) {
        let block = Block::default().borders(Borders::ALL).title(self.title(ctx.anchor));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let today = Local::now().date_naive();
        let selected = ctx.selected_id();
        let week = layout_week(ctx.tasks, ctx.anchor);
        for (col, cell) in seven_columns(inner).into_iter().enumerate() {
            let day = week.day(col);
            let title_style = if day == today {
                Style::default().fg(ctx.palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(ctx.palette.fg)
            };
            let width = cell.width.saturating_sub(2) as usize;
            let lines = day_lines(&week, col, width, selected, usize::MAX);
            let p = Paragraph::new(lines)
                .block(Block::default()
                    .borders(Borders::ALL)
                    .title(TextSpan::styled(day.format("%a %d").to_string(), title_style)));
            f.render_widget(p, cell);
        }
    }
}

pub struct MonthView;

impl MonthView {
    fn weeks(anchor: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
        month_weeks(anchor.year(), anchor.month())
    }
}

impl CalendarView for MonthView {
    fn kind(&self) -> ViewKind {
        ViewKind::Month
    }

    fn title(&self, anchor: NaiveDate) -> String {
        anchor.format("%B %Y").to_string()
    }

    fn period(&self, anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let weeks = Self::weeks(anchor);
        Some((weeks.first()?.0, weeks.last()?.1))
    }

    fn shift(&self, anchor: NaiveDate, steps: i32) -> NaiveDate {
        let first = anchor.with_day(1).unwrap_or(anchor);
        let months = Months::new(steps.unsigned_abs());
        let moved = if steps >= 0 {
            first.checked_add_months(months)
        } else {
            first.checked_sub_months(months)
        };
        moved.unwrap_or(first)
    }

    fn render(&self, f: &mut Frame, area: Rect, ctx: &mut ViewContext) {
        let block = Block::default().borders(Borders::ALL).title(self.title(ctx.anchor));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let weeks = Self::weeks(ctx.anchor);
        if weeks.is_empty() {
            return;
        }
        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(weeks.iter().map(|_| Constraint::Ratio(1, weeks.len() as u32)));
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let header_style = Style::default().fg(ctx.palette.accent).add_modifier(Modifier::BOLD);
        for (cell, name) in seven_columns(rows[0]).into_iter().zip(["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]) {
            f.render_widget(Paragraph::new(name).style(header_style), cell);
        }

        let today = Local::now().date_naive();
        let selected = ctx.selected_id();
        let month = ctx.anchor.month();
        for (row, (week_start, _)) in rows.iter().skip(1).zip(weeks) {
            let week = layout_week(ctx.tasks, week_start);
            for (col, cell) in seven_columns(*row).into_iter().enumerate() {
                let day = week.day(col);
                let day_style = if day == today {
                    Style::default().fg(ctx.palette.accent).add_modifier(Modifier::BOLD)
                } else if day.month() == month {
                    Style::default().fg(ctx.palette.fg)
                } else {
                    Style::default().fg(ctx.palette.muted)
                };
                let width = cell.width.saturating_sub(2) as usize;
                let lines = day_lines(&week, col, width, selected, 2);
                let p = Paragraph::new(lines)
                    .block(Block::default()
                        .borders(Borders::ALL)
                        .title(TextSpan::styled(day.day().to_string(), day_style)));
                f.render_widget(p, cell);
            }
        }
    }
}
