//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which owns the session, handles
//! key presses, applies reminder ticks and renders the task list, the add
//! form, the reminder editor and the alerts panel.

use std::io;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::kv::KeyValueStore;
use crate::notify::Inbox;
use crate::session::Session;
use crate::tui::colors::{ACCENT, ALERT, DONE, ERROR};
use crate::tui::enums::{AppState, FormField};
use crate::tui::input::InputField;
use crate::when::{format_reminder_absolute, format_reminder_relative, parse_reminder_input};

/// Format used to prefill the reminder editor; accepted back by the parser.
const EDIT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Main application state for the terminal user interface.
pub struct App<S> {
    session: Session<S, Inbox>,
    state: AppState,
    table_state: TableState,
    text_input: InputField,
    reminder_input: InputField,
    active_field: FormField,
    status_message: String,
    status_is_error: bool,
    timestamp_format: String,
    should_quit: bool,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(session: Session<S, Inbox>, timestamp_format: impl Into<String>) -> Self {
        let mut table_state = TableState::default();
        if !session.tasks().is_empty() {
            table_state.select(Some(0));
        }
        App {
            session,
            state: AppState::TaskList,
            table_state,
            text_input: InputField::new(),
            reminder_input: InputField::new(),
            active_field: FormField::Text,
            status_message: String::new(),
            status_is_error: false,
            timestamp_format: timestamp_format.into(),
            should_quit: false,
        }
    }

    pub fn session(&self) -> &Session<S, Inbox> {
        &self.session
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Id of the highlighted task.
    pub fn selected_id(&self) -> Option<u64> {
        let idx = self.table_state.selected()?;
        self.session.tasks().get(idx).map(|t| t.id)
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_is_error = false;
    }

    fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_is_error = true;
    }

    /// Keep the selection inside the list after it changes size.
    fn clamp_selection(&mut self) {
        let len = self.session.tasks().len();
        match self.table_state.selected() {
            _ if len == 0 => self.table_state.select(None),
            Some(i) if i >= len => self.table_state.select(Some(len - 1)),
            None => self.table_state.select(Some(0)),
            Some(_) => {}
        }
    }

    /// Run a reminder check and surface any new notifications.
    pub fn on_tick(&mut self, now: DateTime<Utc>) {
        self.session.tick(now);
        let fresh = self.session.notifier_mut().drain();
        if let Some(last) = fresh.last() {
            let msg = if fresh.len() == 1 {
                format!("{}: {}", last.title, last.body)
            } else {
                format!("{}: {} tasks are due", last.title, fresh.len())
            };
            self.set_status(msg);
        }
    }

    /// Dispatch a key press to the handler for the current screen.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.state {
            AppState::TaskList => self.handle_list_key(key.code),
            AppState::AddTask => self.handle_form_key(key.code),
            AppState::EditReminder => self.handle_reminder_key(key.code),
            AppState::Help => self.state = AppState::TaskList,
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) {
        self.status_message.clear();
        let len = self.session.tasks().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(i) = self.table_state.selected() {
                    self.table_state.select(Some(i.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(i) = self.table_state.selected() {
                    if i + 1 < len {
                        self.table_state.select(Some(i + 1));
                    }
                }
            }
            KeyCode::Char('a') => {
                self.text_input.clear();
                self.reminder_input.clear();
                self.active_field = FormField::Text;
                self.state = AppState::AddTask;
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.selected_id() {
                    self.session.toggle_complete(id);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.session.delete(id);
                    self.clamp_selection();
                    self.set_status("Task deleted");
                }
            }
            KeyCode::Char('r') => {
                if let Some(task) = self.selected_id().and_then(|id| self.session.get(id)) {
                    let current = task
                        .reminder
                        .map(|_| format_reminder_absolute(task.reminder, EDIT_FORMAT))
                        .unwrap_or_default();
                    self.reminder_input.set(&current);
                    self.state = AppState::EditReminder;
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    if self.session.dismiss(id) {
                        self.set_status("Reminder dismissed");
                    } else {
                        self.set_status("No active reminder on this task");
                    }
                }
            }
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.state = AppState::TaskList;
                self.status_message.clear();
            }
            KeyCode::Tab | KeyCode::BackTab => self.active_field = self.active_field.toggle(),
            KeyCode::Enter => self.submit_new_task(),
            code => {
                let field = match self.active_field {
                    FormField::Text => &mut self.text_input,
                    FormField::Reminder => &mut self.reminder_input,
                };
                edit_field(field, code);
            }
        }
    }

    fn submit_new_task(&mut self) {
        let reminder = match parse_reminder_input(&self.reminder_input.value, Local::now()) {
            Ok(r) => r,
            Err(e) => {
                self.active_field = FormField::Reminder;
                self.set_error(e.to_string());
                return;
            }
        };
        match self.session.add(&self.text_input.value, reminder) {
            Some(id) => {
                debug!(id, "task added from form");
                self.table_state.select(Some(0));
                self.state = AppState::TaskList;
                self.set_status("Task added");
            }
            None if self.text_input.value.trim().is_empty() => {
                self.active_field = FormField::Text;
                self.set_error("Task text is empty");
            }
            None => self.set_error("No task ids left"),
        }
    }

    fn handle_reminder_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Enter => {
                let Some(id) = self.selected_id() else {
                    self.state = AppState::TaskList;
                    return;
                };
                match parse_reminder_input(&self.reminder_input.value, Local::now()) {
                    Ok(reminder) => {
                        self.session.set_reminder(id, reminder);
                        self.state = AppState::TaskList;
                        self.set_status(if reminder.is_some() {
                            "Reminder set"
                        } else {
                            "Reminder cleared"
                        });
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            code => edit_field(&mut self.reminder_input, code),
        }
    }

    /// Drain ticks, then wait up to `poll_timeout` for one key press.
    fn step(&mut self, ticks: &mut mpsc::Receiver<Instant>, poll_timeout: Duration) -> io::Result<()> {
        while ticks.try_recv().is_ok() {
            self.on_tick(Utc::now());
        }
        if event::poll(poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    /// Main event loop: render, apply ticks, handle input until quit.
    pub fn run<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        ticks: &mut mpsc::Receiver<Instant>,
        poll_timeout: Duration,
    ) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;
            self.step(ticks, poll_timeout)?;
        }
        Ok(())
    }

    fn render(&mut self, f: &mut Frame) {
        let alerting = self.session.alerting_tasks();
        let alerts_height = if alerting.is_empty() {
            0
        } else {
            alerting.len().min(5) as u16 + 2
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(alerts_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        if !alerting.is_empty() {
            let lines: Vec<Line> = alerting
                .iter()
                .map(|t| {
                    Line::from(vec![
                        Span::styled("⏰ ", Style::default().fg(ALERT)),
                        Span::raw(t.text.clone()),
                        Span::styled(
                            format!("  ({})", format_reminder_relative(t.reminder, Utc::now())),
                            Style::default().fg(Color::Gray),
                        ),
                    ])
                })
                .collect();
            let panel = Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(ALERT))
                    .title("Reminders - select and press 'x' to dismiss"),
            );
            f.render_widget(panel, chunks[1]);
        }
        self.render_task_list(f, chunks[2]);

        match self.state {
            AppState::TaskList => {}
            AppState::AddTask => self.render_add_form(f, chunks[2]),
            AppState::EditReminder => self.render_reminder_editor(f, chunks[2]),
            AppState::Help => render_help(f, chunks[2]),
        }
        self.render_status_bar(f, chunks[3]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let tasks = self.session.tasks();
        let open = tasks.iter().filter(|t| !t.completed).count();
        let header = Paragraph::new(Line::from(vec![
            Span::styled("TASKLET", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{open} open / {} total", tasks.len()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let tasks = self.session.tasks();
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Tasks - Press 'h' for help");

        if tasks.is_empty() {
            let empty = Paragraph::new("No tasks yet. Press 'a' to add one!")
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let now = Utc::now();
        let header = Row::new(["", "Task", "Reminder", "When"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(ACCENT).fg(Color::White));

        let rows: Vec<Row> = tasks
            .iter()
            .map(|t| {
                let alerting = self.session.is_alerting(t.id);
                let style = if t.completed {
                    Style::default().fg(DONE).add_modifier(Modifier::CROSSED_OUT)
                } else if alerting {
                    Style::default().fg(ALERT).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from(if t.completed { "[x]" } else { "[ ]" }),
                    Cell::from(t.text.clone()),
                    Cell::from(format_reminder_relative(t.reminder, now)),
                    Cell::from(format_reminder_absolute(t.reminder, &self.timestamp_format)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(18),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_add_form(&self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 9, area);
        f.render_widget(Clear, popup);
        let block = Block::default().borders(Borders::ALL).title("Add task (Tab to switch, Enter to save)");
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
            .split(inner);
        let fields = [
            (FormField::Text, "Task", &self.text_input, rows[0]),
            (FormField::Reminder, "Reminder (optional: in 10m, 18:30, 2026-05-04 09:00)", &self.reminder_input, rows[1]),
        ];
        for (field, title, input, rect) in fields {
            let active = self.active_field == field;
            let border = if active { Style::default().fg(Color::Yellow) } else { Style::default() };
            let widget = Paragraph::new(input.value.as_str())
                .block(Block::default().borders(Borders::ALL).border_style(border).title(title));
            f.render_widget(widget, rect);
            if active {
                f.set_cursor_position((rect.x + 1 + input.cursor as u16, rect.y + 1));
            }
        }
    }

    fn render_reminder_editor(&self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 3, area);
        f.render_widget(Clear, popup);
        let widget = Paragraph::new(self.reminder_input.value.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title("Reminder (empty to clear, Enter to save)"),
        );
        f.render_widget(widget, popup);
        f.set_cursor_position((popup.x + 1 + self.reminder_input.cursor as u16, popup.y + 1));
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if self.status_message.is_empty() {
            match self.state {
                AppState::TaskList => "a add | space done | d delete | r reminder | x dismiss | q quit".to_string(),
                AppState::AddTask => "Add task".to_string(),
                AppState::EditReminder => "Edit reminder".to_string(),
                AppState::Help => "Help - any key to return".to_string(),
            }
        } else {
            self.status_message.clone()
        };
        let bg = if self.status_is_error { ERROR } else { ACCENT };
        let status = Paragraph::new(text)
            .style(Style::default().bg(bg).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }
}

fn edit_field(field: &mut InputField, code: KeyCode) {
    match code {
        KeyCode::Char(c) => field.handle_char(c),
        KeyCode::Backspace => field.handle_backspace(),
        KeyCode::Delete => field.handle_delete(),
        KeyCode::Left => field.move_cursor_left(),
        KeyCode::Right => field.move_cursor_right(),
        _ => {}
    }
}

fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(50, 12, area);
    f.render_widget(Clear, popup);
    let lines = vec![
        Line::from("a         add a task"),
        Line::from("space     toggle done"),
        Line::from("d / Del   delete task"),
        Line::from("r         set or clear reminder"),
        Line::from("x         dismiss an active reminder"),
        Line::from("j/k, ↑/↓  move selection"),
        Line::from("h / ?     this help"),
        Line::from("q / Esc   quit"),
    ];
    let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, popup);
}

/// A rectangle `percent_x` wide and `height` rows tall, centered in `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
