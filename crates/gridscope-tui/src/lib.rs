// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use gridscope_app::{
    DatasetStatus, DetailPayload, DetailStatus, DetailTicket, GridCommand, GridEvent, GridState,
    Row, RowKey, Selection,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table, Wrap};
use std::io;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const HALF_PAGE_ROWS: isize = 10;
const FULL_PAGE_ROWS: isize = 20;
const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SELECTED_MARK: &str = "●";
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

/// Completions posted back to the UI loop by fetch workers and timers.
#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    DatasetFetched(Result<Vec<Row>, String>),
    DetailFetched {
        ticket: DetailTicket,
        outcome: Result<DetailPayload, String>,
    },
}

/// Data and detail collaborators the grid talks to.
///
/// The `spawn_*` defaults run the fetch inline and post the outcome on the
/// channel; runtimes backed by slow I/O override them to run off the UI
/// thread. Either way the outcome only reaches [`GridState`] when the loop
/// drains the channel.
pub trait GridRuntime {
    fn fetch_grid_data(&mut self) -> Result<Vec<Row>>;
    fn fetch_item_details(&mut self, key: &RowKey) -> Result<DetailPayload>;
    fn spawn_grid_data(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self
            .fetch_grid_data()
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::DatasetFetched(outcome))
            .map_err(|_| anyhow!("grid event channel closed"))?;
        Ok(())
    }
    fn spawn_item_details(&mut self, ticket: DetailTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self
            .fetch_item_details(&ticket.key)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::DetailFetched { ticket, outcome })
            .map_err(|_| anyhow!("detail event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Grid,
    Filter,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    focus: Focus,
    cursor: usize,
    spinner_frame: usize,
    help_visible: bool,
    status_token: u64,
}

pub fn run_app<R: GridRuntime>(state: &mut GridState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    dispatch_and_spawn(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        GridCommand::LoadDataset,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);
        view_data.spinner_frame = view_data.spinner_frame.wrapping_add(1);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut GridState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        let command = match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(GridCommand::ClearStatus);
                continue;
            }
            InternalEvent::ClearStatus { .. } => continue,
            InternalEvent::DatasetFetched(Ok(rows)) => GridCommand::DatasetLoaded(rows),
            InternalEvent::DatasetFetched(Err(error)) => GridCommand::DatasetFailed(error),
            InternalEvent::DetailFetched { ticket, outcome } => {
                GridCommand::DetailResolved { ticket, outcome }
            }
        };
        let events = state.dispatch(command);
        observe_events(state, view_data, tx, &events);
    }
}

/// Dispatches `command` and starts whatever fetch the resulting events ask for.
fn dispatch_and_spawn<R: GridRuntime>(
    state: &mut GridState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: GridCommand,
) {
    let events = state.dispatch(command);
    observe_events(state, view_data, tx, &events);

    for event in events {
        match event {
            GridEvent::DatasetRequested => {
                if let Err(error) = runtime.spawn_grid_data(tx.clone()) {
                    let follow_up = state.dispatch(GridCommand::DatasetFailed(format!("{error:#}")));
                    observe_events(state, view_data, tx, &follow_up);
                }
            }
            GridEvent::DetailRequested(ticket) => {
                if let Err(error) = runtime.spawn_item_details(ticket.clone(), tx.clone()) {
                    let follow_up = state.dispatch(GridCommand::DetailResolved {
                        ticket,
                        outcome: Err(format!("{error:#}")),
                    });
                    observe_events(state, view_data, tx, &follow_up);
                }
            }
            _ => {}
        }
    }
}

fn observe_events(
    state: &GridState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: &[GridEvent],
) {
    for event in events {
        match event {
            GridEvent::DatasetRequested => info!("loading grid rows"),
            GridEvent::DatasetAlreadyLoading => debug!("grid rows already loading"),
            GridEvent::DatasetReady { rows } => info!(rows, "grid rows loaded"),
            GridEvent::DatasetFailed(error) => warn!(%error, "grid rows failed to load"),
            GridEvent::FilterChanged(text) => {
                debug!(filter = %text, "filter changed");
                view_data.cursor = 0;
            }
            GridEvent::SelectionChanged(selection) => {
                debug!(keys = ?selection.keys(), "selection changed");
            }
            GridEvent::SelectionCleared => debug!("selection cleared"),
            GridEvent::DetailRequested(ticket) => debug!(
                key = %ticket.key,
                request_id = ticket.request_id.get(),
                "detail fetch issued"
            ),
            GridEvent::DetailLoaded(key) => debug!(key = %key, "detail loaded"),
            GridEvent::DetailFailed { key, error } => {
                warn!(key = %key, %error, "detail fetch failed");
            }
            GridEvent::StaleDetailDiscarded(ticket) => debug!(
                key = %ticket.key,
                request_id = ticket.request_id.get(),
                "discarded stale detail response"
            ),
            GridEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            GridEvent::StatusCleared => {}
        }
    }
    clamp_cursor(state, view_data);
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut GridState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    let events = state.dispatch(GridCommand::SetStatus(message.into()));
    observe_events(state, view_data, internal_tx, &events);
}

fn handle_key_event<R: GridRuntime>(
    state: &mut GridState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.focus == Focus::Filter {
        handle_filter_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('/'), _) => {
            view_data.focus = Focus::Filter;
        }
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            move_cursor(state, view_data, 1);
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            move_cursor(state, view_data, -1);
        }
        (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
            move_cursor(state, view_data, HALF_PAGE_ROWS);
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
            move_cursor(state, view_data, -HALF_PAGE_ROWS);
        }
        (KeyCode::PageDown, _) => move_cursor(state, view_data, FULL_PAGE_ROWS),
        (KeyCode::PageUp, _) => move_cursor(state, view_data, -FULL_PAGE_ROWS),
        (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
            view_data.cursor = 0;
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            view_data.cursor = usize::MAX;
            clamp_cursor(state, view_data);
        }
        (KeyCode::Enter, _) | (KeyCode::Char(' '), KeyModifiers::NONE) => {
            select_cursor_row(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Esc, _) => {
            if !state.selection().is_empty() {
                dispatch_and_spawn(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    GridCommand::Select(Selection::empty()),
                );
            } else if !state.filter_text().is_empty() {
                dispatch_and_spawn(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    GridCommand::ClearFilter,
                );
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            dispatch_and_spawn(
                state,
                runtime,
                view_data,
                internal_tx,
                GridCommand::LoadDataset,
            );
        }
        _ => {}
    }
    false
}

fn handle_filter_key<R: GridRuntime>(
    state: &mut GridState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Enter, _) => {
            view_data.focus = Focus::Grid;
            return;
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => GridCommand::ClearFilter,
        (KeyCode::Backspace, _) => GridCommand::PopFilterChar,
        (KeyCode::Char(ch), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            GridCommand::PushFilterChar(ch)
        }
        _ => return,
    };
    dispatch_and_spawn(state, runtime, view_data, internal_tx, command);
}

fn select_cursor_row<R: GridRuntime>(
    state: &mut GridState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let key = state
        .filtered_rows()
        .get(view_data.cursor)
        .map(|row| row.key.clone());
    match key {
        Some(key) => dispatch_and_spawn(
            state,
            runtime,
            view_data,
            internal_tx,
            GridCommand::Select(Selection::single(key)),
        ),
        None => emit_status(state, view_data, internal_tx, "no row to select"),
    }
}

fn move_cursor(state: &GridState, view_data: &mut ViewData, delta: isize) {
    let next = view_data.cursor.saturating_add_signed(delta);
    view_data.cursor = next;
    clamp_cursor(state, view_data);
}

fn clamp_cursor(state: &GridState, view_data: &mut ViewData) {
    let len = state.filtered_rows().len();
    view_data.cursor = view_data.cursor.min(len.saturating_sub(1));
}

/// Row range to draw so the cursor stays on screen.
fn visible_window(cursor: usize, total: usize, height: usize) -> Range<usize> {
    if height == 0 || total == 0 {
        return 0..0;
    }
    let start = if cursor >= height {
        cursor + 1 - height
    } else {
        0
    };
    start..(start + height).min(total)
}

fn render(frame: &mut ratatui::Frame<'_>, state: &GridState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let filter_style = if view_data.focus == Focus::Filter {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let filter = Paragraph::new(filter_input_text(state, view_data))
        .style(filter_style)
        .block(
            Block::default()
                .title("gridscope · filter")
                .borders(Borders::ALL),
        );
    frame.render_widget(filter, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(layout[1]);
    render_grid(frame, body[0], state, view_data);
    render_details(frame, body[1], state, view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[2]);

    if view_data.help_visible {
        let area = centered_rect(64, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn filter_input_text(state: &GridState, view_data: &ViewData) -> String {
    match view_data.focus {
        Focus::Filter => format!("{}▏", state.filter_text()),
        Focus::Grid if state.filter_text().is_empty() => "press / to filter".to_owned(),
        Focus::Grid => state.filter_text().to_owned(),
    }
}

fn render_grid(frame: &mut ratatui::Frame<'_>, area: Rect, state: &GridState, view_data: &ViewData) {
    let rows = state.filtered_rows();
    let title = grid_title(state, rows.len());

    if let Some(message) = grid_empty_text(state, rows.len()) {
        let empty = Paragraph::new(message)
            .wrap(Wrap { trim: true })
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let columns = state.columns();
    let mut widths = vec![Constraint::Length(1)];
    widths.extend(std::iter::repeat_n(Constraint::Fill(1), columns.len()));

    let header_cells = std::iter::once(Cell::from(""))
        .chain(columns.iter().map(|column| Cell::from(column.as_str())))
        .map(|cell| {
            cell.style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = TableRow::new(header_cells);

    // Borders plus the header row.
    let body_height = usize::from(area.height.saturating_sub(3));
    let window = visible_window(view_data.cursor, rows.len(), body_height);
    let table_rows = rows[window.clone()]
        .iter()
        .zip(window)
        .map(|(row, index)| {
            let selected = state.selection().contains(&row.key);
            let mut style = Style::default();
            if selected {
                style = style.fg(Color::Green);
            }
            if index == view_data.cursor {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            let marker = if selected { SELECTED_MARK } else { "" };
            let cells = std::iter::once(Cell::from(marker)).chain(
                columns
                    .iter()
                    .map(|column| Cell::from(row.cell(column).unwrap_or_default())),
            );
            TableRow::new(cells).style(style)
        });

    let table = Table::new(table_rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn grid_title(state: &GridState, shown: usize) -> String {
    let total = state.dataset().len();
    if state.filter_text().is_empty() {
        format!("rows {total}")
    } else {
        format!("rows {shown}/{total} · filter \"{}\"", state.filter_text())
    }
}

/// Placeholder shown instead of the table, if any.
fn grid_empty_text(state: &GridState, shown: usize) -> Option<String> {
    if shown > 0 {
        return None;
    }
    let message = match state.dataset_status() {
        DatasetStatus::Pending => "waiting for data".to_owned(),
        DatasetStatus::Loading => "loading rows…".to_owned(),
        DatasetStatus::Failed(error) => format!("load failed: {error}\npress r to retry"),
        DatasetStatus::Ready if state.dataset().is_empty() => "no rows".to_owned(),
        DatasetStatus::Ready => format!("no rows match \"{}\"", state.filter_text()),
    };
    Some(message)
}

fn render_details(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &GridState,
    view_data: &ViewData,
) {
    let title = match state.detail() {
        DetailStatus::Idle => "details".to_owned(),
        DetailStatus::Loading { ticket } => format!("details · {}", ticket.key),
        DetailStatus::Loaded { key, .. } | DetailStatus::Failed { key, .. } => {
            format!("details · {key}")
        }
    };
    let style = match state.detail() {
        DetailStatus::Failed { .. } => Style::default().fg(Color::Red),
        DetailStatus::Loading { .. } => Style::default().fg(Color::Cyan),
        _ => Style::default(),
    };
    let details = Paragraph::new(details_text(state, view_data.spinner_frame))
        .style(style)
        .wrap(Wrap { trim: false })
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(details, area);
}

fn details_text(state: &GridState, spinner_frame: usize) -> String {
    match state.detail() {
        DetailStatus::Idle => "select a row (enter) to load details".to_owned(),
        DetailStatus::Loading { ticket } => {
            let spinner = SPINNER_FRAMES[spinner_frame % SPINNER_FRAMES.len()];
            format!("{spinner} loading details for {}…", ticket.key)
        }
        DetailStatus::Loaded { payload, .. } => {
            if payload.is_empty() {
                return "no details for this row".to_owned();
            }
            let width = payload
                .names()
                .map(|name| name.chars().count())
                .max()
                .unwrap_or(0);
            payload
                .iter()
                .map(|(name, value)| format!("{name:<width$}  {}", value.display()))
                .collect::<Vec<_>>()
                .join("\n")
        }
        DetailStatus::Failed { error, .. } => {
            format!("details failed: {error}\nselect the row again to retry")
        }
    }
}

fn status_text(state: &GridState, view_data: &ViewData) -> String {
    let focus = match view_data.focus {
        Focus::Grid => "GRID",
        Focus::Filter => "FILTER",
    };
    let keys = match view_data.focus {
        Focus::Grid => "j/k g/G pg | enter select | esc clear | / filter | r reload | ? help | q",
        Focus::Filter => "type to filter | backspace | ctrl+u clear | enter/esc done",
    };
    match &state.status_line {
        Some(status) => format!("{focus} | {status} | {keys}"),
        None => format!("{focus} | {keys}"),
    }
}

fn help_overlay_text() -> &'static str {
    "grid: j/k or arrows move | ctrl+d/ctrl+u half page | pgup/pgdn page\n\
grid: g/G first/last | enter or space select | esc deselect, then clear filter\n\
grid: / edit filter | r reload rows | q or ctrl+q quit\n\
filter: type to match any column (case-sensitive) | backspace | ctrl+u clear\n\
filter: enter or esc back to grid\n\
? or esc closes this help"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
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
