// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use octofit_app::{
    ModalVisibility, Record, ResourceLabels, TableProjection, ViewCommand, ViewEvent, ViewState,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;

const HALF_PAGE_ROWS: isize = 10;
const FULL_PAGE_ROWS: isize = 20;
const ACTIONS_LABEL: &str = "actions";
const ACTIONS_CELL: &str = "view · details";

/// Shared flag tied to the view's lifetime. Workers check it before posting
/// results back.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Completed {
        request_id: u64,
        items: Vec<Record>,
        fetched_at: OffsetDateTime,
    },
    Failed {
        request_id: u64,
        error: String,
    },
}

impl FetchEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Completed { request_id, .. } | Self::Failed { request_id, .. } => *request_id,
        }
    }

    pub fn from_result(request_id: u64, result: Result<Vec<Record>>) -> Self {
        match result {
            Ok(items) => Self::Completed {
                request_id,
                items,
                fetched_at: OffsetDateTime::now_utc(),
            },
            Err(error) => Self::Failed {
                request_id,
                error: format!("{error:#}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Fetch(FetchEvent),
}

pub trait AppRuntime {
    fn endpoint(&self) -> String;
    fn fetch_records(&mut self) -> Result<Vec<Record>>;
    /// Runs the fetch and posts the outcome to `tx`. The default runs inline;
    /// runtimes backed by the network move the request to a worker thread.
    fn spawn_fetch(
        &mut self,
        request_id: u64,
        tx: Sender<InternalEvent>,
        cancel: CancelToken,
    ) -> Result<()> {
        let event = FetchEvent::from_result(request_id, self.fetch_records());
        if cancel.is_cancelled() {
            return Ok(());
        }
        tx.send(InternalEvent::Fetch(event))
            .map_err(|_| anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

/// Presentation settings that do not change while the view runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewOptions {
    pub labels: ResourceLabels,
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Default)]
struct ViewData {
    options: ViewOptions,
    endpoint: String,
    help_visible: bool,
    status_token: u64,
    cancel: CancelToken,
    /// Scroll offset of the table, carried between frames.
    table_state: TableState,
}

pub fn run_app<R: AppRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    options: ViewOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        endpoint: runtime.endpoint(),
        options,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    tracing::info!(endpoint = %view_data.endpoint, "view started");
    begin_fetch(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &mut view_data)) {
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

    view_data.cancel.cancel();
    tracing::info!("view closed");

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn begin_fetch<R: AppRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    state.dispatch(ViewCommand::BeginFetch);
    let Some(request_id) = state.pending_request_id() else {
        return;
    };

    tracing::debug!(request_id, endpoint = %view_data.endpoint, "fetch requested");
    if let Err(error) = runtime.spawn_fetch(request_id, internal_tx.clone(), view_data.cancel.clone())
    {
        apply_fetch_event(
            state,
            FetchEvent::Failed {
                request_id,
                error: format!("{error:#}"),
            },
        );
    }
}

fn process_internal_events(
    state: &mut ViewState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(ViewCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Fetch(event) => apply_fetch_event(state, event),
        }
    }
}

fn apply_fetch_event(state: &mut ViewState, event: FetchEvent) {
    let command = match event {
        FetchEvent::Completed {
            request_id,
            items,
            fetched_at,
        } => ViewCommand::CompleteFetch {
            request_id,
            items,
            fetched_at,
        },
        FetchEvent::Failed { request_id, error } => ViewCommand::FailFetch { request_id, error },
    };

    for event in state.dispatch(command) {
        match event {
            ViewEvent::FetchCompleted { request_id, count } => {
                tracing::info!(request_id, count, "fetch completed");
            }
            ViewEvent::FetchFailed { request_id, error } => {
                tracing::error!(request_id, %error, "fetch failed");
            }
            ViewEvent::StaleFetchDiscarded { request_id } => {
                tracing::debug!(request_id, "discarded response for superseded fetch");
            }
            _ => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut ViewState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch_with_status(
        state,
        view_data,
        internal_tx,
        ViewCommand::SetStatus(message.into()),
    );
}

/// Dispatches `command` and arms the status timer when it posted a message.
fn dispatch_with_status(
    state: &mut ViewState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: ViewCommand,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, ViewEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut ViewState,
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
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.modal.is_visible() {
        handle_modal_key(state, key);
        return false;
    }

    if state.filter_editing {
        handle_filter_key(state, view_data, internal_tx, key);
        return false;
    }

    if let Some(command) = table_command_for_key(key) {
        if state.table_visible() {
            state.dispatch(command);
        }
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return true,
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            begin_fetch(state, runtime, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, "refreshing");
        }
        (KeyCode::Char('v'), KeyModifiers::NONE) => {
            state.dispatch(ViewCommand::ViewAll);
        }
        (KeyCode::Char('/'), _) => {
            state.dispatch(ViewCommand::StartFilterEdit);
        }
        (KeyCode::Enter, _) if state.table_visible() => {
            dispatch_with_status(state, view_data, internal_tx, ViewCommand::ViewSelected);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) if state.table_visible() => {
            dispatch_with_status(state, view_data, internal_tx, ViewCommand::OpenDetails);
        }
        (KeyCode::Esc, _) if !state.query.is_empty() => {
            state.dispatch(ViewCommand::SetQuery(String::new()));
            emit_status(state, view_data, internal_tx, "filter cleared");
        }
        _ => {}
    }
    false
}

fn handle_modal_key(state: &mut ViewState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
            state.dispatch(ViewCommand::CloseModal);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.dispatch(ViewCommand::ScrollModal(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.dispatch(ViewCommand::ScrollModal(-1));
        }
        KeyCode::PageDown => {
            state.dispatch(ViewCommand::ScrollModal(FULL_PAGE_ROWS));
        }
        KeyCode::PageUp => {
            state.dispatch(ViewCommand::ScrollModal(-FULL_PAGE_ROWS));
        }
        KeyCode::Char('g') => {
            state.modal.scroll = 0;
        }
        _ => {}
    }
}

fn handle_filter_key(
    state: &mut ViewState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Enter, _) | (KeyCode::Esc, _) => {
            state.dispatch(ViewCommand::StopFilterEdit);
            let shown = state.visible_records().len();
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{shown} of {} shown", state.items.len()),
            );
        }
        (KeyCode::Backspace, _) => {
            state.dispatch(ViewCommand::PopQueryChar);
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            state.dispatch(ViewCommand::SetQuery(String::new()));
        }
        (KeyCode::Char(ch), modifiers)
            if !modifiers.contains(KeyModifiers::CONTROL)
                && !modifiers.contains(KeyModifiers::ALT) =>
        {
            state.dispatch(ViewCommand::PushQueryChar(ch));
        }
        _ => {}
    }
}

fn table_command_for_key(key: KeyEvent) -> Option<ViewCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            Some(ViewCommand::MoveRow(1))
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            Some(ViewCommand::MoveRow(-1))
        }
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ViewCommand::MoveRow(HALF_PAGE_ROWS))
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ViewCommand::MoveRow(-HALF_PAGE_ROWS))
        }
        (KeyCode::PageDown, _) => Some(ViewCommand::MoveRow(FULL_PAGE_ROWS)),
        (KeyCode::PageUp, _) => Some(ViewCommand::MoveRow(-FULL_PAGE_ROWS)),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(ViewCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(ViewCommand::JumpLastRow),
        _ => None,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &ViewState, view_data: &mut ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(render_header_text(view_data)).block(
        Block::default()
            .title(view_data.options.labels.title.clone())
            .borders(Borders::ALL),
    );
    frame.render_widget(header, layout[0]);

    let filter_style = if state.filter_editing {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let filter = Paragraph::new(render_filter_text(state))
        .style(filter_style)
        .block(Block::default().title("filter").borders(Borders::ALL));
    frame.render_widget(filter, layout[1]);

    match body_message(state, &view_data.options.labels) {
        Some(BodyMessage::Loading(message)) => {
            let body = Paragraph::new(message).block(Block::default().borders(Borders::ALL));
            frame.render_widget(body, layout[2]);
        }
        Some(BodyMessage::Error(message)) => {
            let body = Paragraph::new(message)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(body, layout[2]);
        }
        None => render_table(frame, layout[2], state, view_data),
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[3]);

    if state.modal.is_visible() {
        let area = centered_rect(80, 80, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(state.modal.pretty_json())
            .wrap(Wrap { trim: false })
            .scroll((state.modal.scroll, 0))
            .block(
                Block::default()
                    .title(view_data.options.labels.modal_title())
                    .title_bottom("esc close · j/k scroll")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(modal, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyMessage {
    Loading(String),
    Error(String),
}

fn body_message(state: &ViewState, labels: &ResourceLabels) -> Option<BodyMessage> {
    if state.loading {
        return Some(BodyMessage::Loading(labels.loading_message()));
    }
    state
        .error
        .as_deref()
        .map(|error| BodyMessage::Error(labels.error_message(error)))
}

fn render_header_text(view_data: &ViewData) -> String {
    format!(
        "{}  |  r refresh  v view json  / filter",
        view_data.endpoint
    )
}

fn render_filter_text(state: &ViewState) -> String {
    if state.filter_editing {
        format!("{}█", state.query)
    } else if state.query.is_empty() {
        "Filter... (press /)".to_owned()
    } else {
        state.query.clone()
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &ViewState,
    view_data: &mut ViewData,
) {
    let projection = TableProjection::build(
        &state.items,
        &state.query,
        view_data.options.columns.as_deref(),
    );

    let mut widths = vec![Constraint::Min(8); projection.column_count()];
    widths.push(Constraint::Length(ACTIONS_CELL.chars().count() as u16));

    let header_cells = projection
        .columns
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(ACTIONS_LABEL))
        .map(|label| {
            Cell::from(label.to_owned()).style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells);

    let rows = projection.rows.iter().enumerate().map(|(row_index, row)| {
        let selected = row_index == state.selected_row;
        let mut cells = row
            .cells
            .iter()
            .map(|cell| Cell::from(cell.display()))
            .collect::<Vec<_>>();
        cells.push(Cell::from(ACTIONS_CELL).style(Style::default().fg(Color::DarkGray)));

        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if row_index % 2 == 1 {
            Style::default().bg(Color::Rgb(24, 24, 24))
        } else {
            Style::default()
        };
        Row::new(cells).style(style)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(&projection, state, &view_data.options.labels))
                .borders(Borders::ALL),
        );
    let selected = (!projection.rows.is_empty()).then_some(state.selected_row);
    view_data.table_state.select(selected);
    frame.render_stateful_widget(table, area, &mut view_data.table_state);
}

fn table_title(projection: &TableProjection, state: &ViewState, labels: &ResourceLabels) -> String {
    let total = state.items.len();
    let shown = projection.row_count();
    if state.query.is_empty() {
        format!("{} ({total})", labels.resource)
    } else {
        format!("{} ({shown} of {total})", labels.resource)
    }
}

fn status_text(state: &ViewState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let mode = if state.modal.visibility == ModalVisibility::Visible {
        "JSON"
    } else if state.filter_editing {
        "FILTER"
    } else {
        "NAV"
    };
    let updated = state
        .fetched_at
        .map(format_fetched_at)
        .map(|at| format!("updated {at}"))
        .unwrap_or_else(|| "not loaded".to_owned());
    let default = format!("{updated} | j/k g/G | enter view d details | ? help | q quit");
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {default}"),
        None => format!("{mode} | {default}"),
    }
}

fn format_fetched_at(at: OffsetDateTime) -> String {
    at.format(&time::macros::format_description!(
        "[hour]:[minute]:[second] UTC"
    ))
    .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

fn help_overlay_text() -> &'static str {
    "nav: j/k up/down | g/G first/last | ctrl+d/u half page | pgup/pgdn page\n\
nav: r refresh | v view all json | enter view row json | d details | / filter | esc clear filter\n\
filter: type to filter | backspace delete | ctrl+u clear | enter/esc done\n\
json: j/k scroll | pgup/pgdn page | g top | esc/enter/q close\n\
global: q quit | ctrl+q/ctrl+c quit | ? help"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
