// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{ModalData, Record, filter_records};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalVisibility {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    pub visibility: ModalVisibility,
    /// Kept after close; replaced by the next view action.
    pub data: Option<ModalData>,
    pub scroll: u16,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            visibility: ModalVisibility::Hidden,
            data: None,
            scroll: 0,
        }
    }
}

impl ModalState {
    pub fn is_visible(&self) -> bool {
        self.visibility == ModalVisibility::Visible
    }

    pub fn pretty_json(&self) -> String {
        self.data
            .as_ref()
            .map_or_else(|| "null".to_owned(), ModalData::to_pretty_json)
    }

    /// Highest scroll offset that still shows the last line of the JSON.
    pub fn max_scroll(&self) -> u16 {
        let lines = self.pretty_json().lines().count().saturating_sub(1);
        u16::try_from(lines).unwrap_or(u16::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub items: Vec<Record>,
    pub loading: bool,
    pub error: Option<String>,
    pub query: String,
    pub filter_editing: bool,
    pub selected_row: usize,
    pub modal: ModalState,
    pub status_line: Option<String>,
    pub fetched_at: Option<OffsetDateTime>,
    last_request_id: u64,
    pending_request_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    BeginFetch,
    CompleteFetch {
        request_id: u64,
        items: Vec<Record>,
        fetched_at: OffsetDateTime,
    },
    FailFetch {
        request_id: u64,
        error: String,
    },
    SetQuery(String),
    PushQueryChar(char),
    PopQueryChar,
    StartFilterEdit,
    StopFilterEdit,
    MoveRow(isize),
    JumpFirstRow,
    JumpLastRow,
    ViewAll,
    ViewSelected,
    OpenDetails,
    CloseModal,
    ScrollModal(isize),
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    FetchStarted { request_id: u64 },
    FetchCompleted { request_id: u64, count: usize },
    FetchFailed { request_id: u64, error: String },
    StaleFetchDiscarded { request_id: u64 },
    QueryChanged(String),
    FilterEditChanged(bool),
    SelectionChanged(usize),
    ModalChanged(ModalVisibility),
    StatusUpdated(String),
    StatusCleared,
}

impl ViewState {
    pub fn dispatch(&mut self, command: ViewCommand) -> Vec<ViewEvent> {
        match command {
            ViewCommand::BeginFetch => {
                self.last_request_id = self.last_request_id.saturating_add(1);
                self.pending_request_id = Some(self.last_request_id);
                self.loading = true;
                self.error = None;
                vec![ViewEvent::FetchStarted {
                    request_id: self.last_request_id,
                }]
            }
            ViewCommand::CompleteFetch {
                request_id,
                items,
                fetched_at,
            } => {
                if !self.settle(request_id) {
                    return vec![ViewEvent::StaleFetchDiscarded { request_id }];
                }
                let count = items.len();
                self.items = items;
                self.fetched_at = Some(fetched_at);
                self.clamp_selection();
                vec![ViewEvent::FetchCompleted { request_id, count }]
            }
            ViewCommand::FailFetch { request_id, error } => {
                if !self.settle(request_id) {
                    return vec![ViewEvent::StaleFetchDiscarded { request_id }];
                }
                self.error = Some(error.clone());
                vec![ViewEvent::FetchFailed { request_id, error }]
            }
            ViewCommand::SetQuery(query) => {
                self.query = query;
                self.query_changed()
            }
            ViewCommand::PushQueryChar(ch) => {
                self.query.push(ch);
                self.query_changed()
            }
            ViewCommand::PopQueryChar => {
                if self.query.pop().is_none() {
                    return Vec::new();
                }
                self.query_changed()
            }
            ViewCommand::StartFilterEdit => {
                self.filter_editing = true;
                vec![ViewEvent::FilterEditChanged(true)]
            }
            ViewCommand::StopFilterEdit => {
                self.filter_editing = false;
                vec![ViewEvent::FilterEditChanged(false)]
            }
            ViewCommand::MoveRow(delta) => {
                let len = self.visible_count();
                if len == 0 {
                    return Vec::new();
                }
                let next = (self.selected_row as isize)
                    .saturating_add(delta)
                    .clamp(0, len as isize - 1) as usize;
                self.select(next)
            }
            ViewCommand::JumpFirstRow => self.select(0),
            ViewCommand::JumpLastRow => {
                let last = self.visible_count().saturating_sub(1);
                self.select(last)
            }
            ViewCommand::ViewAll => {
                let data = ModalData::All(self.items.clone());
                self.open_modal(data)
            }
            ViewCommand::ViewSelected => {
                let selected = self.selected_record().cloned();
                match selected {
                    Some(record) => self.open_modal(ModalData::Row(record)),
                    None => vec![self.set_status("no row selected")],
                }
            }
            ViewCommand::OpenDetails => {
                let message = match self.selected_record() {
                    Some(record) => format!(
                        "details for {} not available yet",
                        record.row_key(self.selected_row).label()
                    ),
                    None => "no row selected".to_owned(),
                };
                vec![self.set_status(&message)]
            }
            ViewCommand::CloseModal => {
                if !self.modal.is_visible() {
                    return Vec::new();
                }
                self.modal.visibility = ModalVisibility::Hidden;
                vec![ViewEvent::ModalChanged(ModalVisibility::Hidden)]
            }
            ViewCommand::ScrollModal(delta) => {
                let next = i64::from(self.modal.scroll).saturating_add(delta as i64);
                let max = i64::from(self.modal.max_scroll());
                self.modal.scroll = next.clamp(0, max) as u16;
                Vec::new()
            }
            ViewCommand::SetStatus(message) => vec![self.set_status(&message)],
            ViewCommand::ClearStatus => {
                self.status_line = None;
                vec![ViewEvent::StatusCleared]
            }
        }
    }

    /// Records that pass the current query, in fetch order.
    pub fn visible_records(&self) -> Vec<&Record> {
        filter_records(&self.items, &self.query)
    }

    pub fn selected_record(&self) -> Option<&Record> {
        self.visible_records().get(self.selected_row).copied()
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.pending_request_id
    }

    /// The table only shows once a fetch settled without error.
    pub fn table_visible(&self) -> bool {
        !self.loading && self.error.is_none()
    }

    fn settle(&mut self, request_id: u64) -> bool {
        if self.pending_request_id != Some(request_id) {
            return false;
        }
        self.pending_request_id = None;
        self.loading = false;
        true
    }

    fn visible_count(&self) -> usize {
        self.visible_records().len()
    }

    fn select(&mut self, row: usize) -> Vec<ViewEvent> {
        self.selected_row = row;
        vec![ViewEvent::SelectionChanged(row)]
    }

    fn query_changed(&mut self) -> Vec<ViewEvent> {
        let mut events = vec![ViewEvent::QueryChanged(self.query.clone())];
        if self.clamp_selection() {
            events.push(ViewEvent::SelectionChanged(self.selected_row));
        }
        events
    }

    fn clamp_selection(&mut self) -> bool {
        let clamped = self
            .selected_row
            .min(self.visible_count().saturating_sub(1));
        let changed = clamped != self.selected_row;
        self.selected_row = clamped;
        changed
    }

    fn open_modal(&mut self, data: ModalData) -> Vec<ViewEvent> {
        self.modal.data = Some(data);
        self.modal.scroll = 0;
        self.modal.visibility = ModalVisibility::Visible;
        vec![ViewEvent::ModalChanged(ModalVisibility::Visible)]
    }

    fn set_status(&mut self, message: &str) -> ViewEvent {
        self.status_line = Some(message.to_owned());
        ViewEvent::StatusUpdated(message.to_owned())
    }
}
