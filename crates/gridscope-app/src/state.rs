// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::filter::{derive_columns, filter_rows};
use crate::{
    DatasetStatus, DetailPayload, DetailStatus, DetailTicket, RequestId, Row, RowKey, Selection,
};

/// Single owner of the dataset, filter text, selection and detail state.
///
/// Everything that changes goes through [`GridState::dispatch`]. The returned
/// events name the side effects the shell has to run; fetch outcomes come back
/// in as [`GridCommand::DatasetLoaded`], [`GridCommand::DatasetFailed`] and
/// [`GridCommand::DetailResolved`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridState {
    dataset: Vec<Row>,
    dataset_status: DatasetStatus,
    configured_columns: Option<Vec<String>>,
    derived_columns: Vec<String>,
    filter_text: String,
    selection: Selection,
    detail: DetailStatus,
    last_request_id: RequestId,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridCommand {
    LoadDataset,
    DatasetLoaded(Vec<Row>),
    DatasetFailed(String),
    SetFilter(String),
    PushFilterChar(char),
    PopFilterChar,
    ClearFilter,
    Select(Selection),
    DetailResolved {
        ticket: DetailTicket,
        outcome: Result<DetailPayload, String>,
    },
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    DatasetRequested,
    DatasetAlreadyLoading,
    DatasetReady { rows: usize },
    DatasetFailed(String),
    FilterChanged(String),
    SelectionChanged(Selection),
    SelectionCleared,
    DetailRequested(DetailTicket),
    DetailLoaded(RowKey),
    DetailFailed { key: RowKey, error: String },
    StaleDetailDiscarded(DetailTicket),
    StatusUpdated(String),
    StatusCleared,
}

impl GridState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the grid columns instead of deriving them from the dataset.
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            configured_columns: Some(columns).filter(|columns| !columns.is_empty()),
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: GridCommand) -> Vec<GridEvent> {
        match command {
            GridCommand::LoadDataset => self.request_dataset(),
            GridCommand::DatasetLoaded(rows) => {
                let count = rows.len();
                self.derived_columns = derive_columns(&rows);
                self.dataset = rows;
                self.dataset_status = DatasetStatus::Ready;
                let mut events = vec![GridEvent::DatasetReady { rows: count }];
                if self.selection_vanished() {
                    events.extend(self.select(Selection::empty()));
                }
                events.push(self.set_status(format!("loaded {count} rows")));
                events
            }
            GridCommand::DatasetFailed(error) => {
                self.dataset.clear();
                self.derived_columns = derive_columns(&self.dataset);
                self.dataset_status = DatasetStatus::Failed(error.clone());
                vec![
                    GridEvent::DatasetFailed(error.clone()),
                    self.set_status(format!("load failed: {error}; press r to retry")),
                ]
            }
            GridCommand::SetFilter(text) => self.replace_filter(text),
            GridCommand::PushFilterChar(ch) => {
                let mut text = self.filter_text.clone();
                text.push(ch);
                self.replace_filter(text)
            }
            GridCommand::PopFilterChar => {
                let mut text = self.filter_text.clone();
                if text.pop().is_none() {
                    return Vec::new();
                }
                self.replace_filter(text)
            }
            GridCommand::ClearFilter => self.replace_filter(String::new()),
            GridCommand::Select(selection) => self.select(selection),
            GridCommand::DetailResolved { ticket, outcome } => self.resolve_detail(ticket, outcome),
            GridCommand::SetStatus(message) => vec![self.set_status(message)],
            GridCommand::ClearStatus => {
                self.status_line = None;
                vec![GridEvent::StatusCleared]
            }
        }
    }

    fn request_dataset(&mut self) -> Vec<GridEvent> {
        if self.dataset_status == DatasetStatus::Loading {
            return vec![GridEvent::DatasetAlreadyLoading];
        }
        self.dataset_status = DatasetStatus::Loading;
        vec![GridEvent::DatasetRequested, self.set_status("loading rows")]
    }

    fn replace_filter(&mut self, text: String) -> Vec<GridEvent> {
        if text == self.filter_text {
            return Vec::new();
        }
        self.filter_text = text;
        vec![GridEvent::FilterChanged(self.filter_text.clone())]
    }

    fn select(&mut self, selection: Selection) -> Vec<GridEvent> {
        self.selection = selection;
        let Some(key) = self.selection.primary().cloned() else {
            self.detail = DetailStatus::Idle;
            return vec![GridEvent::SelectionCleared];
        };

        self.last_request_id = self.last_request_id.next();
        let ticket = DetailTicket {
            request_id: self.last_request_id,
            key,
        };
        self.detail = DetailStatus::Loading {
            ticket: ticket.clone(),
        };
        vec![
            GridEvent::SelectionChanged(self.selection.clone()),
            GridEvent::DetailRequested(ticket),
        ]
    }

    fn resolve_detail(
        &mut self,
        ticket: DetailTicket,
        outcome: Result<DetailPayload, String>,
    ) -> Vec<GridEvent> {
        let current = match &self.detail {
            DetailStatus::Loading { ticket: current } => current,
            _ => return vec![GridEvent::StaleDetailDiscarded(ticket)],
        };
        if *current != ticket {
            return vec![GridEvent::StaleDetailDiscarded(ticket)];
        }

        match outcome {
            Ok(payload) => {
                let key = ticket.key;
                self.detail = DetailStatus::Loaded {
                    key: key.clone(),
                    payload,
                };
                vec![GridEvent::DetailLoaded(key)]
            }
            Err(error) => {
                let key = ticket.key;
                self.detail = DetailStatus::Failed {
                    key: key.clone(),
                    error: error.clone(),
                };
                let status = self.set_status(format!("details failed for {key}: {error}"));
                vec![GridEvent::DetailFailed { key, error }, status]
            }
        }
    }

    /// A reload dropped the row the details belong to.
    fn selection_vanished(&self) -> bool {
        self.selection
            .primary()
            .is_some_and(|key| !self.dataset.iter().any(|row| &row.key == key))
    }

    fn set_status(&mut self, message: impl Into<String>) -> GridEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        GridEvent::StatusUpdated(message)
    }

    pub fn dataset(&self) -> &[Row] {
        &self.dataset
    }

    pub fn dataset_status(&self) -> &DatasetStatus {
        &self.dataset_status
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    /// Rows visible under the current filter text.
    pub fn filtered_rows(&self) -> Vec<&Row> {
        filter_rows(&self.dataset, &self.filter_text)
    }

    pub fn columns(&self) -> &[String] {
        self.configured_columns
            .as_deref()
            .unwrap_or(&self.derived_columns)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn detail(&self) -> &DetailStatus {
        &self.detail
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.detail, DetailStatus::Loading { .. })
    }

    pub fn details(&self) -> Option<&DetailPayload> {
        match &self.detail {
            DetailStatus::Loaded { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn detail_error(&self) -> Option<&str> {
        match &self.detail {
            DetailStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> Option<&DetailTicket> {
        match &self.detail {
            DetailStatus::Loading { ticket } => Some(ticket),
            _ => None,
        }
    }
}
