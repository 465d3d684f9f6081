// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::demo::DemoSource;
use anyhow::{Context, Result};
use gridscope_app::{DetailPayload, DetailTicket, Row, RowKey};
use gridscope_source::HttpSource;
use gridscope_tui::InternalEvent;
use std::sync::mpsc::Sender;
use std::thread;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Backend {
    Http(HttpSource),
    Demo(DemoSource),
}

impl Backend {
    fn fetch_grid_data(&self) -> Result<Vec<Row>> {
        match self {
            Self::Http(source) => source.fetch_grid_data(),
            Self::Demo(source) => Ok(source.fetch_grid_data()),
        }
    }

    fn fetch_item_details(&self, key: &RowKey) -> Result<DetailPayload> {
        match self {
            Self::Http(source) => source.fetch_item_details(key),
            Self::Demo(source) => Ok(source.fetch_item_details(key)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Http(source) => format!("http {}", source.base_url()),
            Self::Demo(source) => format!("demo ({} catalog copies)", source.copies()),
        }
    }
}

/// Runs every fetch on its own worker thread.
pub struct SourceRuntime {
    backend: Backend,
}

impl SourceRuntime {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

impl gridscope_tui::GridRuntime for SourceRuntime {
    fn fetch_grid_data(&mut self) -> Result<Vec<Row>> {
        self.backend.fetch_grid_data()
    }

    fn fetch_item_details(&mut self, key: &RowKey) -> Result<DetailPayload> {
        self.backend.fetch_item_details(key)
    }

    fn spawn_grid_data(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let backend = self.backend.clone();
        thread::Builder::new()
            .name("gridscope-rows".to_owned())
            .spawn(move || {
                let outcome = backend
                    .fetch_grid_data()
                    .map_err(|error| format!("{error:#}"));
                if tx.send(InternalEvent::DatasetFetched(outcome)).is_err() {
                    debug!("grid rows arrived after the UI loop exited");
                }
            })
            .context("spawn grid rows worker")?;
        Ok(())
    }

    fn spawn_item_details(&mut self, ticket: DetailTicket, tx: Sender<InternalEvent>) -> Result<()> {
        let backend = self.backend.clone();
        thread::Builder::new()
            .name(format!("gridscope-detail-{}", ticket.request_id.get()))
            .spawn(move || {
                let outcome = backend
                    .fetch_item_details(&ticket.key)
                    .map_err(|error| format!("{error:#}"));
                if tx
                    .send(InternalEvent::DetailFetched { ticket, outcome })
                    .is_err()
                {
                    debug!("detail arrived after the UI loop exited");
                }
            })
            .context("spawn detail worker")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Backend, SourceRuntime};
    use crate::demo::DemoSource;
    use anyhow::{Result, bail};
    use gridscope_app::{DetailTicket, FieldValue, RequestId, RowKey};
    use gridscope_source::HttpSource;
    use gridscope_tui::{GridRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::time::Duration;

    fn demo_runtime() -> SourceRuntime {
        SourceRuntime::new(Backend::Demo(DemoSource::new(
            7,
            2,
            Duration::ZERO,
            Duration::ZERO,
        )))
    }

    #[test]
    fn spawned_rows_arrive_on_the_channel() -> Result<()> {
        let mut runtime = demo_runtime();
        let (tx, rx) = mpsc::channel();
        runtime.spawn_grid_data(tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::DatasetFetched(Ok(rows)) => assert_eq!(rows.len(), 20),
            other => bail!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn spawned_details_carry_their_ticket() -> Result<()> {
        let mut runtime = demo_runtime();
        let (tx, rx) = mpsc::channel();
        let ticket = DetailTicket {
            request_id: RequestId::new(3),
            key: RowKey::from("4"),
        };
        runtime.spawn_item_details(ticket.clone(), tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::DetailFetched {
                ticket: received,
                outcome: Ok(payload),
            } => {
                assert_eq!(received, ticket);
                assert_eq!(
                    payload.get("description"),
                    Some(&FieldValue::from("Detailed description for item 4"))
                );
            }
            other => bail!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn unreachable_http_source_reports_failure_not_silence() -> Result<()> {
        let source = HttpSource::new("http://127.0.0.1:1/api", Duration::from_millis(50))?;
        let mut runtime = SourceRuntime::new(Backend::Http(source));
        let (tx, rx) = mpsc::channel();
        runtime.spawn_grid_data(tx)?;

        match rx.recv_timeout(Duration::from_secs(5))? {
            InternalEvent::DatasetFetched(Err(error)) => {
                assert!(error.contains("source.base_url"), "got {error}");
            }
            other => bail!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn describe_names_the_backend() -> Result<()> {
        let http = Backend::Http(HttpSource::new(
            "http://localhost:8080/api",
            Duration::from_secs(1),
        )?);
        assert_eq!(http.describe(), "http http://localhost:8080/api");
        assert_eq!(
            Backend::Demo(DemoSource::new(1, 3, Duration::ZERO, Duration::ZERO)).describe(),
            "demo (3 catalog copies)"
        );
        Ok(())
    }
}
