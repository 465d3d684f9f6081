// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use gridscope_app::{DetailPayload, Row, RowKey};
use gridscope_testkit::{GridFaker, column_catalog_rows};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;

/// In-process stand-in for the grid service, with artificial latency.
///
/// Clones share the draw counter so every detail fetch gets fresh values.
#[derive(Debug, Clone)]
pub struct DemoSource {
    seed: u64,
    copies: usize,
    data_latency: Duration,
    detail_latency: Duration,
    draws: Arc<AtomicU64>,
}

impl DemoSource {
    pub fn new(seed: u64, copies: usize, data_latency: Duration, detail_latency: Duration) -> Self {
        Self {
            seed,
            copies,
            data_latency,
            detail_latency,
            draws: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn copies(&self) -> usize {
        self.copies
    }

    pub fn fetch_grid_data(&self) -> Vec<Row> {
        thread::sleep(self.data_latency);
        column_catalog_rows(self.copies)
    }

    pub fn fetch_item_details(&self, key: &RowKey) -> DetailPayload {
        thread::sleep(self.detail_latency);
        let draw = self.draws.fetch_add(1, Ordering::Relaxed);
        let mut faker = GridFaker::new(self.seed.wrapping_add(draw));
        faker.item_details(key, OffsetDateTime::now_utc())
    }
}
