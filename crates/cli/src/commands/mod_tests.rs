// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure for command testing.
//!
//! `TestStation` initializes a `.gatescan/` directory in a temp dir and opens
//! it, so commands can be exercised through their `run_impl` functions
//! without changing the process working directory.
//!
//! ```rust,ignore
//! let ctx = TestStation::new();
//! ctx.scan(ItemKind::Ticket, "T-1");
//! let report = status::collect(&ctx, &[ItemKind::Ticket]).unwrap();
//! ```

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use gs_core::{Connectivity, ItemKind, ItemPatch, ScanInput};
use tempfile::TempDir;

use super::{init, Station};
use crate::gateway::testing::{MockGateway, MockTransport};
use crate::gateway::{GatewayClient, Transport};

pub struct TestStation {
    pub station: Station,
    _temp_dir: TempDir, // Keep alive for duration of test
}

impl Default for TestStation {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStation {
    /// Station without a gateway.
    pub fn new() -> Self {
        Self::with_remote(None)
    }

    pub fn with_remote(url: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let station = init::run_impl(temp_dir.path(), url).expect("Failed to init station");
        TestStation {
            station,
            _temp_dir: temp_dir,
        }
    }

    /// Queue a scan and return its local id.
    pub fn scan(&self, kind: ItemKind, key: &str) -> i64 {
        self.station
            .local_engine(kind)
            .unwrap()
            .enqueue(ScanInput::new(key))
            .unwrap()
    }

    /// Queue a scan with an explicit scan time.
    pub fn scan_at(&self, kind: ItemKind, key: &str, at: DateTime<Utc>) -> i64 {
        let mut input = ScanInput::new(key);
        input.scanned_at = Some(at);
        self.station
            .local_engine(kind)
            .unwrap()
            .enqueue(input)
            .unwrap()
    }

    /// Move a pending item to synced.
    pub fn mark_synced(&self, kind: ItemKind, local_id: i64) {
        let queue = self.station.queue(kind).unwrap();
        queue.update(local_id, &ItemPatch::syncing(Utc::now())).unwrap();
        queue.update(local_id, &ItemPatch::synced(None)).unwrap();
    }

    /// Move a pending item to failed with `retry_count` attempts.
    pub fn mark_failed(&self, kind: ItemKind, local_id: i64, retry_count: u32) {
        let queue = self.station.queue(kind).unwrap();
        queue.update(local_id, &ItemPatch::syncing(Utc::now())).unwrap();
        queue
            .update(
                local_id,
                &ItemPatch::failed(retry_count, "not found", Utc::now()),
            )
            .unwrap();
    }
}

impl Deref for TestStation {
    type Target = Station;

    fn deref(&self) -> &Station {
        &self.station
    }
}

/// A client already connected to `gateway`.
pub async fn connected_client(gateway: &MockGateway) -> Arc<GatewayClient<MockTransport>> {
    let client = Arc::new(GatewayClient::new(
        Duration::from_secs(5),
        Connectivity::new(false),
    ));
    let mut transport = gateway.transport();
    transport.connect("ws://mock").await.unwrap();
    client.install(transport).await;
    client
}
