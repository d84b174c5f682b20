// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scan engine: queue, orchestrator and auto-sync driver for one item kind.
//!
//! The ticket and guest-pass engines are the same [`ScanEngine`] over two
//! [`ScanAuthority`] implementations and two [`EngineConfig`] presets. They
//! share an [`EngineContext`] (device id, clock, connectivity, history sink).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::RetryPolicy;
use crate::clock::{system_clock, ClockSource, SharedClock};
use crate::connectivity::Connectivity;
use crate::driver::{AutoSyncDriver, TriggerResult, DEFAULT_SYNC_INTERVAL};
use crate::error::{Error, Result};
use crate::history::TelemetrySink;
use crate::item::{ItemKind, NewScan, QueuedItem, StatusCounts, SyncStatus};
use crate::maintenance::{prune_synced, DEFAULT_RETENTION};
use crate::orchestrator::{BatchConfig, Orchestrator, SyncSummary, SyncTrigger};
use crate::queue::ScanQueue;
use crate::remote::ScanAuthority;

/// Tuning for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub kind: ItemKind,
    pub batch: BatchConfig,
    pub policy: RetryPolicy,
    pub sync_interval: Duration,
    pub retention: Duration,
}

impl EngineConfig {
    /// Ticket engine defaults: batches of 5, 100 ms apart.
    pub fn ticket() -> Self {
        EngineConfig {
            kind: ItemKind::Ticket,
            batch: BatchConfig {
                size: 5,
                delay: Duration::from_millis(100),
            },
            policy: RetryPolicy::default(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            retention: DEFAULT_RETENTION,
        }
    }

    /// Guest-pass engine defaults: batches of 3, 200 ms apart.
    pub fn vip() -> Self {
        EngineConfig {
            kind: ItemKind::VipPass,
            batch: BatchConfig {
                size: 3,
                delay: Duration::from_millis(200),
            },
            ..EngineConfig::ticket()
        }
    }

    pub fn for_kind(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Ticket => EngineConfig::ticket(),
            ItemKind::VipPass => EngineConfig::vip(),
        }
    }
}

/// Collaborators shared by every engine on a device.
#[derive(Clone)]
pub struct EngineContext {
    pub device_id: String,
    pub clock: SharedClock,
    pub connectivity: Connectivity,
    pub sink: Arc<dyn TelemetrySink>,
}

impl EngineContext {
    pub fn new(device_id: impl Into<String>, sink: Arc<dyn TelemetrySink>) -> Self {
        EngineContext {
            device_id: device_id.into(),
            clock: system_clock(),
            connectivity: Connectivity::default(),
            sink,
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }
}

/// A scan as captured at the gate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanInput {
    pub lookup_key: String,
    pub signature: Option<String>,
    pub actor_id: Option<String>,
    /// Defaults to the engine clock's "now".
    pub scanned_at: Option<DateTime<Utc>>,
}

impl ScanInput {
    pub fn new(lookup_key: impl Into<String>) -> Self {
        ScanInput {
            lookup_key: lookup_key.into(),
            ..Default::default()
        }
    }
}

/// Offline-first scan queue with background sync for one item kind.
pub struct ScanEngine<A> {
    config: EngineConfig,
    queue: Arc<ScanQueue>,
    orchestrator: Arc<Orchestrator<A>>,
    driver: AutoSyncDriver<A>,
    device_id: String,
    clock: SharedClock,
}

impl<A: ScanAuthority + 'static> ScanEngine<A> {
    /// Build an engine over `queue`. The queue must hold the configured kind.
    pub fn new(
        config: EngineConfig,
        queue: Arc<ScanQueue>,
        authority: A,
        context: &EngineContext,
    ) -> Result<Self> {
        if queue.kind() != config.kind {
            return Err(Error::InvalidInput(format!(
                "queue holds {} items but the engine is configured for {}",
                queue.kind(),
                config.kind
            )));
        }

        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&queue),
            authority,
            Arc::clone(&context.sink),
            context.clock.clone(),
            config.policy,
            config.batch,
            context.device_id.clone(),
        ));
        let driver = AutoSyncDriver::new(
            Arc::clone(&orchestrator),
            context.connectivity.clone(),
            config.sync_interval,
        );

        Ok(ScanEngine {
            config,
            queue,
            orchestrator,
            driver,
            device_id: context.device_id.clone(),
            clock: context.clock.clone(),
        })
    }

    pub fn kind(&self) -> ItemKind {
        self.config.kind
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn queue(&self) -> &ScanQueue {
        &self.queue
    }

    /// Record a scan locally. Never touches the network.
    pub fn enqueue(&self, input: ScanInput) -> Result<i64> {
        let key = input.lookup_key.trim();
        if key.is_empty() {
            return Err(Error::InvalidInput("lookup key cannot be empty".to_string()));
        }

        let mut scan = NewScan::new(
            key,
            self.device_id.clone(),
            input.scanned_at.unwrap_or_else(|| self.clock.now()),
        );
        scan.signature = input.signature.filter(|s| !s.is_empty());
        scan.actor_id = input.actor_id;

        let local_id = self.queue.enqueue(&scan)?;
        tracing::debug!(kind = %self.config.kind, local_id, key, "scan queued");
        Ok(local_id)
    }

    /// Counts per status, from local state only.
    pub fn status(&self) -> Result<StatusCounts> {
        self.queue.count_by_status()
    }

    /// Items, optionally restricted to one status.
    pub fn items(&self, status: Option<SyncStatus>) -> Result<Vec<QueuedItem>> {
        match status {
            Some(status) => self.queue.select_by_status(&[status]),
            None => self.queue.select_all(),
        }
    }

    /// Failed items that will not be retried automatically.
    pub fn exhausted(&self) -> Result<Vec<QueuedItem>> {
        self.queue.select_exhausted(self.config.policy.max_retries)
    }

    /// Items a run started now would attempt.
    pub fn eligible(&self) -> Result<Vec<QueuedItem>> {
        self.orchestrator.eligible(self.clock.now())
    }

    /// Run a sync now, waiting for any run already in progress.
    pub async fn sync_now(&self, trigger: SyncTrigger) -> Result<SyncSummary> {
        self.orchestrator.run(trigger).await
    }

    /// Run one auto sync, subject to connectivity and reentrancy checks.
    pub async fn trigger_auto(&self) -> TriggerResult {
        self.driver.trigger().await
    }

    /// Start background sync. Returns false if already running.
    pub fn start(&self) -> bool {
        self.driver.start()
    }

    /// Stop background sync. Returns false if not running.
    pub fn stop(&self) -> bool {
        self.driver.stop()
    }

    /// Stop background sync and wait for a run in flight to finish.
    pub async fn shutdown(&self) {
        self.driver.shutdown().await
    }

    /// Remove synced items older than the configured retention.
    pub fn prune(&self) -> Result<usize> {
        self.prune_older_than(self.config.retention)
    }

    pub fn prune_older_than(&self, retention: Duration) -> Result<usize> {
        prune_synced(&self.queue, retention, self.clock.now())
    }

    /// Remove one item. Returns false if it did not exist.
    pub fn delete(&self, local_id: i64) -> Result<bool> {
        self.queue.delete(local_id)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
