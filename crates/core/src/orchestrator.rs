// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Batch sync over every item eligible at the start of a run.
//!
//! Eligible items are read once, split into fixed-size batches, and each batch
//! is attempted concurrently. Batches run one after another with a short pause
//! in between. Runs of one orchestrator never overlap: every trigger source
//! goes through the same async mutex.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backoff::RetryPolicy;
use crate::clock::{ClockSource, SharedClock};
use crate::error::{Error, Result};
use crate::executor::{SyncExecutor, SyncOutcome};
use crate::history::{RunOutcome, SyncHistoryEntry, TelemetrySink};
use crate::item::{QueuedItem, SyncStatus};
use crate::queue::ScanQueue;
use crate::remote::ScanAuthority;

/// What started a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// Timer or connectivity-restored event.
    Auto,
    /// Operator asked for a sync.
    Manual,
    /// Operator asked to retry failed items.
    Retry,
}

impl SyncTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTrigger::Auto => "auto",
            SyncTrigger::Manual => "manual",
            SyncTrigger::Retry => "retry",
        }
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncTrigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SyncTrigger::Auto),
            "manual" => Ok(SyncTrigger::Manual),
            "retry" => Ok(SyncTrigger::Retry),
            _ => Err(Error::InvalidInput(format!("unknown sync trigger '{s}'"))),
        }
    }
}

/// Counts from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Items another attempt was already holding.
    pub skipped: usize,
    /// Eligible items observed at the start of the run.
    pub total: usize,
}

impl SyncSummary {
    /// Overall classification for history.
    pub fn outcome(&self) -> RunOutcome {
        if self.failed == 0 {
            RunOutcome::Success
        } else if self.succeeded == 0 {
            RunOutcome::Failed
        } else {
            RunOutcome::Partial
        }
    }
}

/// Batch shape for one item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub size: usize,
    pub delay: Duration,
}

/// Drives the executor over all eligible items of one kind.
pub struct Orchestrator<A> {
    executor: SyncExecutor<A>,
    queue: Arc<ScanQueue>,
    sink: Arc<dyn TelemetrySink>,
    clock: SharedClock,
    policy: RetryPolicy,
    batch: BatchConfig,
    device_id: String,
    run_lock: Mutex<()>,
}

impl<A: ScanAuthority> Orchestrator<A> {
    pub fn new(
        queue: Arc<ScanQueue>,
        authority: A,
        sink: Arc<dyn TelemetrySink>,
        clock: SharedClock,
        policy: RetryPolicy,
        batch: BatchConfig,
        device_id: impl Into<String>,
    ) -> Self {
        let executor = SyncExecutor::new(Arc::clone(&queue), authority, clock.clone(), policy);
        Orchestrator {
            executor,
            queue,
            sink,
            clock,
            policy,
            batch,
            device_id: device_id.into(),
            run_lock: Mutex::new(()),
        }
    }

    /// Items a run starting at `now` would attempt, oldest first.
    pub fn eligible(&self, now: DateTime<Utc>) -> Result<Vec<QueuedItem>> {
        let items = self.queue.select_by_status(&[
            SyncStatus::Pending,
            SyncStatus::Failed,
            SyncStatus::Syncing,
        ])?;
        Ok(items
            .into_iter()
            .filter(|item| self.policy.is_eligible_now(item, now))
            .collect())
    }

    /// Returns true if a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Sync every eligible item once.
    ///
    /// Waits for any run already in progress. The summary never counts more
    /// items than were eligible when this run started.
    pub async fn run(&self, trigger: SyncTrigger) -> Result<SyncSummary> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();
        let kind = self.queue.kind();

        let eligible = self.eligible(self.clock.now())?;
        if eligible.is_empty() {
            debug!(%kind, %trigger, "nothing to sync");
            return Ok(SyncSummary::default());
        }

        info!(%kind, %trigger, count = eligible.len(), "sync run started");
        let mut summary = SyncSummary {
            total: eligible.len(),
            ..Default::default()
        };
        let mut first_error: Option<String> = None;
        let size = self.batch.size.max(1);

        for (index, batch) in eligible.chunks(size).enumerate() {
            if index > 0 && !self.batch.delay.is_zero() {
                tokio::time::sleep(self.batch.delay).await;
            }

            let results = join_all(batch.iter().map(|item| self.executor.sync(item))).await;
            for (item, result) in batch.iter().zip(results) {
                match result {
                    Ok(SyncOutcome::Synced | SyncOutcome::ConflictResolved(_)) => {
                        summary.succeeded += 1
                    }
                    Ok(SyncOutcome::Skipped) => summary.skipped += 1,
                    Ok(SyncOutcome::Failed(reason)) => {
                        summary.failed += 1;
                        first_error.get_or_insert(reason);
                    }
                    Err(err) => {
                        warn!(local_id = item.local_id, error = %err, "storage error during sync");
                        summary.failed += 1;
                        first_error.get_or_insert_with(|| err.to_string());
                    }
                }
            }
        }

        let duration = started.elapsed();
        info!(
            %kind,
            %trigger,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            total = summary.total,
            duration_ms = duration.as_millis() as u64,
            "sync run finished"
        );

        let entry = SyncHistoryEntry {
            kind,
            trigger,
            outcome: summary.outcome(),
            succeeded: summary.succeeded,
            failed: summary.failed,
            skipped: summary.skipped,
            total: summary.total,
            duration_ms: duration.as_millis() as u64,
            first_error,
            device_id: self.device_id.clone(),
            finished_at: self.clock.now(),
        };
        if let Err(err) = self.sink.record(&entry) {
            warn!(error = %err, "failed to record sync history");
        }

        Ok(summary)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
