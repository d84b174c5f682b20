// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Automatic sync driver.
//!
//! Runs the orchestrator on a fixed interval and whenever connectivity comes
//! back. A trigger that arrives while a run from this driver is in flight is
//! dropped, not queued. Each engine instance owns its own driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connectivity::Connectivity;
use crate::orchestrator::{Orchestrator, SyncSummary, SyncTrigger};
use crate::remote::ScanAuthority;

/// Default period of the sync timer.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5);

/// What happened to one auto trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerResult {
    /// Device is offline; nothing attempted.
    Offline,
    /// A run from this driver was already in flight; trigger dropped.
    Busy,
    /// The orchestrator ran.
    Ran(SyncSummary),
    /// The orchestrator returned an error (storage failure).
    Failed(String),
}

struct DriverInner<A> {
    orchestrator: Arc<Orchestrator<A>>,
    connectivity: Connectivity,
    interval: Duration,
    is_syncing: AtomicBool,
}

/// Clears the reentrancy flag when dropped, whatever the run's outcome.
struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: ScanAuthority> DriverInner<A> {
    async fn trigger(&self) -> TriggerResult {
        if !self.connectivity.is_online() {
            debug!("offline, skipping auto sync");
            return TriggerResult::Offline;
        }
        if self
            .is_syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sync already in flight, dropping trigger");
            return TriggerResult::Busy;
        }
        let _guard = SyncingGuard(&self.is_syncing);

        match self.orchestrator.run(SyncTrigger::Auto).await {
            Ok(summary) => TriggerResult::Ran(summary),
            Err(err) => {
                warn!(error = %err, "auto sync run failed");
                TriggerResult::Failed(err.to_string())
            }
        }
    }
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Timer and connectivity driven trigger source for one orchestrator.
pub struct AutoSyncDriver<A> {
    inner: Arc<DriverInner<A>>,
    task: Mutex<Option<RunningTask>>,
}

impl<A: ScanAuthority + 'static> AutoSyncDriver<A> {
    pub fn new(
        orchestrator: Arc<Orchestrator<A>>,
        connectivity: Connectivity,
        interval: Duration,
    ) -> Self {
        AutoSyncDriver {
            inner: Arc::new(DriverInner {
                orchestrator,
                connectivity,
                interval,
                is_syncing: AtomicBool::new(false),
            }),
            task: Mutex::new(None),
        }
    }

    /// Run one auto sync now, subject to the offline and reentrancy checks.
    pub async fn trigger(&self) -> TriggerResult {
        self.inner.trigger().await
    }

    /// Returns true if a run started by this driver is in flight.
    pub fn is_syncing(&self) -> bool {
        self.inner.is_syncing.load(Ordering::Acquire)
    }

    /// Returns true if the timer/listener task is active.
    pub fn is_started(&self) -> bool {
        self.slot().is_some()
    }

    /// Start the timer and connectivity listener.
    ///
    /// Returns false if already started. Must be called within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut slot = self.slot();
        if slot.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let inner = Arc::clone(&self.inner);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            drive(inner, token).await;
        });
        *slot = Some(RunningTask { cancel, handle });
        debug!(interval_ms = self.inner.interval.as_millis() as u64, "auto sync started");
        true
    }

    /// Stop the timer and listener. A run already executing completes.
    ///
    /// Returns false if not started.
    pub fn stop(&self) -> bool {
        let Some(task) = self.slot().take() else {
            return false;
        };
        task.cancel.cancel();
        debug!("auto sync stopped");
        true
    }

    /// Stop and wait for the background task to exit, including any run in flight.
    pub async fn shutdown(&self) {
        let task = self.slot().take();
        if let Some(task) = task {
            task.cancel.cancel();
            if let Err(err) = task.handle.await {
                warn!(error = %err, "auto sync task ended abnormally");
            }
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<RunningTask>> {
        // Poisoning is ignored: the slot is a plain Option.
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<A> Drop for AutoSyncDriver<A> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.task.lock() {
            if let Some(task) = slot.take() {
                task.cancel.cancel();
            }
        }
    }
}

async fn drive<A: ScanAuthority>(inner: Arc<DriverInner<A>>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(inner.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut online_rx = inner.connectivity.subscribe();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                inner.trigger().await;
            }
            changed = online_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let online = *online_rx.borrow_and_update();
                if online {
                    debug!("connectivity restored, triggering sync");
                    inner.trigger().await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
