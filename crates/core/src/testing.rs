// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: fixed timestamps, a controllable clock, an in-memory
//! scan authority and a recording telemetry sink.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::ClockSource;
use crate::error::Result;
use crate::history::{SyncHistoryEntry, TelemetrySink};
use crate::item::{ItemKind, QueuedItem, SyncStatus};
use crate::remote::{
    CommitRequest, Identifier, RemoteError, RemoteFuture, RemoteRecord, RemoteResult, RemoteStatus,
    ScanAuthority, Verification, VerifyContext,
};

/// Fixed base instant offset by `ms` milliseconds.
pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap() + chrono::Duration::milliseconds(ms)
}

/// A ticket item with the given id, status and retry count.
pub fn sample_item(local_id: i64, status: SyncStatus, retry_count: u32) -> QueuedItem {
    QueuedItem {
        local_id,
        kind: ItemKind::Ticket,
        lookup_key: format!("T-{local_id}"),
        signature: None,
        actor_id: None,
        scanned_at: at(0),
        device_id: "dev-test".to_string(),
        sync_status: status,
        retry_count,
        error_message: None,
        last_retry_at: None,
        resolved_remote_id: None,
        sync_started_at: None,
    }
}

/// Mock clock for testing with controllable time.
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(MockClock {
            now: Mutex::new(start),
        })
    }

    pub fn advance(&self, ms: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::milliseconds(ms);
    }
}

impl ClockSource for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-memory scan authority with scripted failures.
pub struct MockAuthority {
    kind: ItemKind,
    /// Records keyed by every identifier value that resolves to them.
    records: Mutex<HashMap<String, RemoteRecord>>,
    resolve_failures: Mutex<HashMap<String, RemoteError>>,
    commit_failures: Mutex<HashMap<String, RemoteError>>,
    verification: Mutex<Option<RemoteResult<Verification>>>,
    commits: Mutex<Vec<CommitRequest>>,
    delay: Mutex<Option<Duration>>,
    pub resolve_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockAuthority {
    pub fn new(kind: ItemKind) -> Arc<Self> {
        Arc::new(MockAuthority {
            kind,
            records: Mutex::new(HashMap::new()),
            resolve_failures: Mutex::new(HashMap::new()),
            commit_failures: Mutex::new(HashMap::new()),
            verification: Mutex::new(None),
            commits: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            resolve_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    /// Make `token` (and the record's own id) resolve to a record.
    pub fn add_record(&self, token: &str, id: &str, status: RemoteStatus) {
        let record = RemoteRecord::new(id, status);
        let mut records = self.records.lock().unwrap();
        records.insert(token.to_string(), record.clone());
        records.insert(id.to_string(), record);
    }

    pub fn insert_record(&self, token: &str, record: RemoteRecord) {
        let mut records = self.records.lock().unwrap();
        records.insert(record.id.clone(), record.clone());
        records.insert(token.to_string(), record);
    }

    pub fn fail_resolve(&self, key: &str, err: RemoteError) {
        self.resolve_failures
            .lock()
            .unwrap()
            .insert(key.to_string(), err);
    }

    pub fn clear_resolve_failure(&self, key: &str) {
        self.resolve_failures.lock().unwrap().remove(key);
    }

    pub fn fail_commit(&self, remote_id: &str, err: RemoteError) {
        self.commit_failures
            .lock()
            .unwrap()
            .insert(remote_id.to_string(), err);
    }

    pub fn set_verification(&self, result: RemoteResult<Verification>) {
        *self.verification.lock().unwrap() = Some(result);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn commits(&self) -> Vec<CommitRequest> {
        self.commits.lock().unwrap().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }

    pub fn status_of(&self, id: &str) -> Option<RemoteStatus> {
        self.records.lock().unwrap().get(id).map(|r| r.status)
    }

    /// Highest number of resolve/commit calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn finalized_status(&self) -> RemoteStatus {
        match self.kind {
            ItemKind::Ticket => RemoteStatus::Used,
            ItemKind::VipPass => RemoteStatus::CheckedIn,
        }
    }
}

impl ScanAuthority for MockAuthority {
    fn resolve<'a>(&'a self, candidates: &'a [Identifier]) -> RemoteFuture<'a, RemoteRecord> {
        Box::pin(async move {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            self.enter().await;
            let result = (|| {
                for candidate in candidates {
                    if let Some(err) = self.resolve_failures.lock().unwrap().get(&candidate.value)
                    {
                        return Err(err.clone());
                    }
                    if let Some(record) = self.records.lock().unwrap().get(&candidate.value) {
                        return Ok(record.clone());
                    }
                }
                let first = candidates
                    .first()
                    .map(|c| c.to_string())
                    .unwrap_or_default();
                Err(RemoteError::NotFound(first))
            })();
            self.leave();
            result
        })
    }

    fn verify_signature<'a>(
        &'a self,
        _key: &'a str,
        _signature: &'a str,
        _context: &'a VerifyContext,
    ) -> RemoteFuture<'a, Verification> {
        Box::pin(async move {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            self.verification
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Ok(Verification::valid()))
        })
    }

    fn commit<'a>(&'a self, request: &'a CommitRequest) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            self.enter().await;
            let result = (|| {
                if let Some(err) = self.commit_failures.lock().unwrap().get(&request.remote_id) {
                    return Err(err.clone());
                }
                let finalized = self.finalized_status();
                let mut records = self.records.lock().unwrap();
                if records
                    .get(&request.remote_id)
                    .is_some_and(|r| self.kind.is_finalized(r.status))
                {
                    return Err(RemoteError::AlreadyFinalized(request.remote_id.clone()));
                }
                for record in records.values_mut() {
                    if record.id == request.remote_id {
                        record.status = finalized;
                    }
                }
                self.commits.lock().unwrap().push(request.clone());
                Ok(())
            })();
            self.leave();
            result
        })
    }

    fn is_finalized(&self, record: &RemoteRecord) -> bool {
        self.kind.is_finalized(record.status)
    }
}

/// Telemetry sink that keeps entries in memory, optionally failing every write.
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<SyncHistoryEntry>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingSink::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(RecordingSink {
            entries: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn entries(&self) -> Vec<SyncHistoryEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl TelemetrySink for RecordingSink {
    fn record(&self, entry: &SyncHistoryEntry) -> Result<()> {
        if self.fail {
            return Err(crate::error::Error::InvalidInput(
                "telemetry backend unavailable".to_string(),
            ));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
