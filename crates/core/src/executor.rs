// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-item sync: one attempt to move a queued scan to the remote authority.
//!
//! The attempt is strictly ordered. The item is claimed as `syncing` in the
//! queue before any remote call, and its terminal status is written only after
//! the remote result is known. A remote record that is already finalized is a
//! conflict and resolves to `synced`; conflict detection runs on every attempt
//! so that a retry after a partially applied commit never commits twice.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::backoff::RetryPolicy;
use crate::clock::{ClockSource, SharedClock};
use crate::error::Result;
use crate::item::{ItemKind, ItemPatch, QueuedItem};
use crate::queue::ScanQueue;
use crate::remote::{
    CommitRequest, Identifier, RemoteError, RemoteResult, RemoteStatus, ScanAuthority,
    VerifyContext,
};

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote commit succeeded.
    Synced,
    /// The remote record was already finalized; the message explains how.
    ConflictResolved(String),
    /// The attempt failed and was recorded for retry.
    Failed(String),
    /// Another attempt holds the item, or it is already synced.
    Skipped,
}

impl SyncOutcome {
    /// Returns true if the item is now `synced`.
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Synced | SyncOutcome::ConflictResolved(_))
    }
}

enum Resolution {
    Committed,
    Conflict(String),
}

/// Message stored on an item whose remote record was already finalized.
pub fn conflict_message(kind: ItemKind, status: RemoteStatus) -> String {
    format!(
        "{} already {} (conflict resolved)",
        kind.label(),
        status.describe()
    )
}

/// Runs sync attempts for one item kind against one authority.
pub struct SyncExecutor<A> {
    queue: Arc<ScanQueue>,
    authority: A,
    clock: SharedClock,
    policy: RetryPolicy,
}

impl<A: ScanAuthority> SyncExecutor<A> {
    pub fn new(queue: Arc<ScanQueue>, authority: A, clock: SharedClock, policy: RetryPolicy) -> Self {
        SyncExecutor {
            queue,
            authority,
            clock,
            policy,
        }
    }

    pub fn queue(&self) -> &ScanQueue {
        &self.queue
    }

    /// Attempt to sync one item.
    ///
    /// Only storage errors are returned as `Err`; remote failures are recorded
    /// on the item and reported as [`SyncOutcome::Failed`].
    pub async fn sync(&self, item: &QueuedItem) -> Result<SyncOutcome> {
        let now = self.clock.now();
        let stale_before = self.policy.stale_before(now);
        let Some(claimed) = self.queue.claim(item.local_id, now, stale_before)? else {
            debug!(local_id = item.local_id, "item held by another attempt, skipping");
            return Ok(SyncOutcome::Skipped);
        };
        debug!(
            local_id = claimed.local_id,
            kind = %claimed.kind,
            key = %claimed.lookup_key,
            retry_count = claimed.retry_count,
            "sync attempt started"
        );

        match self.attempt(&claimed).await {
            Ok(Resolution::Committed) => {
                self.queue
                    .update(claimed.local_id, &ItemPatch::synced(None))?;
                debug!(local_id = claimed.local_id, "synced");
                Ok(SyncOutcome::Synced)
            }
            Ok(Resolution::Conflict(message)) => {
                self.queue
                    .update(claimed.local_id, &ItemPatch::synced(Some(message.clone())))?;
                debug!(local_id = claimed.local_id, %message, "conflict resolved");
                Ok(SyncOutcome::ConflictResolved(message))
            }
            Err(err) => {
                let reason = err.to_string();
                let retry_count = claimed.retry_count.saturating_add(1);
                self.queue.update(
                    claimed.local_id,
                    &ItemPatch::failed(retry_count, reason.clone(), self.clock.now()),
                )?;
                debug!(local_id = claimed.local_id, retry_count, %reason, "sync failed");
                Ok(SyncOutcome::Failed(reason))
            }
        }
    }

    async fn attempt(&self, item: &QueuedItem) -> RemoteResult<Resolution> {
        let kind = self.queue.kind();

        if let Some(signature) = item.signature.as_deref() {
            let context = VerifyContext {
                kind,
                device_id: item.device_id.clone(),
                actor_id: item.actor_id.clone(),
            };
            match self
                .authority
                .verify_signature(&item.lookup_key, signature, &context)
                .await
            {
                Ok(verification) if verification.already_processed() => {
                    return Ok(Resolution::Conflict(conflict_message(
                        kind,
                        RemoteStatus::Finalized,
                    )));
                }
                Ok(verification) if !verification.valid => {
                    warn!(
                        local_id = item.local_id,
                        reason = ?verification.reason,
                        "signature not verified, continuing with lookup"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(local_id = item.local_id, error = %err, "signature check failed, continuing with lookup");
                }
            }
        }

        let candidates = resolution_candidates(item);
        let record = self.authority.resolve(&candidates).await?;

        if item.resolved_remote_id.as_deref() != Some(record.id.as_str()) {
            // The id only speeds up later lookups; losing it is harmless.
            if let Err(err) = self
                .queue
                .update(item.local_id, &ItemPatch::resolved(record.id.clone()))
            {
                warn!(local_id = item.local_id, error = %err, "failed to persist resolved id");
            }
        }

        if self.authority.is_finalized(&record) {
            return Ok(Resolution::Conflict(conflict_message(kind, record.status)));
        }

        if !self.authority.is_admissible(&record) {
            let detail = if record.parent_active {
                record.status.describe()
            } else {
                "attached to an inactive order"
            };
            return Err(RemoteError::InvalidState(format!(
                "{} {} is {}",
                kind.label(),
                record.id,
                detail
            )));
        }

        let request = CommitRequest {
            kind,
            remote_id: record.id.clone(),
            actor_id: item.actor_id.clone(),
            scanned_at: item.scanned_at,
            device_id: item.device_id.clone(),
        };
        match self.authority.commit(&request).await {
            Ok(()) => Ok(Resolution::Committed),
            Err(err) if err.is_conflict() => Ok(Resolution::Conflict(conflict_message(
                kind,
                finalized_status(kind),
            ))),
            Err(err) => Err(err),
        }
    }
}

/// Ordered identifiers tried when resolving an item's remote record.
///
/// A previously learned remote id comes first, then the scanned key as a
/// token, then the scanned key as an id.
pub fn resolution_candidates(item: &QueuedItem) -> Vec<Identifier> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(ref remote_id) = item.resolved_remote_id {
        candidates.push(Identifier::id(remote_id.clone()));
    }
    candidates.push(Identifier::token(item.lookup_key.clone()));
    if item.resolved_remote_id.as_deref() != Some(item.lookup_key.as_str()) {
        candidates.push(Identifier::id(item.lookup_key.clone()));
    }
    candidates
}

fn finalized_status(kind: ItemKind) -> RemoteStatus {
    match kind {
        ItemKind::Ticket => RemoteStatus::Used,
        ItemKind::VipPass => RemoteStatus::CheckedIn,
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
