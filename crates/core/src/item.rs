// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core data types for queued scans.
//!
//! This module contains the fundamental data types: [`ItemKind`], [`SyncStatus`],
//! [`QueuedItem`] and the partial-update [`ItemPatch`] applied by the sync executor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::remote::RemoteStatus;

/// Which engine instance a queued scan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// General admission ticket scan.
    Ticket,
    /// VIP guest-pass check-in.
    VipPass,
}

impl ItemKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Ticket => "ticket",
            ItemKind::VipPass => "vip_pass",
        }
    }

    /// Human-readable noun for messages.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Ticket => "ticket",
            ItemKind::VipPass => "guest pass",
        }
    }

    /// Returns true if the remote status means admission was already recorded
    /// for this kind of entity.
    pub fn is_finalized(&self, status: RemoteStatus) -> bool {
        match self {
            ItemKind::Ticket => matches!(status, RemoteStatus::Used | RemoteStatus::Finalized),
            ItemKind::VipPass => {
                matches!(status, RemoteStatus::CheckedIn | RemoteStatus::Finalized)
            }
        }
    }

    /// All kinds, in display order.
    pub fn all() -> [ItemKind; 2] {
        [ItemKind::Ticket, ItemKind::VipPass]
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ticket" => Ok(ItemKind::Ticket),
            "vip_pass" | "vip" => Ok(ItemKind::VipPass),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Local synchronization state of a queued scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Recorded locally, never attempted.
    Pending,
    /// An attempt is in flight.
    Syncing,
    /// The remote record reflects the scan. Terminal.
    Synced,
    /// The last attempt failed; may be retried after backoff.
    Failed,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Failed => "failed",
        }
    }

    /// Check if a transition from this status to target is valid.
    ///
    /// `syncing -> syncing` is accepted so that an attempt abandoned by an
    /// unclean shutdown can be reclaimed.
    pub fn can_transition_to(&self, target: SyncStatus) -> bool {
        matches!(
            (self, target),
            (SyncStatus::Pending, SyncStatus::Syncing)
                | (SyncStatus::Failed, SyncStatus::Syncing)
                | (SyncStatus::Syncing, SyncStatus::Syncing)
                | (SyncStatus::Syncing, SyncStatus::Synced)
                | (SyncStatus::Syncing, SyncStatus::Failed)
        )
    }

    /// Get valid transition targets as a formatted string.
    pub fn valid_targets(&self) -> String {
        match self {
            SyncStatus::Pending => "syncing".to_string(),
            SyncStatus::Syncing => "synced, failed, syncing (stale reclaim)".to_string(),
            SyncStatus::Synced => "(none, synced is terminal)".to_string(),
            SyncStatus::Failed => "syncing".to_string(),
        }
    }

    /// Returns true if no transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Synced)
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> [SyncStatus; 4] {
        [
            SyncStatus::Pending,
            SyncStatus::Syncing,
            SyncStatus::Synced,
            SyncStatus::Failed,
        ]
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncStatus::Pending),
            "syncing" => Ok(SyncStatus::Syncing),
            "synced" => Ok(SyncStatus::Synced),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A scan recorded at the gate, waiting to reach the remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedItem {
    /// Locally assigned primary key. Never reused.
    pub local_id: i64,
    /// Engine instance this item belongs to.
    pub kind: ItemKind,
    /// Token used to resolve the canonical remote record.
    pub lookup_key: String,
    /// Signature accompanying the lookup key, if the code was signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Staff member who performed the scan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// When the physical scan happened (client clock).
    pub scanned_at: DateTime<Utc>,
    /// Installation that recorded the scan.
    pub device_id: String,
    pub sync_status: SyncStatus,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the most recent failed attempt happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_retry_at: Option<DateTime<Utc>>,
    /// Canonical remote id, learned on the first successful lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_remote_id: Option<String>,
    /// When the current (or last abandoned) attempt claimed the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_started_at: Option<DateTime<Utc>>,
}

impl QueuedItem {
    /// Applies a patch in memory, validating the status transition and
    /// retry-count monotonicity.
    pub fn apply(&mut self, patch: &ItemPatch) -> Result<()> {
        if let Some(target) = patch.sync_status {
            if !self.sync_status.can_transition_to(target) {
                return Err(Error::InvalidTransition {
                    from: self.sync_status.to_string(),
                    to: target.to_string(),
                    valid_targets: self.sync_status.valid_targets(),
                });
            }
        }
        if let Some(count) = patch.retry_count {
            if count < self.retry_count {
                return Err(Error::RetryCountDecrease {
                    local_id: self.local_id,
                    current: self.retry_count,
                    requested: count,
                });
            }
        }

        if let Some(status) = patch.sync_status {
            self.sync_status = status;
        }
        if let Some(count) = patch.retry_count {
            self.retry_count = count;
        }
        if let Some(ref message) = patch.error_message {
            self.error_message = message.clone();
        }
        if let Some(at) = patch.last_retry_at {
            self.last_retry_at = at;
        }
        if let Some(ref remote_id) = patch.resolved_remote_id {
            self.resolved_remote_id = remote_id.clone();
        }
        if let Some(at) = patch.sync_started_at {
            self.sync_started_at = at;
        }
        Ok(())
    }
}

/// Input for a new queue record. Status and retry bookkeeping are assigned by the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScan {
    pub lookup_key: String,
    pub signature: Option<String>,
    pub actor_id: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub device_id: String,
}

impl NewScan {
    pub fn new(
        lookup_key: impl Into<String>,
        device_id: impl Into<String>,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        NewScan {
            lookup_key: lookup_key.into(),
            signature: None,
            actor_id: None,
            scanned_at,
            device_id: device_id.into(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }
}

/// Partial update merged into a stored [`QueuedItem`].
///
/// `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub sync_status: Option<SyncStatus>,
    pub retry_count: Option<u32>,
    pub error_message: Option<Option<String>>,
    pub last_retry_at: Option<Option<DateTime<Utc>>>,
    pub resolved_remote_id: Option<Option<String>>,
    pub sync_started_at: Option<Option<DateTime<Utc>>>,
}

impl ItemPatch {
    /// Claim the item for an attempt starting at `now`.
    pub fn syncing(now: DateTime<Utc>) -> Self {
        ItemPatch {
            sync_status: Some(SyncStatus::Syncing),
            sync_started_at: Some(Some(now)),
            ..Default::default()
        }
    }

    /// Terminal success. `note` is an informational message (conflict resolution).
    pub fn synced(note: Option<String>) -> Self {
        ItemPatch {
            sync_status: Some(SyncStatus::Synced),
            error_message: Some(note),
            sync_started_at: Some(None),
            ..Default::default()
        }
    }

    /// Failed attempt number `retry_count` at `now`.
    pub fn failed(retry_count: u32, reason: impl Into<String>, now: DateTime<Utc>) -> Self {
        ItemPatch {
            sync_status: Some(SyncStatus::Failed),
            retry_count: Some(retry_count),
            error_message: Some(Some(reason.into())),
            last_retry_at: Some(Some(now)),
            sync_started_at: Some(None),
            ..Default::default()
        }
    }

    /// Record the canonical remote id.
    pub fn resolved(remote_id: impl Into<String>) -> Self {
        ItemPatch {
            resolved_remote_id: Some(Some(remote_id.into())),
            ..Default::default()
        }
    }
}

/// Aggregate view of the queue for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub syncing: usize,
    pub synced: usize,
    pub failed: usize,
    pub total: usize,
}

impl StatusCounts {
    /// Adds `count` items of `status`.
    pub fn add(&mut self, status: SyncStatus, count: usize) {
        match status {
            SyncStatus::Pending => self.pending += count,
            SyncStatus::Syncing => self.syncing += count,
            SyncStatus::Synced => self.synced += count,
            SyncStatus::Failed => self.failed += count,
        }
        self.total += count;
    }

    /// Percentage of items that reached the remote authority (0-100).
    ///
    /// An empty queue is fully healthy.
    pub fn health_score(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.synced as f64 / self.total as f64) * 100.0).round() as u8
    }

    /// Items still waiting for the remote authority.
    pub fn outstanding(&self) -> usize {
        self.pending + self.syncing + self.failed
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
