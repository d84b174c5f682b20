// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue housekeeping.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::Result;
use crate::item::SyncStatus;
use crate::queue::ScanQueue;

/// Default age after which synced scans are removed.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Delete `synced` items scanned more than `retention` before `now`.
///
/// Failed items are kept regardless of age so exhausted scans stay visible.
pub fn prune_synced(queue: &ScanQueue, retention: Duration, now: DateTime<Utc>) -> Result<usize> {
    let cutoff = chrono::Duration::from_std(retention)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let removed = queue.delete_where(|item| {
        item.sync_status == SyncStatus::Synced && item.scanned_at < cutoff
    })?;
    if removed > 0 {
        tracing::info!(kind = %queue.kind(), removed, "pruned synced scans");
    }
    Ok(removed)
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
