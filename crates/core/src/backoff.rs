// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry and backoff policy for failed sync attempts.
//!
//! Pure functions over a [`QueuedItem`] and a point in time. The delay doubles
//! per failed attempt from `base_delay` and plateaus at `max_delay`; after
//! `max_retries` failures an item is exhausted and left for the operator.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::item::{QueuedItem, SyncStatus};

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
/// Default ceiling for the retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(60_000);
/// Default number of failed attempts before an item is given up on.
pub const DEFAULT_MAX_RETRIES: u32 = 10;
/// Default age after which a `syncing` item is considered abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// Retry tuning shared by the executor, orchestrator and status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
    /// A `syncing` claim older than this is treated as abandoned.
    pub stale_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

impl RetryPolicy {
    /// `min(base_delay * 2^retry_count, max_delay)`.
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
    }

    /// Returns true if a failed item may be attempted again at `now`.
    pub fn is_eligible_for_retry(&self, item: &QueuedItem, now: DateTime<Utc>) -> bool {
        if item.sync_status != SyncStatus::Failed {
            return false;
        }
        if item.retry_count >= self.max_retries {
            return false;
        }
        match item.last_retry_at {
            None => true,
            Some(last) => elapsed_at_least(last, now, self.backoff_delay(item.retry_count)),
        }
    }

    /// Returns true if the item is `syncing` but its claim is old enough to
    /// have been abandoned by a crashed or killed run.
    pub fn is_stale_claim(&self, item: &QueuedItem, now: DateTime<Utc>) -> bool {
        if item.sync_status != SyncStatus::Syncing {
            return false;
        }
        match item.sync_started_at {
            None => true,
            Some(started) => elapsed_at_least(started, now, self.stale_after),
        }
    }

    /// Returns true if the orchestrator should attempt the item in a run at `now`.
    pub fn is_eligible_now(&self, item: &QueuedItem, now: DateTime<Utc>) -> bool {
        match item.sync_status {
            SyncStatus::Pending => true,
            SyncStatus::Failed => self.is_eligible_for_retry(item, now),
            SyncStatus::Syncing => self.is_stale_claim(item, now),
            SyncStatus::Synced => false,
        }
    }

    /// Returns true if the item failed and will never be retried automatically.
    pub fn is_exhausted(&self, item: &QueuedItem) -> bool {
        item.sync_status == SyncStatus::Failed && item.retry_count >= self.max_retries
    }

    /// Cutoff before which a `syncing` claim counts as stale.
    pub fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.stale_after)
            .ok()
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn elapsed_at_least(since: DateTime<Utc>, now: DateTime<Utc>, delay: Duration) -> bool {
    match (now - since).to_std() {
        Ok(elapsed) => elapsed >= delay,
        // `since` is in the future (clock moved backwards): wait it out.
        Err(_) => delay.is_zero(),
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
