// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for gs-core operations.

use thiserror::Error;

/// All possible errors that can occur in gs-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("queued item not found: #{0}")]
    ItemNotFound(i64),

    #[error("invalid sync status transition: cannot go from {from} to {to}\n  hint: from '{from}' the queue allows: {valid_targets}")]
    InvalidTransition {
        from: String,
        to: String,
        valid_targets: String,
    },

    #[error("retry count cannot decrease for #{local_id}: {current} -> {requested}")]
    RetryCountDecrease {
        local_id: i64,
        current: u32,
        requested: u32,
    },

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: pending, syncing, synced, failed")]
    InvalidStatus(String),

    #[error("invalid item kind: '{0}'\n  hint: valid kinds are: ticket, vip_pass")]
    InvalidKind(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("queue lock poisoned")]
    LockPoisoned,
}

/// A specialized Result type for gs-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
