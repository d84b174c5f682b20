// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors surfaced by the gatescan CLI.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'gatescan init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("scan not found: #{0}\n  hint: run 'gatescan list' to see queued scans")]
    ScanNotFound(i64),

    #[error("invalid sync status transition: cannot go from {from} to {to}\n  hint: from '{from}' the queue allows: {valid_targets}")]
    InvalidTransition {
        from: String,
        to: String,
        valid_targets: String,
    },

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: pending, syncing, synced, failed")]
    InvalidStatus(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("no gateway configured\n  hint: set [remote] url in .gatescan/config.toml or export GATESCAN_GATEWAY_URL")]
    GatewayNotConfigured,

    #[error("gateway unreachable at {url}: {reason}\n  hint: scans stay queued; run 'gatescan sync' again once the network is back")]
    GatewayUnavailable { url: String, reason: String },

    #[error("a watcher is already running for {0}\n  hint: stop the other 'gatescan watch' first")]
    WatchRunning(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error(transparent)]
    Core(gs_core::Error),
}

/// A specialized Result type for gatescan operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<gs_core::Error> for Error {
    fn from(e: gs_core::Error) -> Self {
        match e {
            gs_core::Error::ItemNotFound(id) => Error::ScanNotFound(id),
            gs_core::Error::InvalidTransition {
                from,
                to,
                valid_targets,
            } => Error::InvalidTransition {
                from,
                to,
                valid_targets,
            },
            gs_core::Error::InvalidStatus(s) => Error::InvalidStatus(s),
            gs_core::Error::InvalidInput(s) => Error::InvalidInput(s),
            gs_core::Error::Io(e) => Error::Io(e),
            gs_core::Error::Json(e) => Error::Json(e),
            gs_core::Error::CorruptedData(s) => Error::CorruptedData(s),
            other => Error::Core(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
