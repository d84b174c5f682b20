// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tracing-subscriber setup.
//!
//! `GATESCAN_LOG` takes an `EnvFilter` directive. One-shot commands log to
//! stderr at `warn` by default; `watch` appends to `.gatescan/gatescan.log`
//! at `info`, falling back to stderr if the file cannot be opened.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";
pub const WATCH_FILTER: &str = "info";

/// Build the filter from `GATESCAN_LOG`, or `default` if unset or invalid.
pub fn filter(default: &str) -> EnvFilter {
    crate::env::log_filter()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

pub fn init_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(DEFAULT_FILTER))
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn init_file(log_path: &Path) {
    let filter = filter(WATCH_FILTER);
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
