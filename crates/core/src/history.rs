// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync run history.
//!
//! Each orchestrator run that attempted at least one item produces a
//! [`SyncHistoryEntry`] handed to a [`TelemetrySink`]. Writes are best-effort:
//! the orchestrator logs and ignores sink failures. [`JsonlHistory`] stores
//! entries as JSON lines, one fsynced append per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::item::ItemKind;
use crate::orchestrator::SyncTrigger;

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// No attempted item failed.
    Success,
    /// Some items synced, some failed.
    Partial,
    /// Every attempted item failed.
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Success => "success",
            RunOutcome::Partial => "partial",
            RunOutcome::Failed => "failed",
        }
    }
}

/// One record per completed sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    pub kind: ItemKind,
    pub trigger: SyncTrigger,
    pub outcome: RunOutcome,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(default)]
    pub skipped: usize,
    pub total: usize,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_error: Option<String>,
    pub device_id: String,
    pub finished_at: DateTime<Utc>,
}

/// Destination for sync history entries.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, entry: &SyncHistoryEntry) -> Result<()>;
}

/// Append-only JSONL history file.
#[derive(Debug, Clone)]
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlHistory { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry, oldest first.
    ///
    /// Skips empty lines and returns an empty vec if the file doesn't exist.
    pub fn read_all(&self) -> Result<Vec<SyncHistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    /// The `limit` most recent entries, newest first.
    pub fn read_recent(&self, limit: usize) -> Result<Vec<SyncHistoryEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }
}

impl TelemetrySink for JsonlHistory {
    fn record(&self, entry: &SyncHistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
