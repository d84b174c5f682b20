// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use gs_core::SyncHistoryEntry;

use super::open_station;
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(limit: usize, format: OutputFormat) -> Result<()> {
    let station = open_station()?;
    let entries = station.history.read_recent(limit)?;

    match format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No sync runs recorded");
            }
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

pub(crate) fn format_entry(entry: &SyncHistoryEntry) -> String {
    let mut line = format!(
        "{} {} {} {}: {}/{} synced, {} failed",
        entry.finished_at.format("%Y-%m-%d %H:%M:%S"),
        entry.kind.label(),
        entry.trigger,
        entry.outcome.as_str(),
        entry.succeeded,
        entry.total,
        entry.failed
    );
    if entry.skipped > 0 {
        line.push_str(&format!(", {} skipped", entry.skipped));
    }
    line.push_str(&format!(" in {}ms", entry.duration_ms));
    if let Some(error) = &entry.first_error {
        line.push_str(&format!(" (first error: {})", error));
    }
    line
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
