// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use gs_core::{ItemKind, QueuedItem, SyncStatus};

use super::{open_station, Station};
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(
    kind: ItemKind,
    status: Option<SyncStatus>,
    exhausted: bool,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let station = open_station()?;
    let items = select(&station, kind, status, exhausted, limit)?;

    match format {
        OutputFormat::Text => {
            let max_retries = station.config.sync.max_retries;
            for item in &items {
                println!("{}", format_item_line(item, max_retries));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }
    Ok(())
}

/// Items of `kind` in queue order, filtered by status or exhaustion.
pub(crate) fn select(
    station: &Station,
    kind: ItemKind,
    status: Option<SyncStatus>,
    exhausted: bool,
    limit: Option<usize>,
) -> Result<Vec<QueuedItem>> {
    let engine = station.local_engine(kind)?;
    let mut items = if exhausted {
        engine.exhausted()?
    } else {
        engine.items(status)?
    };
    if let Some(n) = limit {
        items.truncate(n);
    }
    Ok(items)
}

pub(crate) fn format_item_line(item: &QueuedItem, max_retries: u32) -> String {
    let mut line = format!(
        "#{} [{}] {} scanned {}",
        item.local_id,
        item.sync_status,
        item.lookup_key,
        item.scanned_at.format("%Y-%m-%d %H:%M:%S")
    );
    if item.retry_count > 0 {
        line.push_str(&format!(" retries {}/{}", item.retry_count, max_retries));
    }
    if let Some(remote_id) = &item.resolved_remote_id {
        line.push_str(&format!(" -> {}", remote_id));
    }
    if let Some(message) = &item.error_message {
        line.push_str(&format!(" ({})", message));
    }
    line
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
