// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use gs_core::ItemKind;

use super::{open_station, Station};
use crate::config::days;
use crate::error::Result;

pub fn run(retention_days: Option<u64>) -> Result<()> {
    let station = open_station()?;
    for (kind, removed) in run_impl(&station, retention_days)? {
        println!("Pruned {} synced {} scan(s)", removed, kind.label());
    }
    Ok(())
}

/// Remove synced scans older than `retention_days`, or the configured
/// retention. Failed and pending scans are never pruned.
pub(crate) fn run_impl(
    station: &Station,
    retention_days: Option<u64>,
) -> Result<Vec<(ItemKind, usize)>> {
    let retention = retention_days
        .map(days)
        .unwrap_or_else(|| station.config.sync.retention());

    ItemKind::all()
        .into_iter()
        .map(|kind| -> Result<(ItemKind, usize)> {
            let removed = station.local_engine(kind)?.prune_older_than(retention)?;
            Ok((kind, removed))
        })
        .collect()
}

#[cfg(test)]
#[path = "prune_tests.rs"]
mod tests;
