// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use gs_core::{ItemKind, StatusCounts};
use serde::Serialize;

use super::{open_station, Station};
use crate::cli::OutputFormat;
use crate::error::Result;

/// Queue health for one kind, from local state only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct KindStatus {
    pub kind: ItemKind,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub health: u8,
    /// Failed items past the retry limit.
    pub exhausted: usize,
    /// Items a sync started now would attempt.
    pub eligible: usize,
}

pub fn run(kinds: &[ItemKind], format: OutputFormat) -> Result<()> {
    let station = open_station()?;
    let report = collect(&station, kinds)?;

    match format {
        OutputFormat::Text => {
            for status in &report {
                println!("{}", format_status(status));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

pub(crate) fn collect(station: &Station, kinds: &[ItemKind]) -> Result<Vec<KindStatus>> {
    kinds
        .iter()
        .map(|&kind| -> Result<KindStatus> {
            let engine = station.local_engine(kind)?;
            let counts = engine.status()?;
            Ok(KindStatus {
                kind,
                counts,
                health: counts.health_score(),
                exhausted: engine.exhausted()?.len(),
                eligible: engine.eligible()?.len(),
            })
        })
        .collect()
}

pub(crate) fn format_status(status: &KindStatus) -> String {
    let counts = &status.counts;
    let mut line = format!(
        "{}: {} total, {} synced, {} pending, {} syncing, {} failed",
        status.kind.label(),
        counts.total,
        counts.synced,
        counts.pending,
        counts.syncing,
        counts.failed
    );
    if status.exhausted > 0 {
        line.push_str(&format!(" ({} exhausted)", status.exhausted));
    }
    line.push_str(&format!(", health {}%", status.health));
    line
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
