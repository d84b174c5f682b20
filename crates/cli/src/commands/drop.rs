// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use gs_core::ItemKind;

use super::{open_station, Station};
use crate::error::{Error, Result};

pub fn run(ids: &[i64]) -> Result<()> {
    let station = open_station()?;
    for (local_id, kind) in run_impl(&station, ids)? {
        println!("Dropped {} #{}", kind.label(), local_id);
    }
    Ok(())
}

/// Delete the given scans from whichever queue holds them.
///
/// All ids are checked before anything is deleted.
pub(crate) fn run_impl(station: &Station, ids: &[i64]) -> Result<Vec<(i64, ItemKind)>> {
    let engines = ItemKind::all()
        .into_iter()
        .map(|kind| station.local_engine(kind))
        .collect::<Result<Vec<_>>>()?;

    let mut owners = Vec::with_capacity(ids.len());
    for &local_id in ids {
        let owner = engines
            .iter()
            .find(|engine| engine.queue().get(local_id).is_ok())
            .ok_or(Error::ScanNotFound(local_id))?;
        owners.push((local_id, owner));
    }

    let mut dropped = Vec::with_capacity(owners.len());
    for (local_id, engine) in owners {
        if engine.delete(local_id)? {
            tracing::info!(kind = %engine.kind(), local_id, "scan dropped");
            dropped.push((local_id, engine.kind()));
        }
    }
    Ok(dropped)
}

#[cfg(test)]
#[path = "drop_tests.rs"]
mod tests;
