// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use gs_core::{ItemKind, ScanInput};

use super::{open_station, Station};
use crate::error::Result;

pub fn run(
    kind: ItemKind,
    key: String,
    signature: Option<String>,
    actor: Option<String>,
) -> Result<()> {
    let station = open_station()?;
    let display_key = key.trim().to_string();
    let local_id = run_impl(&station, kind, key, signature, actor)?;
    println!("Queued {} #{} ({})", kind.label(), local_id, display_key);
    Ok(())
}

/// Record the scan locally. Never touches the network.
pub(crate) fn run_impl(
    station: &Station,
    kind: ItemKind,
    key: String,
    signature: Option<String>,
    actor: Option<String>,
) -> Result<i64> {
    let engine = station.local_engine(kind)?;
    let input = ScanInput {
        lookup_key: key,
        signature,
        actor_id: Some(resolve_actor(actor)),
        scanned_at: None,
    };
    Ok(engine.enqueue(input)?)
}

/// `--actor`, then `GATESCAN_ACTOR`, then the login name.
fn resolve_actor(actor: Option<String>) -> String {
    actor
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .or_else(crate::env::actor)
        .unwrap_or_else(gs_core::identity::default_actor)
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
