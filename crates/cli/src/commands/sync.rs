// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use gs_core::{ItemKind, SyncSummary, SyncTrigger};

use super::{gateway_client, open_station, runtime, Station};
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::gateway::{
    ConnectOutcome, ConnectionConfig, ConnectionManager, GatewayClient, Transport,
    WebSocketTransport,
};

/// Connection attempts before a one-shot sync gives up.
const ONE_SHOT_ATTEMPTS: u32 = 3;

pub fn run(kinds: &[ItemKind], retry: bool) -> Result<()> {
    let station = open_station()?;
    let remote = station.remote()?;
    let trigger = if retry {
        SyncTrigger::Retry
    } else {
        SyncTrigger::Manual
    };

    let manager = ConnectionManager::new(
        one_shot_config(&remote),
        gateway_client(&remote),
        WebSocketTransport::default,
    );

    let results = runtime()?.block_on(async {
        connect(&manager, &remote.url).await?;
        let results = run_impl(&station, kinds, trigger, manager.client()).await;
        manager.client().close().await;
        results
    })?;

    for (kind, summary) in &results {
        println!("{}", format_summary(*kind, summary));
    }
    Ok(())
}

/// Connection settings for a foreground sync: a short retry round and no heartbeat.
pub(crate) fn one_shot_config(remote: &RemoteConfig) -> ConnectionConfig {
    let mut config = ConnectionConfig::from(remote);
    config.max_retries = match config.max_retries {
        0 => ONE_SHOT_ATTEMPTS,
        n => n.min(ONE_SHOT_ATTEMPTS),
    };
    config.heartbeat_interval_ms = 0;
    config
}

/// Open the link or report the gateway unreachable.
pub(crate) async fn connect<T, F>(manager: &ConnectionManager<T, F>, url: &str) -> Result<()>
where
    T: Transport + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    match manager.connect_once().await {
        ConnectOutcome::Connected(()) => Ok(()),
        ConnectOutcome::Failed { attempts, error } => Err(Error::GatewayUnavailable {
            url: url.to_string(),
            reason: format!("{} (after {} attempts)", error, attempts),
        }),
        ConnectOutcome::Cancelled => Err(Error::GatewayUnavailable {
            url: url.to_string(),
            reason: "connection cancelled".to_string(),
        }),
    }
}

/// Run one sync per kind, in order, over an installed link.
pub(crate) async fn run_impl<T: Transport + 'static>(
    station: &Station,
    kinds: &[ItemKind],
    trigger: SyncTrigger,
    client: &Arc<GatewayClient<T>>,
) -> Result<Vec<(ItemKind, SyncSummary)>> {
    let mut results = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let engine = station.engine(kind, client)?;
        let summary = engine.sync_now(trigger).await?;
        results.push((kind, summary));
    }
    Ok(results)
}

pub(crate) fn format_summary(kind: ItemKind, summary: &SyncSummary) -> String {
    if summary.total == 0 {
        return format!("{}: nothing to sync", kind.label());
    }
    let mut line = format!(
        "{}: {}/{} synced, {} failed",
        kind.label(),
        summary.succeeded,
        summary.total,
        summary.failed
    );
    if summary.skipped > 0 {
        line.push_str(&format!(", {} already in progress", summary.skipped));
    }
    line
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
