// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground watcher: keeps both engines syncing until Ctrl-C.
//!
//! One watcher per station, enforced with an exclusive lock on
//! `.gatescan/watch.lock`. Logs go to `.gatescan/gatescan.log`.

use std::fs::{File, OpenOptions};
use std::future::Future;
use std::path::Path;

use gs_core::{ItemKind, StatusCounts};
use tracing::{info, warn};

use super::{gateway_client, open_station, runtime, Station};
use crate::config::{get_lock_path, get_log_path};
use crate::error::{Error, Result};
use crate::gateway::{ConnectionConfig, ConnectionManager, Transport, WebSocketTransport};
use crate::logging;

pub fn run() -> Result<()> {
    let station = open_station()?;
    let remote = station.remote()?;
    let _lock = acquire_lock(&get_lock_path(&station.work_dir))?;
    logging::init_file(&get_log_path(&station.work_dir));

    let manager = ConnectionManager::new(
        ConnectionConfig::from(&remote),
        gateway_client(&remote),
        WebSocketTransport::default,
    );

    println!("Watching {} (Ctrl-C to stop)", remote.url);
    let report = runtime()?.block_on(run_impl(&station, &manager, shutdown_signal()))?;
    for (kind, counts) in &report {
        println!(
            "Stopped. {}: {} outstanding, {} synced",
            kind.label(),
            counts.outstanding(),
            counts.synced
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Prune, start both drivers and the link supervisor, then wait for
/// `shutdown`. Returns the final counts per kind.
pub(crate) async fn run_impl<T, F>(
    station: &Station,
    manager: &ConnectionManager<T, F>,
    shutdown: impl Future<Output = ()>,
) -> Result<Vec<(ItemKind, StatusCounts)>>
where
    T: Transport + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    let engines = ItemKind::all()
        .into_iter()
        .map(|kind| station.engine(kind, manager.client()))
        .collect::<Result<Vec<_>>>()?;

    for engine in &engines {
        if let Err(e) = engine.prune() {
            warn!(kind = %engine.kind(), error = %e, "prune failed");
        }
        engine.start();
    }
    let link = manager.spawn();
    info!(device = station.device.id(), "watch started");

    shutdown.await;

    info!("watch stopping");
    for engine in &engines {
        engine.shutdown().await;
    }
    manager.cancel();
    if let Err(e) = link.await {
        warn!(error = %e, "link supervisor ended abnormally");
    }

    engines
        .iter()
        .map(|engine| -> Result<(ItemKind, StatusCounts)> {
            Ok((engine.kind(), engine.status()?))
        })
        .collect()
}

/// Acquire an exclusive lock on the lock file.
pub(crate) fn acquire_lock(lock_path: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;

    file.try_lock_exclusive()
        .map_err(|_| Error::WatchRunning(lock_path.display().to_string()))?;

    Ok(file)
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
