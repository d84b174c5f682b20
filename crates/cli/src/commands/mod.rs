// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod device;
pub mod drop;
pub mod history;
pub mod init;
pub mod list;
pub mod prune;
pub mod scan;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use gs_core::{
    Connectivity, DeviceIdentity, EngineContext, ItemKind, JsonlHistory, ScanEngine, ScanQueue,
};

use crate::config::{
    find_work_dir, get_db_path, get_device_path, get_history_path, Config, RemoteConfig,
};
use crate::error::{Error, Result};
use crate::gateway::{GatewayAuthority, GatewayClient, Transport, WebSocketTransport};

/// Engine type used by the commands.
pub type StationEngine<T = WebSocketTransport> = ScanEngine<GatewayAuthority<T>>;

/// An initialized `.gatescan/` directory with its config, device id and history.
pub struct Station {
    pub work_dir: PathBuf,
    pub config: Config,
    pub device: DeviceIdentity,
    pub history: Arc<JsonlHistory>,
}

impl Station {
    pub fn open(work_dir: PathBuf) -> Result<Self> {
        let config = Config::load(&work_dir)?;
        let device = DeviceIdentity::load_or_create(&get_device_path(&work_dir))?;
        let history = Arc::new(JsonlHistory::new(get_history_path(&work_dir)));
        Ok(Station {
            work_dir,
            config,
            device,
            history,
        })
    }

    pub fn queue(&self, kind: ItemKind) -> Result<Arc<ScanQueue>> {
        Ok(Arc::new(ScanQueue::open(&get_db_path(&self.work_dir), kind)?))
    }

    /// Build the engine for `kind`, talking to the gateway through `client`.
    pub fn engine<T: Transport + 'static>(
        &self,
        kind: ItemKind,
        client: &Arc<GatewayClient<T>>,
    ) -> Result<StationEngine<T>> {
        let history: Arc<dyn gs_core::TelemetrySink> = self.history.clone();
        let context = EngineContext::new(self.device.id(), history)
            .with_connectivity(client.connectivity().clone());
        Ok(ScanEngine::new(
            self.config.engine_config(kind),
            self.queue(kind)?,
            GatewayAuthority::new(kind, Arc::clone(client)),
            &context,
        )?)
    }

    /// Engine over a client that never connects. Local operations only.
    pub fn local_engine(&self, kind: ItemKind) -> Result<StationEngine> {
        self.engine(kind, &offline_client())
    }

    /// Effective gateway settings, or an error if none are configured.
    pub fn remote(&self) -> Result<RemoteConfig> {
        self.config
            .effective_remote()?
            .ok_or(Error::GatewayNotConfigured)
    }
}

/// Helper to open the station from the current context.
pub fn open_station() -> Result<Station> {
    Station::open(find_work_dir()?)
}

/// Disconnected WebSocket client for `remote`.
pub fn gateway_client(remote: &RemoteConfig) -> Arc<GatewayClient<WebSocketTransport>> {
    Arc::new(GatewayClient::new(
        remote.request_timeout(),
        Connectivity::new(false),
    ))
}

fn offline_client() -> Arc<GatewayClient<WebSocketTransport>> {
    Arc::new(GatewayClient::new(
        std::time::Duration::from_secs(1),
        Connectivity::new(false),
    ))
}

/// Tokio runtime for commands that talk to the gateway.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))
}
