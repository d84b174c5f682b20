// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.gatescan/config.toml`:
//! - `[remote]`: edge gateway URL and connection tuning (absent = offline only)
//! - `[sync]`: auto-sync interval, retry policy and retention
//! - `[tickets]` / `[vip]`: per-engine batch size and delay

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gs_core::{BatchConfig, EngineConfig, ItemKind, RetryPolicy};

use crate::error::{Error, Result};

pub const WORK_DIR_NAME: &str = ".gatescan";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "queue.db";
const DEVICE_FILE_NAME: &str = "device_id";
const HISTORY_FILE_NAME: &str = "sync_history.jsonl";
const LOG_FILE_NAME: &str = "gatescan.log";
const LOCK_FILE_NAME: &str = "watch.lock";
const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Project configuration stored in `.gatescan/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Edge gateway connection (optional - if absent, scans are only queued).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(
        default = "BatchSettings::tickets",
        deserialize_with = "BatchSettings::tickets_section"
    )]
    pub tickets: BatchSettings,
    #[serde(
        default = "BatchSettings::vip",
        deserialize_with = "BatchSettings::vip_section"
    )]
    pub vip: BatchSettings,
}

/// Edge gateway connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL: `ws://...` or `wss://...`.
    pub url: String,
    /// Maximum connection attempts per round (default: 10). 0 = unlimited.
    #[serde(default = "default_reconnect_max_retries")]
    pub reconnect_max_retries: u32,
    /// Maximum delay between connection attempts in seconds (default: 30).
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,
    /// Delay before the first reconnection attempt in milliseconds (default: 100).
    #[serde(default = "default_reconnect_initial_delay_ms")]
    pub reconnect_initial_delay_ms: u64,
    /// Max time to wait for a gateway response in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Heartbeat ping interval in milliseconds (default: 30000). 0 = disabled.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_reconnect_max_retries() -> u32 {
    10
}

fn default_reconnect_max_delay_secs() -> u64 {
    30
}

fn default_reconnect_initial_delay_ms() -> u64 {
    100
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            reconnect_max_retries: default_reconnect_max_retries(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            reconnect_initial_delay_ms: default_reconnect_initial_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Sync scheduling and retry settings shared by both engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Auto-sync timer period in milliseconds (default: 5000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Delay before the first retry in milliseconds (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Ceiling for the retry delay in milliseconds (default: 60000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Failed attempts before a scan is left for the operator (default: 10).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Age in seconds after which a `syncing` claim is reclaimed (default: 60).
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Days a synced scan is kept before `prune` removes it (default: 7).
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

fn default_interval_ms() -> u64 {
    5_000
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_max_retries() -> u32 {
    10
}

fn default_stale_after_secs() -> u64 {
    60
}

fn default_retention_days() -> u64 {
    7
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            interval_ms: default_interval_ms(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_retries: default_max_retries(),
            stale_after_secs: default_stale_after_secs(),
            retention_days: default_retention_days(),
        }
    }
}

impl SyncSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_retries: self.max_retries,
            stale_after: Duration::from_secs(self.stale_after_secs),
        }
    }

    pub fn retention(&self) -> Duration {
        days(self.retention_days)
    }
}

/// Batch tuning for one engine.
///
/// Ticket and VIP sections default differently, so a section is read as
/// overrides on top of its engine's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

#[derive(Deserialize)]
struct BatchOverrides {
    batch_size: Option<usize>,
    batch_delay_ms: Option<u64>,
}

impl BatchOverrides {
    fn over(self, base: BatchSettings) -> BatchSettings {
        BatchSettings {
            batch_size: self.batch_size.unwrap_or(base.batch_size),
            batch_delay_ms: self.batch_delay_ms.unwrap_or(base.batch_delay_ms),
        }
    }
}

impl BatchSettings {
    pub fn tickets() -> Self {
        BatchSettings {
            batch_size: 5,
            batch_delay_ms: 100,
        }
    }

    pub fn vip() -> Self {
        BatchSettings {
            batch_size: 3,
            batch_delay_ms: 200,
        }
    }

    fn tickets_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        BatchOverrides::deserialize(d).map(|o| o.over(Self::tickets()))
    }

    fn vip_section<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        BatchOverrides::deserialize(d).map(|o| o.over(Self::vip()))
    }
}

/// Converts a day count to a duration.
pub fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(24 * 60 * 60))
}

impl Config {
    /// Creates a config, optionally pointing at a gateway.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is not a WebSocket URL.
    pub fn new(remote_url: Option<&str>) -> Result<Self> {
        let remote = match remote_url {
            Some(url) => {
                validate_remote_url(url)?;
                Some(RemoteConfig::new(url))
            }
            None => None,
        };
        Ok(Config {
            remote,
            ..Config::default_tuning()
        })
    }

    fn default_tuning() -> Self {
        Config {
            remote: None,
            sync: SyncSettings::default(),
            tickets: BatchSettings::tickets(),
            vip: BatchSettings::vip(),
        }
    }

    /// Loads configuration from the given `.gatescan/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        if let Some(remote) = &config.remote {
            validate_remote_url(&remote.url)?;
        }
        Ok(config)
    }

    /// Saves configuration to the given `.gatescan/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Remote settings for the effective gateway URL, if any.
    ///
    /// `GATESCAN_GATEWAY_URL` takes precedence over `[remote] url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the override is not a WebSocket URL.
    pub fn effective_remote(&self) -> Result<Option<RemoteConfig>> {
        self.remote_with_override(crate::env::gateway_url())
    }

    fn remote_with_override(&self, url: Option<String>) -> Result<Option<RemoteConfig>> {
        if let Some(url) = &url {
            validate_remote_url(url)?;
        }
        Ok(match (url, &self.remote) {
            (Some(url), Some(remote)) => Some(RemoteConfig {
                url,
                ..remote.clone()
            }),
            (Some(url), None) => Some(RemoteConfig::new(url)),
            (None, remote) => remote.clone(),
        })
    }

    /// Engine tuning for `kind` from this configuration.
    pub fn engine_config(&self, kind: ItemKind) -> EngineConfig {
        let batch = match kind {
            ItemKind::Ticket => self.tickets,
            ItemKind::VipPass => self.vip,
        };
        EngineConfig {
            kind,
            batch: BatchConfig {
                size: batch.batch_size.max(1),
                delay: Duration::from_millis(batch.batch_delay_ms),
            },
            policy: self.sync.retry_policy(),
            sync_interval: Duration::from_millis(self.sync.interval_ms.max(1)),
            retention: self.sync.retention(),
        }
    }
}

fn validate_remote_url(url: &str) -> Result<()> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "unsupported gateway url '{}': expected ws:// or wss://",
            url
        )))
    }
}

/// Find the .gatescan directory by walking up from the current directory.
pub fn find_work_dir() -> Result<PathBuf> {
    find_work_dir_from(&std::env::current_dir()?)
}

/// Find the .gatescan directory by walking up from `start`.
pub fn find_work_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

pub fn get_db_path(work_dir: &Path) -> PathBuf {
    work_dir.join(DB_FILE_NAME)
}

pub fn get_device_path(work_dir: &Path) -> PathBuf {
    work_dir.join(DEVICE_FILE_NAME)
}

pub fn get_history_path(work_dir: &Path) -> PathBuf {
    work_dir.join(HISTORY_FILE_NAME)
}

pub fn get_log_path(work_dir: &Path) -> PathBuf {
    work_dir.join(LOG_FILE_NAME)
}

pub fn get_lock_path(work_dir: &Path) -> PathBuf {
    work_dir.join(LOCK_FILE_NAME)
}

/// Initialize a new .gatescan directory at the given path.
pub fn init_work_dir(path: &Path, remote_url: Option<&str>) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let config = Config::new(remote_url)?;
    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;

    Ok(work_dir)
}

/// Write a .gitignore file to the work directory.
///
/// Everything but `config.toml` is device-local state.
pub fn write_gitignore(work_dir: &Path) -> Result<()> {
    let content = format!(
        "# Device-local state\n{}\n{}\n{}\n{}\n{}\n{}\n",
        DB_FILE_NAME,
        DEVICE_FILE_NAME,
        HISTORY_FILE_NAME,
        LOG_FILE_NAME,
        LOCK_FILE_NAME,
        "queue.db-*"
    );
    fs::write(work_dir.join(GITIGNORE_FILE_NAME), content)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
