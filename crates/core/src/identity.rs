// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Device and operator identity.
//!
//! Every queued scan records the installation that produced it. The device id
//! is generated once, persisted next to the queue, and reused across restarts.

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Prefix of every generated device id.
pub const DEVICE_ID_PREFIX: &str = "dev-";

/// Stable per-installation identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    id: String,
    path: PathBuf,
}

impl DeviceIdentity {
    /// Load the persisted id at `path`, generating and writing one on first use.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if let Some(id) = read_id(path)? {
            return Ok(DeviceIdentity {
                id,
                path: path.to_path_buf(),
            });
        }

        let id = generate_device_id(&host_seed(), &Utc::now());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, format!("{id}\n"))?;
        tracing::info!(device_id = %id, path = %path.display(), "generated device id");

        Ok(DeviceIdentity {
            id,
            path: path.to_path_buf(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// File the id is persisted in.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Generate a device id from a seed and a timestamp.
/// Format: `dev-{hash}` where hash is the first 16 hex chars of SHA256(seed + timestamp).
pub fn generate_device_id(seed: &str, at: &DateTime<Utc>) -> String {
    let input = format!("{}{}", seed, at.to_rfc3339());
    let hash = Sha256::digest(input.as_bytes());
    format!("{}{}", DEVICE_ID_PREFIX, hex::encode(&hash[..8]))
}

/// Validate that a persisted device id is well formed.
pub fn validate_device_id(id: &str) -> bool {
    id.strip_prefix(DEVICE_ID_PREFIX).is_some_and(|hash| {
        hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit())
    })
}

fn read_id(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let id = content.trim();
    if id.is_empty() {
        return Ok(None);
    }
    if !validate_device_id(id) {
        return Err(Error::CorruptedData(format!(
            "invalid device id '{}' in {}",
            id,
            path.display()
        )));
    }
    Ok(Some(id.to_string()))
}

fn host_seed() -> String {
    let user = get_unix_username().unwrap_or_default();
    format!("{}:{}", user, std::process::id())
}

/// Returns the operator name recorded as the scan actor when none is given.
///
/// Resolution order:
/// 1. Unix username from USER or LOGNAME env var (if not system account)
/// 2. Fallback to "gate"
pub fn default_actor() -> String {
    if let Some(name) = get_unix_username() {
        if !is_system_account(&name) {
            return name;
        }
    }
    "gate".to_string()
}

fn get_unix_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn is_system_account(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "root" | "system" | "administrator" | "admin" | "daemon" | "nobody"
    )
}
