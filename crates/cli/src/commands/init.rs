// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use gs_core::{ItemKind, ScanQueue};

use super::Station;
use crate::config::{get_db_path, init_work_dir, write_gitignore};
use crate::error::Result;

pub fn run(path: Option<String>, remote: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let station = run_impl(&target_path, remote.as_deref())?;

    println!(
        "Initialized scanning station at {}",
        station.work_dir.display()
    );
    println!("Device: {}", station.device.id());
    match &station.config.remote {
        Some(remote) => println!("Gateway: {}", remote.url),
        None => println!("Gateway: none (scans queue locally until one is configured)"),
    }
    Ok(())
}

/// Create `.gatescan/` under `target_path` with config, queue schema,
/// device id and `.gitignore`.
pub(crate) fn run_impl(target_path: &Path, remote: Option<&str>) -> Result<Station> {
    let work_dir = init_work_dir(target_path, remote)?;
    write_gitignore(&work_dir)?;

    // Opening one queue creates the shared schema.
    ScanQueue::open(&get_db_path(&work_dir), ItemKind::Ticket)?;

    Station::open(work_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
