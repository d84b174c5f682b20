// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::{open_station, Station};
use crate::error::Result;

pub fn run() -> Result<()> {
    let station = open_station()?;
    for line in describe(&station)? {
        println!("{}", line);
    }
    Ok(())
}

pub(crate) fn describe(station: &Station) -> Result<Vec<String>> {
    let gateway = station
        .config
        .effective_remote()?
        .map_or_else(|| "none".to_string(), |remote| remote.url);
    Ok(vec![
        format!("Device: {}", station.device.id()),
        format!("Station: {}", station.work_dir.display()),
        format!("Gateway: {}", gateway),
    ])
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
