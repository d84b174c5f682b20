// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `gatescan` with the environment overrides cleared.
pub fn gatescan() -> Command {
    let mut cmd = cargo_bin_cmd!("gatescan");
    cmd.env_remove("GATESCAN_GATEWAY_URL")
        .env_remove("GATESCAN_ACTOR")
        .env_remove("GATESCAN_LOG");
    cmd
}

/// Helper to create an initialized station without a gateway.
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    gatescan()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to create a station pointing at an unreachable gateway.
pub fn init_temp_with_remote() -> TempDir {
    let temp = TempDir::new().unwrap();
    gatescan()
        .args(["init", "--remote", "ws://127.0.0.1:9"])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Queue a scan and return its local id, parsed from the output.
pub fn scan(temp: &TempDir, args: &[&str]) -> i64 {
    let output = gatescan()
        .arg("scan")
        .args(args)
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "scan failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split('#')
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|id| id.parse().ok())
        .unwrap()
}
