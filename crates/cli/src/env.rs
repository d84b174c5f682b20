// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! Variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the `GATESCAN_LOG` filter directive if set and non-empty.
pub fn log_filter() -> Option<String> {
    non_empty(vars::GATESCAN_LOG)
}

/// Returns `GATESCAN_GATEWAY_URL`, which overrides `[remote] url`.
pub fn gateway_url() -> Option<String> {
    non_empty(vars::GATESCAN_GATEWAY_URL)
}

/// Returns `GATESCAN_ACTOR`, the default staff id attached to scans.
pub fn actor() -> Option<String> {
    non_empty(vars::GATESCAN_ACTOR)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
