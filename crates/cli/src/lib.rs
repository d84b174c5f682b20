// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! gatescan - offline-first ticket and guest-pass scanning.
//!
//! This crate provides the `gatescan` CLI on top of [`gs_core`]: the
//! `.gatescan/` station directory, configuration, the WebSocket gateway
//! client that implements [`gs_core::ScanAuthority`], and the commands.
//!
//! # Station layout
//!
//! ```text
//! .gatescan/
//!   config.toml          [remote], [sync], [tickets], [vip]
//!   queue.db             both scan queues (SQLite)
//!   device_id            stable station id
//!   sync_history.jsonl   one line per sync run
//!   gatescan.log         `watch` log
//!   watch.lock           held while `watch` runs
//! ```
//!
//! ```rust,ignore
//! use gatescan::{init_work_dir, find_work_dir, Config};
//!
//! let work_dir = init_work_dir(Path::new("."), Some("ws://gate:7890"))?;
//! let config = Config::load(&find_work_dir()?)?;
//! ```

mod cli;
mod commands;
pub mod config;
pub mod env;
pub mod error;
pub mod gateway;
mod logging;

pub use cli::{Cli, Command, KindArgs, OutputFormat, StatusFilter, VipArg};
pub use config::{find_work_dir, init_work_dir, Config, RemoteConfig};
pub use error::{Error, Result};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    if !matches!(command, Command::Watch) {
        logging::init_stderr();
    }

    match command {
        Command::Init { path, remote } => commands::init::run(path, remote),
        Command::Scan {
            key,
            vip,
            signature,
            actor,
        } => commands::scan::run(vip.kind(), key, signature, actor),
        Command::Status { kinds, output } => commands::status::run(&kinds.kinds(), output),
        Command::List {
            vip,
            status,
            exhausted,
            limit,
            output,
        } => commands::list::run(vip.kind(), status.map(Into::into), exhausted, limit, output),
        Command::Drop { ids } => commands::drop::run(&ids),
        Command::Sync { kinds, retry } => commands::sync::run(&kinds.kinds(), retry),
        Command::Watch => commands::watch::run(),
        Command::History { limit, output } => commands::history::run(limit, output),
        Command::Device => commands::device::run(),
        Command::Prune { days } => commands::prune::run(days),
    }
}

/// Run `command` as if started in `directory`.
pub fn run_in(directory: Option<&str>, command: Command) -> Result<()> {
    if let Some(dir) = directory {
        std::env::set_current_dir(dir).map_err(|e| {
            Error::InvalidInput(format!("cannot change to directory '{}': {}", dir, e))
        })?;
    }
    run(command)
}
