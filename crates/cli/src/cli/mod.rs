// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::{KindArgs, VipArg};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Status filter accepted by `list --status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl From<StatusFilter> for gs_core::SyncStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Pending => gs_core::SyncStatus::Pending,
            StatusFilter::Syncing => gs_core::SyncStatus::Syncing,
            StatusFilter::Synced => gs_core::SyncStatus::Synced,
            StatusFilter::Failed => gs_core::SyncStatus::Failed,
        }
    }
}

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Scanning:
  scan        Queue a ticket or guest-pass scan
  status      Show queue health
  list        List queued scans
  drop        Remove queued scans

Sync:
  sync        Push queued scans to the gateway now
  watch       Keep syncing in the background until Ctrl-C
  history     Show recent sync runs

Setup & Maintenance:
  init        Initialize a scanning station
  device      Show this station's device id
  prune       Remove old synced scans
";

const QUICKSTART_HELP: &str = "\
Get started:
  gatescan init --remote ws://gate:7890   Initialize a station
  gatescan scan T-1042                    Queue a ticket scan (works offline)
  gatescan scan G-77 --vip                Queue a guest-pass check-in
  gatescan status --all                   Show queue health
  gatescan sync --all                     Push everything now";

#[derive(Parser)]
#[command(name = "gatescan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_version_flag = true)]
#[command(about = "Offline-first ticket and guest-pass scanning with background sync")]
#[command(
    long_about = "Offline-first ticket and guest-pass scanning.\n\n\
    Scans are queued locally and synced to the venue gateway whenever it is reachable."
)]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Run as if gatescan was started in <path>
    #[arg(short = 'C', long = "directory", global = true, value_name = "path")]
    pub directory: Option<String>,

    /// Print version
    #[arg(short = 'v', short_alias = 'V', long = "version", action = clap::ArgAction::Version)]
    version: (),

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────────────────
    /// Queue a scan. Never touches the network.
    #[command(
        arg_required_else_help = true,
        after_help = "Examples:\n  \
        gatescan scan T-1042                     Queue a ticket scan\n  \
        gatescan scan G-77 --vip                 Queue a guest-pass check-in\n  \
        gatescan scan T-9 --signature 3f9a...    Queue a signed code\n  \
        gatescan scan T-9 --actor staff-4        Record who scanned"
    )]
    Scan {
        /// Scanned token or id
        #[arg(value_parser = non_empty_string)]
        key: String,

        #[command(flatten)]
        vip: VipArg,

        /// Signature that came with a signed code
        #[arg(long)]
        signature: Option<String>,

        /// Staff member scanning (default: GATESCAN_ACTOR or the login name)
        #[arg(long, short)]
        actor: Option<String>,
    },

    /// Show queue health per kind
    #[command(after_help = "Examples:\n  \
        gatescan status              Ticket queue\n  \
        gatescan status --vip        Guest-pass queue\n  \
        gatescan status --all -o json")]
    Status {
        #[command(flatten)]
        kinds: KindArgs,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List queued scans
    #[command(after_help = "Examples:\n  \
        gatescan list                    All ticket scans\n  \
        gatescan list -s failed          Failed ticket scans\n  \
        gatescan list --vip --exhausted  Guest passes that gave up retrying")]
    List {
        #[command(flatten)]
        vip: VipArg,

        /// Only scans with this sync status
        #[arg(long, short, value_enum, conflicts_with = "exhausted")]
        status: Option<StatusFilter>,

        /// Only failed scans that will not be retried automatically
        #[arg(long)]
        exhausted: bool,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Remove queued scans by local id
    #[command(arg_required_else_help = true)]
    Drop {
        /// Local id(s), as shown by 'gatescan list'
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────
    /// Push eligible scans to the gateway now
    #[command(after_help = "Examples:\n  \
        gatescan sync                Sync tickets\n  \
        gatescan sync --all          Sync tickets and guest passes\n  \
        gatescan sync --retry        Record the run as an operator retry")]
    Sync {
        #[command(flatten)]
        kinds: KindArgs,

        /// Record the run as a retry of failed scans
        #[arg(long)]
        retry: bool,
    },

    /// Keep both queues syncing until interrupted
    Watch,

    /// Show recent sync runs, newest first
    History {
        /// Maximum number of runs
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Setup & Maintenance
    // ─────────────────────────────────────────────────────────────────────────
    /// Initialize a scanning station in the current directory (or specified path)
    #[command(after_help = "Examples:\n  \
        gatescan init                          Offline-only station\n  \
        gatescan init --remote wss://edge:443  Station with a gateway")]
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(long)]
        path: Option<String>,

        /// Gateway WebSocket URL (ws:// or wss://)
        #[arg(long)]
        remote: Option<String>,
    },

    /// Show this station's device id
    Device,

    /// Remove synced scans older than the retention period
    Prune {
        /// Retention in days (default: [sync] retention_days)
        #[arg(long)]
        days: Option<u64>,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
