// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.

use clap::Args;
use gs_core::ItemKind;

/// `--vip` flag for commands that act on a single queue.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct VipArg {
    /// Use the guest-pass queue instead of tickets
    #[arg(long)]
    pub vip: bool,
}

impl VipArg {
    pub fn kind(&self) -> ItemKind {
        if self.vip {
            ItemKind::VipPass
        } else {
            ItemKind::Ticket
        }
    }
}

/// `--vip` / `--all` selection for commands that can span both queues.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct KindArgs {
    /// Guest-pass queue only
    #[arg(long, conflicts_with = "all")]
    pub vip: bool,

    /// Both queues
    #[arg(long)]
    pub all: bool,
}

impl KindArgs {
    pub fn kinds(&self) -> Vec<ItemKind> {
        if self.all {
            ItemKind::all().to_vec()
        } else if self.vip {
            vec![ItemKind::VipPass]
        } else {
            vec![ItemKind::Ticket]
        }
    }
}
