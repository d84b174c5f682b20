// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! gs-core: Offline scan queue and sync engine for gatescan
//!
//! This crate provides the durable scan queue, the retry policy, and the
//! sync executor/orchestrator/driver stack used by the gatescan CLI. The
//! remote backend is reached only through the [`ScanAuthority`] trait.

pub mod backoff;
pub mod clock;
pub mod connectivity;
pub mod driver;
pub mod engine;
pub mod error;
pub mod executor;
pub mod history;
pub mod identity;
pub mod item;
pub mod maintenance;
pub mod orchestrator;
pub mod queue;
pub mod remote;

#[cfg(test)]
mod testing;

pub use backoff::RetryPolicy;
pub use clock::{system_clock, ClockSource, SharedClock, SystemClock};
pub use connectivity::Connectivity;
pub use driver::{AutoSyncDriver, TriggerResult};
pub use engine::{EngineConfig, EngineContext, ScanEngine, ScanInput};
pub use error::{Error, Result};
pub use executor::{SyncExecutor, SyncOutcome};
pub use history::{JsonlHistory, RunOutcome, SyncHistoryEntry, TelemetrySink};
pub use identity::DeviceIdentity;
pub use item::{ItemKind, ItemPatch, NewScan, QueuedItem, StatusCounts, SyncStatus};
pub use orchestrator::{BatchConfig, Orchestrator, SyncSummary, SyncTrigger};
pub use queue::ScanQueue;
pub use remote::{
    CommitRequest, Identifier, IdentifierKind, RemoteError, RemoteFuture, RemoteRecord,
    RemoteResult, RemoteStatus, ScanAuthority, Verification, VerificationReason, VerifyContext,
};
