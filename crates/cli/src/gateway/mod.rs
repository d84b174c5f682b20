// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Edge gateway link.
//!
//! ```text
//! ┌───────────────┐     ┌───────────────┐     ┌─────────────┐
//! │ ScanEngine    │────►│ GatewayClient │────►│  Transport  │────► gateway
//! │ (per kind)    │◄────│ (request ids) │◄────│   (trait)   │◄────
//! └───────────────┘     └───────────────┘     └─────────────┘
//!         ▲                     ▲
//!         │ Connectivity        │ install / close
//!         └──────── ConnectionManager (backoff, heartbeat)
//! ```

mod authority;
mod client;
mod connection;
mod protocol;
mod transport;

pub use authority::GatewayAuthority;
pub use client::GatewayClient;
pub use connection::{ConnectOutcome, ConnectionConfig, ConnectionManager};
pub use protocol::{ClientMessage, ErrorCode, ServerMessage};
pub use transport::{Transport, TransportError, WebSocketTransport};

#[cfg(test)]
pub(crate) mod testing;
