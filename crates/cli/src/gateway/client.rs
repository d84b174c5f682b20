// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response client over a gateway [`Transport`].
//!
//! Round trips are serialized through one transport lock; each request gets a
//! fresh numeric id and replies for other ids are discarded. A transport error
//! drops the connection and marks the shared [`Connectivity`] offline so the
//! connection manager can reconnect.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use gs_core::{Connectivity, RemoteError, RemoteResult};

use super::protocol::{ClientMessage, ServerMessage};
use super::transport::{Transport, TransportError, TransportResult};

pub struct GatewayClient<T> {
    transport: Mutex<Option<T>>,
    next_id: AtomicU64,
    timeout: Duration,
    connectivity: Connectivity,
}

impl<T: Transport> GatewayClient<T> {
    /// Create a disconnected client. `connectivity` is flipped as links come and go.
    pub fn new(timeout: Duration, connectivity: Connectivity) -> Self {
        GatewayClient {
            transport: Mutex::new(None),
            next_id: AtomicU64::new(1),
            timeout,
            connectivity,
        }
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Adopt a connected transport and report the gateway reachable.
    pub async fn install(&self, transport: T) {
        *self.transport.lock().await = Some(transport);
        self.connectivity.set_online(true);
    }

    /// Drop the current transport, if any, and report the gateway unreachable.
    pub async fn close(&self) {
        let taken = self.transport.lock().await.take();
        if let Some(mut transport) = taken {
            let _ = transport.disconnect().await;
        }
        self.connectivity.set_online(false);
    }

    pub async fn is_connected(&self) -> bool {
        self.transport
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| t.is_connected())
    }

    /// Send one request and wait for the reply carrying its id.
    pub async fn request(
        &self,
        build: impl FnOnce(u64) -> ClientMessage + Send,
    ) -> RemoteResult<ServerMessage> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let msg = build(id);

        let mut slot = self.transport.lock().await;
        let Some(transport) = slot.as_mut().filter(|t| t.is_connected()) else {
            return Err(RemoteError::Unavailable(
                "not connected to gateway".to_string(),
            ));
        };

        match tokio::time::timeout(self.timeout, exchange(transport, msg, id)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => {
                tracing::warn!(request_id = id, error = %e, "gateway link failed");
                if let Some(mut broken) = slot.take() {
                    let _ = broken.disconnect().await;
                }
                drop(slot);
                self.connectivity.set_online(false);
                Err(RemoteError::Unavailable(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(request_id = id, "gateway request timed out");
                Err(RemoteError::Timeout(self.timeout.as_millis() as u64))
            }
        }
    }

    /// Keepalive round trip.
    pub async fn ping(&self) -> RemoteResult<()> {
        match self.request(|id| ClientMessage::Ping { id }).await? {
            ServerMessage::Pong { .. } => Ok(()),
            other => Err(unexpected_reply(other)),
        }
    }
}

async fn exchange<T: Transport>(
    transport: &mut T,
    msg: ClientMessage,
    id: u64,
) -> TransportResult<ServerMessage> {
    transport.send(msg).await?;
    loop {
        match transport.recv().await? {
            Some(reply) if reply.request_id() == Some(id) => return Ok(reply),
            // Connection-level errors answer whatever is in flight.
            Some(reply @ ServerMessage::Error { id: None, .. }) => return Ok(reply),
            Some(stale) => {
                tracing::debug!(request_id = id, reply_id = ?stale.request_id(), "discarding stale reply");
            }
            None => return Err(TransportError::ConnectionClosed),
        }
    }
}

/// Maps a reply of the wrong shape to a [`RemoteError`].
pub fn unexpected_reply(reply: ServerMessage) -> RemoteError {
    match reply {
        ServerMessage::Error { code, message, .. } => code.into_remote_error(message),
        other => RemoteError::Rejected(format!("unexpected gateway reply: {:?}", other)),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
