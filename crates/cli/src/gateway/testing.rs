// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process gateway for transport, client and connection tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use gs_core::{
    IdentifierKind, ItemKind, RemoteRecord, RemoteStatus, Verification, VerificationReason,
};

use super::protocol::{ClientMessage, ErrorCode, ServerMessage};
use super::transport::{Transport, TransportError, TransportFuture};

#[derive(Default)]
struct GatewayState {
    by_token: HashMap<String, String>,
    records: HashMap<String, RemoteRecord>,
    sent: Vec<ClientMessage>,
    connects: usize,
    refused_connects: usize,
    refuse_all: bool,
    break_on_send: bool,
    silent: bool,
    stale_reply_first: bool,
}

/// Scripted gateway shared by every [`MockTransport`] it hands out.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&self, token: &str, id: &str, status: RemoteStatus) {
        self.insert_record(token, RemoteRecord::new(id, status));
    }

    pub fn insert_record(&self, token: &str, record: RemoteRecord) {
        let mut state = self.state.lock().unwrap();
        state.by_token.insert(token.to_string(), record.id.clone());
        state.records.insert(record.id.clone(), record);
    }

    pub fn status_of(&self, id: &str) -> Option<RemoteStatus> {
        self.state.lock().unwrap().records.get(id).map(|r| r.status)
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_connects(&self, n: usize) {
        self.state.lock().unwrap().refused_connects = n;
    }

    pub fn refuse_all(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_all = refuse;
    }

    /// Fail the next send and drop the connection.
    pub fn break_on_send(&self, broken: bool) {
        self.state.lock().unwrap().break_on_send = broken;
    }

    /// Accept requests without ever replying.
    pub fn silence(&self, silent: bool) {
        self.state.lock().unwrap().silent = silent;
    }

    /// Precede every reply with a pong for an unrelated request.
    pub fn stale_reply_first(&self, stale: bool) {
        self.state.lock().unwrap().stale_reply_first = stale;
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|m| matches!(m, ClientMessage::Commit { .. }))
            .count()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn transport(&self) -> MockTransport {
        MockTransport {
            gateway: self.clone(),
            connected: false,
            inbox: VecDeque::new(),
        }
    }

    fn reply(&self, msg: &ClientMessage) -> ServerMessage {
        let mut state = self.state.lock().unwrap();
        match msg {
            ClientMessage::Resolve { id, candidates, .. } => {
                let found = candidates.iter().find_map(|c| {
                    let record_id = match c.kind {
                        IdentifierKind::Id => Some(c.value.clone()),
                        IdentifierKind::Token => state.by_token.get(&c.value).cloned(),
                    };
                    record_id.and_then(|rid| state.records.get(&rid).cloned())
                });
                match found {
                    Some(record) => ServerMessage::Record { id: *id, record },
                    None => ServerMessage::error(
                        Some(*id),
                        ErrorCode::NotFound,
                        candidates
                            .first()
                            .map(|c| c.to_string())
                            .unwrap_or_default(),
                    ),
                }
            }
            ClientMessage::Verify { id, signature, .. } => {
                let verification = if signature.starts_with("bad") {
                    Verification::invalid(VerificationReason::InvalidSignature)
                } else {
                    Verification::valid()
                };
                ServerMessage::Verification {
                    id: *id,
                    verification,
                }
            }
            ClientMessage::Commit { id, request } => {
                let Some(record) = state.records.get_mut(&request.remote_id) else {
                    return ServerMessage::error(
                        Some(*id),
                        ErrorCode::NotFound,
                        request.remote_id.clone(),
                    );
                };
                if request.kind.is_finalized(record.status) {
                    return ServerMessage::error(
                        Some(*id),
                        ErrorCode::AlreadyFinalized,
                        request.remote_id.clone(),
                    );
                }
                record.status = match request.kind {
                    ItemKind::Ticket => RemoteStatus::Used,
                    ItemKind::VipPass => RemoteStatus::CheckedIn,
                };
                ServerMessage::Committed { id: *id }
            }
            ClientMessage::Ping { id } => ServerMessage::Pong { id: *id },
        }
    }
}

/// One connection to a [`MockGateway`].
pub struct MockTransport {
    gateway: MockGateway,
    connected: bool,
    inbox: VecDeque<ServerMessage>,
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let refused = {
                let mut state = self.gateway.state.lock().unwrap();
                state.connects += 1;
                if state.refused_connects > 0 {
                    state.refused_connects -= 1;
                    true
                } else {
                    state.refuse_all
                }
            };
            if refused {
                return Err(TransportError::ConnectionFailed("refused".into()));
            }
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            let (broken, silent, stale) = {
                let mut state = self.gateway.state.lock().unwrap();
                state.sent.push(msg.clone());
                (state.break_on_send, state.silent, state.stale_reply_first)
            };
            if broken {
                self.connected = false;
                return Err(TransportError::SendFailed("broken pipe".into()));
            }
            if !silent {
                if stale {
                    self.inbox.push_back(ServerMessage::Pong { id: 0 });
                }
                let reply = self.gateway.reply(&msg);
                self.inbox.push_back(reply);
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            if let Some(msg) = self.inbox.pop_front() {
                return Ok(Some(msg));
            }
            if !self.connected {
                return Ok(None);
            }
            std::future::pending().await
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
