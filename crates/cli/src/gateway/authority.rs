// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! [`ScanAuthority`] backed by the edge gateway.

use std::sync::Arc;

use gs_core::{
    CommitRequest, Identifier, ItemKind, RemoteFuture, RemoteRecord, ScanAuthority, Verification,
    VerifyContext,
};

use super::client::{unexpected_reply, GatewayClient};
use super::protocol::{ClientMessage, ServerMessage};
use super::transport::Transport;

/// Gateway-backed authority for one item kind. Both kinds share one client.
pub struct GatewayAuthority<T> {
    kind: ItemKind,
    client: Arc<GatewayClient<T>>,
}

impl<T> GatewayAuthority<T> {
    pub fn new(kind: ItemKind, client: Arc<GatewayClient<T>>) -> Self {
        GatewayAuthority { kind, client }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }
}

impl<T: Transport> ScanAuthority for GatewayAuthority<T> {
    fn resolve<'a>(&'a self, candidates: &'a [Identifier]) -> RemoteFuture<'a, RemoteRecord> {
        Box::pin(async move {
            let reply = self
                .client
                .request(|id| ClientMessage::Resolve {
                    id,
                    kind: self.kind,
                    candidates: candidates.to_vec(),
                })
                .await?;
            match reply {
                ServerMessage::Record { record, .. } => Ok(record),
                other => Err(unexpected_reply(other)),
            }
        })
    }

    fn verify_signature<'a>(
        &'a self,
        key: &'a str,
        signature: &'a str,
        context: &'a VerifyContext,
    ) -> RemoteFuture<'a, Verification> {
        Box::pin(async move {
            let reply = self
                .client
                .request(|id| ClientMessage::Verify {
                    id,
                    key: key.to_string(),
                    signature: signature.to_string(),
                    context: context.clone(),
                })
                .await?;
            match reply {
                ServerMessage::Verification { verification, .. } => Ok(verification),
                other => Err(unexpected_reply(other)),
            }
        })
    }

    fn commit<'a>(&'a self, request: &'a CommitRequest) -> RemoteFuture<'a, ()> {
        Box::pin(async move {
            let reply = self
                .client
                .request(|id| ClientMessage::Commit {
                    id,
                    request: request.clone(),
                })
                .await?;
            match reply {
                ServerMessage::Committed { .. } => Ok(()),
                other => Err(unexpected_reply(other)),
            }
        })
    }

    fn is_finalized(&self, record: &RemoteRecord) -> bool {
        self.kind.is_finalized(record.status)
    }
}

#[cfg(test)]
#[path = "authority_tests.rs"]
mod tests;
