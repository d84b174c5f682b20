// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::gateway::testing::{MockGateway, MockTransport};
use crate::gateway::Transport;
use gs_core::{
    Connectivity, EngineConfig, EngineContext, JsonlHistory, RemoteError, RemoteStatus,
    ScanEngine, ScanInput, ScanQueue, SyncStatus, SyncTrigger, VerificationReason,
};
use std::time::Duration;
use tempfile::TempDir;

async fn client_for(gateway: &MockGateway) -> Arc<GatewayClient<MockTransport>> {
    let client = Arc::new(GatewayClient::new(
        Duration::from_secs(5),
        Connectivity::new(false),
    ));
    let mut transport = gateway.transport();
    transport.connect("ws://mock").await.unwrap();
    client.install(transport).await;
    client
}

#[tokio::test]
async fn resolve_tries_candidates_in_order() {
    let gateway = MockGateway::new();
    gateway.add_record("T-1", "tkt-1", RemoteStatus::Unused);
    let authority = GatewayAuthority::new(ItemKind::Ticket, client_for(&gateway).await);

    let record = authority
        .resolve(&[Identifier::id("missing"), Identifier::token("T-1")])
        .await
        .unwrap();
    assert_eq!(record.id, "tkt-1");

    let err = authority
        .resolve(&[Identifier::token("T-404")])
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::NotFound("token:T-404".to_string()));
}

#[tokio::test]
async fn verify_passes_context() {
    let gateway = MockGateway::new();
    let authority = GatewayAuthority::new(ItemKind::VipPass, client_for(&gateway).await);
    let context = VerifyContext {
        kind: ItemKind::VipPass,
        device_id: "dev-test".to_string(),
        actor_id: Some("host-2".to_string()),
    };

    let ok = authority
        .verify_signature("G-1", "sig", &context)
        .await
        .unwrap();
    assert!(ok.valid);
    let bad = authority
        .verify_signature("G-1", "bad-sig", &context)
        .await
        .unwrap();
    assert_eq!(bad.reason, Some(VerificationReason::InvalidSignature));

    let sent = gateway.sent();
    assert!(matches!(
        &sent[0],
        ClientMessage::Verify { context: c, .. } if c.actor_id.as_deref() == Some("host-2")
    ));
}

#[tokio::test]
async fn commit_twice_is_a_conflict() {
    let gateway = MockGateway::new();
    gateway.add_record("G-1", "pass-1", RemoteStatus::Unused);
    let authority = GatewayAuthority::new(ItemKind::VipPass, client_for(&gateway).await);
    let request = CommitRequest {
        kind: ItemKind::VipPass,
        remote_id: "pass-1".to_string(),
        actor_id: None,
        scanned_at: chrono::Utc::now(),
        device_id: "dev-test".to_string(),
    };

    authority.commit(&request).await.unwrap();
    assert_eq!(gateway.status_of("pass-1"), Some(RemoteStatus::CheckedIn));
    assert!(authority.commit(&request).await.unwrap_err().is_conflict());
}

#[tokio::test]
async fn finalized_depends_on_kind() {
    let gateway = MockGateway::new();
    let client = client_for(&gateway).await;
    let tickets = GatewayAuthority::new(ItemKind::Ticket, Arc::clone(&client));
    let passes = GatewayAuthority::new(ItemKind::VipPass, client);

    let used = RemoteRecord::new("x", RemoteStatus::Used);
    let checked_in = RemoteRecord::new("x", RemoteStatus::CheckedIn);
    assert!(tickets.is_finalized(&used));
    assert!(!tickets.is_finalized(&checked_in));
    assert!(passes.is_finalized(&checked_in));
    assert!(!passes.is_finalized(&used));
}

#[tokio::test]
async fn offline_authority_reports_unavailable() {
    let client: Arc<GatewayClient<MockTransport>> = Arc::new(GatewayClient::new(
        Duration::from_secs(5),
        Connectivity::new(false),
    ));
    let authority = GatewayAuthority::new(ItemKind::Ticket, client);
    let err = authority
        .resolve(&[Identifier::token("T-1")])
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Unavailable(_)));
}

#[tokio::test]
async fn engines_sync_through_shared_gateway() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("queue.db");
    let gateway = MockGateway::new();
    gateway.add_record("T-1", "tkt-1", RemoteStatus::Unused);
    gateway.add_record("T-2", "tkt-2", RemoteStatus::Used);
    gateway.add_record("G-1", "pass-1", RemoteStatus::Unused);

    let client = client_for(&gateway).await;
    let history = Arc::new(JsonlHistory::new(dir.path().join("history.jsonl")));
    let context = EngineContext::new("dev-test", history.clone())
        .with_connectivity(client.connectivity().clone());

    let tickets = ScanEngine::new(
        EngineConfig::ticket(),
        Arc::new(ScanQueue::open(&db, ItemKind::Ticket).unwrap()),
        GatewayAuthority::new(ItemKind::Ticket, Arc::clone(&client)),
        &context,
    )
    .unwrap();
    let passes = ScanEngine::new(
        EngineConfig::vip(),
        Arc::new(ScanQueue::open(&db, ItemKind::VipPass).unwrap()),
        GatewayAuthority::new(ItemKind::VipPass, Arc::clone(&client)),
        &context,
    )
    .unwrap();

    let fresh = tickets.enqueue(ScanInput::new("T-1")).unwrap();
    let used = tickets.enqueue(ScanInput::new("T-2")).unwrap();
    let missing = tickets.enqueue(ScanInput::new("T-404")).unwrap();
    passes.enqueue(ScanInput::new("G-1")).unwrap();

    let summary = tickets.sync_now(SyncTrigger::Manual).await.unwrap();
    assert_eq!((summary.succeeded, summary.failed), (2, 1));
    assert_eq!(passes.sync_now(SyncTrigger::Manual).await.unwrap().succeeded, 1);

    assert_eq!(tickets.queue().get(fresh).unwrap().sync_status, SyncStatus::Synced);
    let conflict = tickets.queue().get(used).unwrap();
    assert_eq!(conflict.sync_status, SyncStatus::Synced);
    assert!(conflict.error_message.unwrap().contains("already used"));
    let failed = tickets.queue().get(missing).unwrap();
    assert_eq!(failed.sync_status, SyncStatus::Failed);
    assert_eq!(failed.retry_count, 1);

    assert_eq!(gateway.status_of("tkt-1"), Some(RemoteStatus::Used));
    assert_eq!(gateway.status_of("pass-1"), Some(RemoteStatus::CheckedIn));
    assert_eq!(gateway.commit_count(), 2);
    assert_eq!(history.read_all().unwrap().len(), 2);
}
