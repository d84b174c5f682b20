// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use gs_core::{RemoteStatus, VerificationReason};
use serde_json::json;
use yare::parameterized;

#[test]
fn resolve_wire_format() {
    let msg = ClientMessage::Resolve {
        id: 7,
        kind: ItemKind::VipPass,
        candidates: vec![Identifier::id("pass-9"), Identifier::token("G-9")],
    };
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "resolve",
            "id": 7,
            "kind": "vip_pass",
            "candidates": [
                {"kind": "id", "value": "pass-9"},
                {"kind": "token", "value": "G-9"},
            ],
        })
    );
}

#[test]
fn commit_wire_format_omits_missing_actor() {
    let msg = ClientMessage::Commit {
        id: 3,
        request: CommitRequest {
            kind: ItemKind::Ticket,
            remote_id: "tkt-1".to_string(),
            actor_id: None,
            scanned_at: "2026-05-01T18:00:00Z".parse().unwrap(),
            device_id: "dev-0011223344556677".to_string(),
        },
    };
    let json = msg.to_json().unwrap();
    assert!(json.contains("\"type\":\"commit\""));
    assert!(json.contains("\"remote_id\":\"tkt-1\""));
    assert!(!json.contains("actor_id"));
    assert_eq!(ClientMessage::from_json(&json).unwrap(), msg);
}

#[test]
fn record_response_parses_with_defaults() {
    let msg = ServerMessage::from_json(
        r#"{"type":"record","id":4,"record":{"id":"tkt-4","status":"used"}}"#,
    )
    .unwrap();
    assert_eq!(
        msg,
        ServerMessage::Record {
            id: 4,
            record: RemoteRecord::new("tkt-4", RemoteStatus::Used),
        }
    );
}

#[test]
fn verification_response_parses_reason() {
    let msg = ServerMessage::from_json(
        r#"{"type":"verification","id":5,"verification":{"valid":false,"reason":"ALREADY_PROCESSED"}}"#,
    )
    .unwrap();
    assert_eq!(
        msg,
        ServerMessage::Verification {
            id: 5,
            verification: Verification::invalid(VerificationReason::AlreadyProcessed),
        }
    );
}

#[test]
fn unknown_error_code_is_tolerated() {
    let msg = ServerMessage::from_json(
        r#"{"type":"error","id":9,"code":"quota_exceeded","message":"slow down"}"#,
    )
    .unwrap();
    assert_eq!(
        msg,
        ServerMessage::error(Some(9), ErrorCode::Unknown, "slow down")
    );
}

#[parameterized(
    resolve = { ClientMessage::Resolve { id: 1, kind: ItemKind::Ticket, candidates: vec![] }, 1 },
    ping = { ClientMessage::Ping { id: 99 }, 99 },
)]
fn client_request_id(msg: ClientMessage, expected: u64) {
    assert_eq!(msg.request_id(), expected);
}

#[parameterized(
    committed = { ServerMessage::Committed { id: 2 }, Some(2) },
    pong = { ServerMessage::Pong { id: 8 }, Some(8) },
    request_error = { ServerMessage::error(Some(3), ErrorCode::NotFound, "x"), Some(3) },
    connection_error = { ServerMessage::error(None, ErrorCode::Unavailable, "x"), None },
)]
fn server_request_id(msg: ServerMessage, expected: Option<u64>) {
    assert_eq!(msg.request_id(), expected);
}

#[parameterized(
    not_found = { ErrorCode::NotFound, RemoteError::NotFound("m".into()) },
    finalized = { ErrorCode::AlreadyFinalized, RemoteError::AlreadyFinalized("m".into()) },
    invalid_state = { ErrorCode::InvalidState, RemoteError::InvalidState("m".into()) },
    rejected = { ErrorCode::Rejected, RemoteError::Rejected("m".into()) },
    unknown = { ErrorCode::Unknown, RemoteError::Rejected("m".into()) },
    unavailable = { ErrorCode::Unavailable, RemoteError::Unavailable("m".into()) },
)]
fn error_code_mapping(code: ErrorCode, expected: RemoteError) {
    assert_eq!(code.into_remote_error("m".to_string()), expected);
}
