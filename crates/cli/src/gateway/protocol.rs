// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Edge gateway wire messages.
//!
//! Every request carries a client-chosen `id` which the gateway echoes in its
//! response. Errors are tagged with a code that maps onto [`RemoteError`].

use serde::{Deserialize, Serialize};

use gs_core::{
    CommitRequest, Identifier, ItemKind, RemoteError, RemoteRecord, Verification, VerifyContext,
};

/// Messages sent from the scanner to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Look up the first candidate that matches a record.
    Resolve {
        id: u64,
        kind: ItemKind,
        candidates: Vec<Identifier>,
    },

    /// Check a signed code.
    Verify {
        id: u64,
        key: String,
        signature: String,
        context: VerifyContext,
    },

    /// Record an admission.
    Commit { id: u64, request: CommitRequest },

    /// Keepalive.
    Ping { id: u64 },
}

/// Messages sent from the gateway to the scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Record { id: u64, record: RemoteRecord },

    Verification {
        id: u64,
        verification: Verification,
    },

    Committed { id: u64 },

    Pong { id: u64 },

    /// Request failure. `id` is absent for connection-level errors.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        code: ErrorCode,
        message: String,
    },
}

/// Gateway error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    AlreadyFinalized,
    InvalidState,
    Rejected,
    Unavailable,
    #[serde(other)]
    Unknown,
}

impl ErrorCode {
    pub fn into_remote_error(self, message: String) -> RemoteError {
        match self {
            ErrorCode::NotFound => RemoteError::NotFound(message),
            ErrorCode::AlreadyFinalized => RemoteError::AlreadyFinalized(message),
            ErrorCode::InvalidState => RemoteError::InvalidState(message),
            ErrorCode::Rejected | ErrorCode::Unknown => RemoteError::Rejected(message),
            ErrorCode::Unavailable => RemoteError::Unavailable(message),
        }
    }
}

impl ClientMessage {
    pub fn request_id(&self) -> u64 {
        match self {
            ClientMessage::Resolve { id, .. }
            | ClientMessage::Verify { id, .. }
            | ClientMessage::Commit { id, .. }
            | ClientMessage::Ping { id } => *id,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// The request this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Record { id, .. }
            | ServerMessage::Verification { id, .. }
            | ServerMessage::Committed { id }
            | ServerMessage::Pong { id } => Some(*id),
            ServerMessage::Error { id, .. } => *id,
        }
    }

    pub fn error(id: Option<u64>, code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            id,
            code,
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
