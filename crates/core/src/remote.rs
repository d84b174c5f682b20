// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Capability interface to the remote scan authority.
//!
//! The sync executor only talks to the backend through [`ScanAuthority`]:
//! resolve a scanned identifier, optionally verify its signature, and commit
//! the admission. Ticket and guest-pass engines are the same executor over
//! two implementations of this trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::item::ItemKind;

/// Error type for remote authority calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// No candidate identifier resolved to a record.
    #[error("{0} not found")]
    NotFound(String),

    /// The target was already admitted. Treated as a conflict, not a failure.
    #[error("already finalized: {0}")]
    AlreadyFinalized(String),

    /// The record (or its parent order/guest list) does not allow admission.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The authority refused the request for another reason.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The authority could not be reached.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time.
    #[error("remote call timed out after {0}ms")]
    Timeout(u64),
}

impl RemoteError {
    /// Returns true if the error means the desired end state already holds.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::AlreadyFinalized(_))
    }
}

/// Result type for remote authority calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by [`ScanAuthority`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// How a candidate identifier should be interpreted by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Canonical remote id.
    Id,
    /// Opaque QR/NFC token.
    Token,
}

/// One candidate in an ordered resolution list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: String,
}

impl Identifier {
    pub fn id(value: impl Into<String>) -> Self {
        Identifier {
            kind: IdentifierKind::Id,
            value: value.into(),
        }
    }

    pub fn token(value: impl Into<String>) -> Self {
        Identifier {
            kind: IdentifierKind::Token,
            value: value.into(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IdentifierKind::Id => write!(f, "id:{}", self.value),
            IdentifierKind::Token => write!(f, "token:{}", self.value),
        }
    }
}

/// Admission state of the remote entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Unused,
    Used,
    CheckedIn,
    Finalized,
    /// Cancelled, refunded or otherwise withdrawn.
    Revoked,
    #[serde(other)]
    Unknown,
}

impl RemoteStatus {
    /// Wording used in conflict messages ("ticket already used").
    pub fn describe(&self) -> &'static str {
        match self {
            RemoteStatus::Unused => "unused",
            RemoteStatus::Used => "used",
            RemoteStatus::CheckedIn => "checked in",
            RemoteStatus::Finalized => "finalized",
            RemoteStatus::Revoked => "revoked",
            RemoteStatus::Unknown => "in an unknown state",
        }
    }
}

/// Canonical remote record for a scanned ticket or guest pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    pub status: RemoteStatus,
    /// Whether the parent order/guest list still allows admission.
    #[serde(default = "default_true")]
    pub parent_active: bool,
    /// Ancillary display data (holder name, tier, section).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub display: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl RemoteRecord {
    pub fn new(id: impl Into<String>, status: RemoteStatus) -> Self {
        RemoteRecord {
            id: id.into(),
            status,
            parent_active: true,
            display: BTreeMap::new(),
        }
    }
}

/// Why a signature check did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationReason {
    /// The target was already finalized; the check is moot.
    AlreadyProcessed,
    InvalidSignature,
    Expired,
    #[serde(other)]
    Other,
}

/// Outcome of a signature verification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerificationReason>,
}

impl Verification {
    pub fn valid() -> Self {
        Verification {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: VerificationReason) -> Self {
        Verification {
            valid: false,
            reason: Some(reason),
        }
    }

    /// Returns true if the authority reports the target as already finalized.
    pub fn already_processed(&self) -> bool {
        self.reason == Some(VerificationReason::AlreadyProcessed)
    }
}

/// Context sent along with a signature verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyContext {
    pub kind: ItemKind,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
}

/// Admission to record on the remote authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub kind: ItemKind,
    pub remote_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub device_id: String,
}

/// Remote operations the sync executor needs for one item kind.
///
/// Methods return boxed futures so the trait stays object-safe and `Send`.
pub trait ScanAuthority: Send + Sync {
    /// Resolve the first candidate that matches a record, trying them in order.
    fn resolve<'a>(&'a self, candidates: &'a [Identifier]) -> RemoteFuture<'a, RemoteRecord>;

    /// Check a signed code against the authority.
    fn verify_signature<'a>(
        &'a self,
        key: &'a str,
        signature: &'a str,
        context: &'a VerifyContext,
    ) -> RemoteFuture<'a, Verification>;

    /// Mark the record used / checked in.
    fn commit<'a>(&'a self, request: &'a CommitRequest) -> RemoteFuture<'a, ()>;

    /// Returns true if admission was already recorded on this record.
    fn is_finalized(&self, record: &RemoteRecord) -> bool;

    /// Returns true if the record may be admitted now.
    ///
    /// Statuses the client does not recognise are never admitted.
    fn is_admissible(&self, record: &RemoteRecord) -> bool {
        record.parent_active
            && !matches!(record.status, RemoteStatus::Revoked | RemoteStatus::Unknown)
    }
}

impl<A: ScanAuthority + ?Sized> ScanAuthority for Arc<A> {
    fn resolve<'a>(&'a self, candidates: &'a [Identifier]) -> RemoteFuture<'a, RemoteRecord> {
        (**self).resolve(candidates)
    }

    fn verify_signature<'a>(
        &'a self,
        key: &'a str,
        signature: &'a str,
        context: &'a VerifyContext,
    ) -> RemoteFuture<'a, Verification> {
        (**self).verify_signature(key, signature, context)
    }

    fn commit<'a>(&'a self, request: &'a CommitRequest) -> RemoteFuture<'a, ()> {
        (**self).commit(request)
    }

    fn is_finalized(&self, record: &RemoteRecord) -> bool {
        (**self).is_finalized(record)
    }

    fn is_admissible(&self, record: &RemoteRecord) -> bool {
        (**self).is_admissible(record)
    }
}
