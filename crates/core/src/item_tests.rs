// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn sample_item(status: SyncStatus, retry_count: u32) -> QueuedItem {
    QueuedItem {
        local_id: 1,
        kind: ItemKind::Ticket,
        lookup_key: "T-100".to_string(),
        signature: None,
        actor_id: None,
        scanned_at: Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap(),
        device_id: "dev-test".to_string(),
        sync_status: status,
        retry_count,
        error_message: None,
        last_retry_at: None,
        resolved_remote_id: None,
        sync_started_at: None,
    }
}

#[parameterized(
    ticket = { "ticket", ItemKind::Ticket },
    vip_pass = { "vip_pass", ItemKind::VipPass },
    vip_short = { "vip", ItemKind::VipPass },
    ticket_upper = { "TICKET", ItemKind::Ticket },
)]
fn item_kind_from_str(input: &str, expected: ItemKind) {
    assert_eq!(input.parse::<ItemKind>().unwrap(), expected);
}

#[test]
fn item_kind_rejects_unknown() {
    assert!(matches!(
        "wristband".parse::<ItemKind>(),
        Err(Error::InvalidKind(_))
    ));
}

#[parameterized(
    ticket_used = { ItemKind::Ticket, RemoteStatus::Used, true },
    ticket_finalized = { ItemKind::Ticket, RemoteStatus::Finalized, true },
    ticket_unused = { ItemKind::Ticket, RemoteStatus::Unused, false },
    ticket_checked_in = { ItemKind::Ticket, RemoteStatus::CheckedIn, false },
    vip_checked_in = { ItemKind::VipPass, RemoteStatus::CheckedIn, true },
    vip_finalized = { ItemKind::VipPass, RemoteStatus::Finalized, true },
    vip_unused = { ItemKind::VipPass, RemoteStatus::Unused, false },
    vip_revoked = { ItemKind::VipPass, RemoteStatus::Revoked, false },
)]
fn item_kind_finalized_states(kind: ItemKind, status: RemoteStatus, expected: bool) {
    assert_eq!(kind.is_finalized(status), expected);
}

#[parameterized(
    pending = { "pending", SyncStatus::Pending },
    syncing = { "syncing", SyncStatus::Syncing },
    synced = { "synced", SyncStatus::Synced },
    failed = { "FAILED", SyncStatus::Failed },
)]
fn sync_status_round_trips_through_str(input: &str, expected: SyncStatus) {
    let parsed: SyncStatus = input.parse().unwrap();
    assert_eq!(parsed, expected);
    assert_eq!(parsed.as_str(), input.to_lowercase());
}

#[parameterized(
    pending_to_syncing = { SyncStatus::Pending, SyncStatus::Syncing, true },
    failed_to_syncing = { SyncStatus::Failed, SyncStatus::Syncing, true },
    syncing_to_synced = { SyncStatus::Syncing, SyncStatus::Synced, true },
    syncing_to_failed = { SyncStatus::Syncing, SyncStatus::Failed, true },
    syncing_reclaim = { SyncStatus::Syncing, SyncStatus::Syncing, true },
    pending_to_synced = { SyncStatus::Pending, SyncStatus::Synced, false },
    pending_to_failed = { SyncStatus::Pending, SyncStatus::Failed, false },
    failed_to_synced = { SyncStatus::Failed, SyncStatus::Synced, false },
    synced_to_syncing = { SyncStatus::Synced, SyncStatus::Syncing, false },
    synced_to_failed = { SyncStatus::Synced, SyncStatus::Failed, false },
    synced_to_pending = { SyncStatus::Synced, SyncStatus::Pending, false },
)]
fn sync_status_transitions(from: SyncStatus, to: SyncStatus, expected: bool) {
    assert_eq!(from.can_transition_to(to), expected);
}

#[test]
fn only_synced_is_terminal() {
    for status in SyncStatus::all() {
        assert_eq!(status.is_terminal(), status == SyncStatus::Synced);
    }
}

#[test]
fn apply_rejects_leaving_synced() {
    let mut item = sample_item(SyncStatus::Synced, 0);
    let err = item.apply(&ItemPatch::syncing(Utc::now())).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
    assert_eq!(item.sync_status, SyncStatus::Synced);
}

#[test]
fn apply_rejects_retry_count_decrease() {
    let mut item = sample_item(SyncStatus::Syncing, 3);
    let patch = ItemPatch::failed(2, "boom", Utc::now());
    assert!(matches!(
        item.apply(&patch),
        Err(Error::RetryCountDecrease { current: 3, requested: 2, .. })
    ));
    assert_eq!(item.retry_count, 3);
}

#[test]
fn apply_failed_records_attempt() {
    let now = Utc.with_ymd_and_hms(2026, 5, 1, 18, 5, 0).unwrap();
    let mut item = sample_item(SyncStatus::Syncing, 0);
    item.sync_started_at = Some(now);

    item.apply(&ItemPatch::failed(1, "network down", now)).unwrap();

    assert_eq!(item.sync_status, SyncStatus::Failed);
    assert_eq!(item.retry_count, 1);
    assert_eq!(item.error_message.as_deref(), Some("network down"));
    assert_eq!(item.last_retry_at, Some(now));
    assert_eq!(item.sync_started_at, None);
}

#[test]
fn apply_synced_clears_error() {
    let mut item = sample_item(SyncStatus::Syncing, 2);
    item.error_message = Some("old failure".into());

    item.apply(&ItemPatch::synced(None)).unwrap();

    assert_eq!(item.sync_status, SyncStatus::Synced);
    assert_eq!(item.error_message, None);
    assert_eq!(item.retry_count, 2);
}

#[test]
fn apply_without_status_keeps_status() {
    let mut item = sample_item(SyncStatus::Syncing, 0);
    item.apply(&ItemPatch::resolved("tkt_9")).unwrap();
    assert_eq!(item.sync_status, SyncStatus::Syncing);
    assert_eq!(item.resolved_remote_id.as_deref(), Some("tkt_9"));
}

#[test]
fn new_scan_builder() {
    let at = Utc::now();
    let scan = NewScan::new("T-1", "dev-1", at)
        .with_signature("sig")
        .with_actor("staff-7");
    assert_eq!(scan.lookup_key, "T-1");
    assert_eq!(scan.signature.as_deref(), Some("sig"));
    assert_eq!(scan.actor_id.as_deref(), Some("staff-7"));
    assert_eq!(scan.scanned_at, at);
}

#[test]
fn status_counts_health_score() {
    let mut counts = StatusCounts::default();
    assert_eq!(counts.health_score(), 100);

    counts.add(SyncStatus::Synced, 3);
    counts.add(SyncStatus::Pending, 1);
    assert_eq!(counts.total, 4);
    assert_eq!(counts.health_score(), 75);
    assert_eq!(counts.outstanding(), 1);

    counts.add(SyncStatus::Failed, 2);
    counts.add(SyncStatus::Syncing, 2);
    assert_eq!(counts.total, 8);
    assert_eq!(counts.outstanding(), 5);
    assert_eq!(counts.health_score(), 38);
}
