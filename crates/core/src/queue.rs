// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable queue for scans awaiting sync.
//!
//! The [`ScanQueue`] stores [`QueuedItem`] records for one [`ItemKind`]. Every
//! mutation is a single transaction under the connection lock, so an update to
//! one record is atomic and two attempts can never interleave their status
//! writes for the same `local_id`. Several handles (one per kind, or one per
//! process) may share a database file; WAL mode and a busy timeout cover that.
//! Read-then-write transactions start IMMEDIATE so a second handle waits on
//! the busy timeout instead of failing to upgrade its read snapshot.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::item::{ItemKind, ItemPatch, NewScan, QueuedItem, StatusCounts, SyncStatus};

/// Takes the write lock up front.
fn write_transaction(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// SQL schema for the scan queue database.
pub const SCHEMA: &str = r#"
-- Scans waiting to reach the remote authority
CREATE TABLE IF NOT EXISTS scan_queue (
    local_id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    lookup_key TEXT NOT NULL,
    signature TEXT,
    actor_id TEXT,
    scanned_at TEXT NOT NULL,
    device_id TEXT NOT NULL,
    sync_status TEXT NOT NULL DEFAULT 'pending',
    retry_count INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    last_retry_at TEXT,
    resolved_remote_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_scan_queue_status ON scan_queue(kind, sync_status);
"#;

const ITEM_COLUMNS: &str = "local_id, kind, lookup_key, signature, actor_id, scanned_at,
    device_id, sync_status, retry_count, error_message, last_retry_at,
    resolved_remote_id, sync_started_at";

/// Formats a timestamp for storage.
///
/// Fixed-width millisecond UTC strings sort lexically in time order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value.map(|s| parse_timestamp(&s, column)).transpose()
}

fn row_to_item(row: &Row<'_>) -> std::result::Result<QueuedItem, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let scanned_str: String = row.get(5)?;
    let status_str: String = row.get(7)?;

    Ok(QueuedItem {
        local_id: row.get(0)?,
        kind: parse_db(&kind_str, "kind")?,
        lookup_key: row.get(2)?,
        signature: row.get(3)?,
        actor_id: row.get(4)?,
        scanned_at: parse_timestamp(&scanned_str, "scanned_at")?,
        device_id: row.get(6)?,
        sync_status: parse_db(&status_str, "sync_status")?,
        retry_count: row.get(8)?,
        error_message: row.get(9)?,
        last_retry_at: parse_timestamp_opt(row.get(10)?, "last_retry_at")?,
        resolved_remote_id: row.get(11)?,
        sync_started_at: parse_timestamp_opt(row.get(12)?, "sync_started_at")?,
    })
}

/// Run schema creation and all migrations on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_sync_started_at(conn)?;
    Ok(())
}

/// Migration: Add the claim timestamp used for stale-attempt recovery.
///
/// Queues written before stale recovery existed lack this column.
fn migrate_add_sync_started_at(conn: &Connection) -> Result<()> {
    let has_column: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('scan_queue') WHERE name = 'sync_started_at'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_column {
        conn.execute("ALTER TABLE scan_queue ADD COLUMN sync_started_at TEXT", [])?;
    }
    Ok(())
}

/// Durable, indexed store of queued scans for one item kind.
pub struct ScanQueue {
    conn: Mutex<Connection>,
    kind: ItemKind,
}

impl ScanQueue {
    /// Open a queue database at the given path, creating and migrating if needed.
    pub fn open(path: &Path, kind: ItemKind) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;
             PRAGMA busy_timeout = 5000;",
        )?;
        run_migrations(&conn)?;

        Ok(ScanQueue {
            conn: Mutex::new(conn),
            kind,
        })
    }

    /// Open an in-memory queue (for testing).
    pub fn open_in_memory(kind: ItemKind) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(ScanQueue {
            conn: Mutex::new(conn),
            kind,
        })
    }

    /// The item kind this handle reads and writes.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Record a new scan as `pending` and return its local id.
    ///
    /// Purely local: usable while offline.
    pub fn enqueue(&self, scan: &NewScan) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO scan_queue (kind, lookup_key, signature, actor_id, scanned_at,
             device_id, sync_status, retry_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
            params![
                self.kind.as_str(),
                scan.lookup_key,
                scan.signature,
                scan.actor_id,
                format_timestamp(&scan.scanned_at),
                scan.device_id,
                SyncStatus::Pending.as_str(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a queued item by local id.
    pub fn get(&self, local_id: i64) -> Result<QueuedItem> {
        let conn = self.lock()?;
        read_item(&conn, self.kind, local_id)
    }

    /// All items whose status is in `statuses`, oldest first.
    pub fn select_by_status(&self, statuses: &[SyncStatus]) -> Result<Vec<QueuedItem>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (0..statuses.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM scan_queue
             WHERE kind = ?1 AND sync_status IN ({placeholders})
             ORDER BY local_id"
        );

        let mut values = vec![self.kind.as_str().to_string()];
        values.extend(statuses.iter().map(|s| s.as_str().to_string()));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Every item of this kind, oldest first.
    pub fn select_all(&self) -> Result<Vec<QueuedItem>> {
        let conn = self.lock()?;
        select_all_in(&conn, self.kind)
    }

    /// Failed items that will not be retried automatically.
    pub fn select_exhausted(&self, max_retries: u32) -> Result<Vec<QueuedItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM scan_queue
             WHERE kind = ?1 AND sync_status = ?2 AND retry_count >= ?3
             ORDER BY local_id"
        ))?;
        let items = stmt
            .query_map(
                params![self.kind.as_str(), SyncStatus::Failed.as_str(), max_retries],
                row_to_item,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Merge a partial update into a record atomically and return the result.
    pub fn update(&self, local_id: i64, patch: &ItemPatch) -> Result<QueuedItem> {
        let mut conn = self.lock()?;
        let tx = write_transaction(&mut conn)?;
        let mut item = read_item(&tx, self.kind, local_id)?;
        item.apply(patch)?;
        write_item(&tx, &item)?;
        tx.commit()?;
        Ok(item)
    }

    /// Atomically move a record into `syncing` if nobody else holds it.
    ///
    /// Succeeds for `pending` and `failed` records, and for `syncing` records
    /// whose claim started at or before `stale_before`. Returns `None` when the
    /// record is held by a live attempt or already synced.
    pub fn claim(
        &self,
        local_id: i64,
        now: DateTime<Utc>,
        stale_before: DateTime<Utc>,
    ) -> Result<Option<QueuedItem>> {
        let mut conn = self.lock()?;
        let tx = write_transaction(&mut conn)?;
        let mut item = read_item(&tx, self.kind, local_id)?;

        let claimable = match item.sync_status {
            SyncStatus::Pending | SyncStatus::Failed => true,
            SyncStatus::Syncing => item.sync_started_at.map_or(true, |at| at <= stale_before),
            SyncStatus::Synced => false,
        };
        if !claimable {
            return Ok(None);
        }

        item.apply(&ItemPatch::syncing(now))?;
        write_item(&tx, &item)?;
        tx.commit()?;
        Ok(Some(item))
    }

    /// Remove a record. Returns false if it did not exist.
    pub fn delete(&self, local_id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM scan_queue WHERE local_id = ?1 AND kind = ?2",
            params![local_id, self.kind.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Remove every record matching `predicate`. Returns the number removed.
    pub fn delete_where<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&QueuedItem) -> bool,
    {
        let mut conn = self.lock()?;
        let tx = write_transaction(&mut conn)?;
        let doomed: Vec<i64> = select_all_in(&tx, self.kind)?
            .into_iter()
            .filter(|item| predicate(item))
            .map(|item| item.local_id)
            .collect();

        for local_id in &doomed {
            tx.execute(
                "DELETE FROM scan_queue WHERE local_id = ?1",
                params![local_id],
            )?;
        }
        tx.commit()?;
        Ok(doomed.len())
    }

    /// Aggregate counts per sync status.
    pub fn count_by_status(&self) -> Result<StatusCounts> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sync_status, COUNT(*) FROM scan_queue WHERE kind = ?1 GROUP BY sync_status",
        )?;
        let rows = stmt
            .query_map(params![self.kind.as_str()], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((status, count))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let status: SyncStatus = status.parse()?;
            counts.add(status, usize::try_from(count).unwrap_or(0));
        }
        Ok(counts)
    }
}

fn read_item(conn: &Connection, kind: ItemKind, local_id: i64) -> Result<QueuedItem> {
    let item = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM scan_queue WHERE local_id = ?1 AND kind = ?2"),
            params![local_id, kind.as_str()],
            row_to_item,
        )
        .optional()?;

    item.ok_or(Error::ItemNotFound(local_id))
}

fn select_all_in(conn: &Connection, kind: ItemKind) -> Result<Vec<QueuedItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM scan_queue WHERE kind = ?1 ORDER BY local_id"
    ))?;
    let items = stmt
        .query_map(params![kind.as_str()], row_to_item)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Writes the mutable columns of an item. Immutable columns are never touched.
fn write_item(conn: &Connection, item: &QueuedItem) -> Result<()> {
    conn.execute(
        "UPDATE scan_queue SET sync_status = ?1, retry_count = ?2, error_message = ?3,
         last_retry_at = ?4, resolved_remote_id = ?5, sync_started_at = ?6
         WHERE local_id = ?7",
        params![
            item.sync_status.as_str(),
            item.retry_count,
            item.error_message,
            item.last_retry_at.as_ref().map(format_timestamp),
            item.resolved_remote_id,
            item.sync_started_at.as_ref().map(format_timestamp),
            item.local_id,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
