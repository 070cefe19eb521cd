// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed local replica store.
//!
//! The [`Database`] struct provides keyed access to issues, comments,
//! pending operations, conflicts and per-connection sync metadata, plus a
//! change feed ([`Database::subscribe`]) that fires after each committed
//! write.

mod comments;
mod conflicts;
mod issues;
mod meta;
mod pending;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::path::Path;
use tokio::sync::broadcast;

use crate::error::{Error, Result};
use crate::issue::{Replica, SyncStatus};
use crate::op::EntityType;

pub use meta::SyncMeta;

/// SQL schema for the replica database.
pub const SCHEMA: &str = r#"
-- Replicated issues plus local bookkeeping
CREATE TABLE IF NOT EXISTS issues (
    id TEXT PRIMARY KEY,
    key TEXT NOT NULL,
    project_key TEXT NOT NULL,
    summary TEXT NOT NULL,
    description TEXT,            -- JSON: plain string or rich document
    status TEXT NOT NULL,
    status_category TEXT NOT NULL,
    assignee TEXT,
    reporter TEXT,
    priority TEXT,
    issue_type TEXT NOT NULL,
    labels TEXT NOT NULL DEFAULT '[]',
    created TEXT NOT NULL,
    updated TEXT NOT NULL,
    local_updated INTEGER NOT NULL DEFAULT 0,
    sync_status TEXT NOT NULL DEFAULT 'synced',
    sync_error TEXT,
    remote_version TEXT
);

-- Replicated comments
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    issue_id TEXT NOT NULL,
    body TEXT NOT NULL,          -- JSON: plain string or rich document
    author TEXT,
    created TEXT NOT NULL,
    updated TEXT NOT NULL,
    local_updated INTEGER NOT NULL DEFAULT 0,
    sync_status TEXT NOT NULL DEFAULT 'synced',
    sync_error TEXT,
    remote_version TEXT
);

-- Local mutations awaiting acknowledgement, one per entity
CREATE TABLE IF NOT EXISTS pending_operations (
    id TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,   -- issue|comment
    entity_id TEXT NOT NULL,
    kind TEXT NOT NULL,          -- create|update|delete
    fields TEXT NOT NULL,        -- JSON object
    base TEXT NOT NULL,          -- JSON object
    created_at INTEGER NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    state TEXT NOT NULL DEFAULT 'queued'
);

-- Entities whose local and remote states diverged
CREATE TABLE IF NOT EXISTS conflicts (
    entity_id TEXT PRIMARY KEY,
    entity_type TEXT NOT NULL,
    entity_key TEXT NOT NULL,
    connection_id TEXT NOT NULL,
    fields TEXT NOT NULL,        -- JSON array of field names
    local_value TEXT NOT NULL,   -- JSON object
    remote_value TEXT,           -- JSON object, NULL when deleted remotely
    remote_version TEXT,
    detected_at TEXT NOT NULL
);

-- Per-connection pull cursor
CREATE TABLE IF NOT EXISTS sync_meta (
    connection_id TEXT PRIMARY KEY,
    last_sync_time TEXT NOT NULL,
    last_sync_cursor TEXT
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_issues_local_updated ON issues(local_updated DESC);
CREATE INDEX IF NOT EXISTS idx_issues_key ON issues(key);
CREATE INDEX IF NOT EXISTS idx_comments_issue ON comments(issue_id);
CREATE INDEX IF NOT EXISTS idx_pending_created ON pending_operations(created_at);
CREATE UNIQUE INDEX IF NOT EXISTS idx_pending_entity ON pending_operations(entity_type, entity_id);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
pub(crate) fn parse_db<T: std::str::FromStr>(
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
pub(crate) fn parse_timestamp(
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

/// Parse a JSON column.
pub(crate) fn parse_json<T: DeserializeOwned>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    serde_json::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!("invalid JSON in column '{column}': {e}"))),
        )
    })
}

/// Run schema creation and all migrations on a database connection.
///
/// Applies the canonical schema and runs idempotent migrations to upgrade
/// older databases that may be missing columns.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_tombstones(conn)?;
    Ok(())
}

/// Migration: Add the `deleted` tombstone column to replica tables.
fn migrate_add_tombstones(conn: &Connection) -> Result<()> {
    for table in ["issues", "comments"] {
        let has_column: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info(?1) WHERE name = 'deleted'",
                [table],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_column {
            let sql = format!("ALTER TABLE {table} ADD COLUMN deleted INTEGER NOT NULL DEFAULT 0");
            conn.execute(&sql, [])?;
        }
    }
    Ok(())
}

/// Store table a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreTable {
    Issues,
    Comments,
    PendingOperations,
    Conflicts,
    SyncMeta,
}

impl StoreTable {
    /// Table holding records of the given entity type.
    pub fn for_entity(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Issue => StoreTable::Issues,
            EntityType::Comment => StoreTable::Comments,
        }
    }

    /// Returns the SQL table name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreTable::Issues => "issues",
            StoreTable::Comments => "comments",
            StoreTable::PendingOperations => "pending_operations",
            StoreTable::Conflicts => "conflicts",
            StoreTable::SyncMeta => "sync_meta",
        }
    }
}

/// Kind of committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Put,
    Delete,
}

/// A committed write, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub table: StoreTable,
    pub id: String,
    pub change: Change,
}

const EVENT_CAPACITY: usize = 256;

/// SQLite database connection with replica operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
    events: broadcast::Sender<StoreEvent>,
    /// Events buffered while a transaction is open.
    buffered: RefCell<Option<Vec<StoreEvent>>>,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        run_migrations(&conn)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Database { conn, events, buffered: RefCell::new(None) })
    }

    /// Subscribe to committed writes.
    ///
    /// Slow receivers observe `RecvError::Lagged` rather than blocking
    /// writers.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Publish a write, deferring it to commit when inside a transaction.
    pub(crate) fn notify(&self, table: StoreTable, id: &str, change: Change) {
        let event = StoreEvent { table, id: id.to_string(), change };
        let mut buffered = self.buffered.borrow_mut();
        match buffered.as_mut() {
            Some(events) => events.push(event),
            None => {
                // No subscribers is not an error.
                let _ = self.events.send(event);
            }
        }
    }

    /// Runs `f` inside a single SQLite transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. Change events
    /// are published only after commit. Nested calls join the outer
    /// transaction.
    pub fn transaction<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        self.try_transaction(f)
    }

    /// [`Database::transaction`] for callers with their own error type.
    pub fn try_transaction<T, E: From<Error>>(
        &self,
        f: impl FnOnce(&Database) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        if self.buffered.borrow().is_some() {
            return f(self);
        }

        let tx = self.conn.unchecked_transaction().map_err(Error::from)?;
        *self.buffered.borrow_mut() = Some(Vec::new());
        let result = f(self);
        let events = self.buffered.borrow_mut().take().unwrap_or_default();

        match result {
            Ok(value) => {
                tx.commit().map_err(Error::from)?;
                for event in events {
                    let _ = self.events.send(event);
                }
                Ok(value)
            }
            Err(e) => {
                tx.rollback().map_err(Error::from)?;
                Err(e)
            }
        }
    }

    /// Sets the replication state of a record without touching its fields.
    pub fn set_sync_state(
        &self,
        entity_type: EntityType,
        id: &str,
        status: SyncStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let table = StoreTable::for_entity(entity_type);
        let sql = format!(
            "UPDATE {} SET sync_status = ?1, sync_error = ?2 WHERE id = ?3",
            table.as_str()
        );
        let affected = self.conn.execute(&sql, rusqlite::params![status.as_str(), error, id])?;
        if affected == 0 {
            return Err(not_found(entity_type, id));
        }
        self.notify(table, id, Change::Put);
        Ok(())
    }
}

/// Not-found error for the given entity type.
pub fn not_found(entity_type: EntityType, id: &str) -> Error {
    match entity_type {
        EntityType::Issue => Error::IssueNotFound(id.to_string()),
        EntityType::Comment => Error::CommentNotFound(id.to_string()),
    }
}

/// Typed persistence for a replicated record.
pub trait ReplicaTable: Replica {
    const TABLE: StoreTable;

    /// Loads a record, including tombstoned ones.
    fn load(db: &Database, id: &str) -> Result<Option<Self>>;

    /// Inserts or replaces a record.
    fn save(db: &Database, record: &Self) -> Result<()>;

    /// Removes a record and anything owned by it.
    fn purge(db: &Database, id: &str) -> Result<()>;

    /// Loads a record or fails with a not-found error.
    fn get(db: &Database, id: &str) -> Result<Self> {
        Self::load(db, id)?.ok_or_else(|| not_found(Self::ENTITY, id))
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
