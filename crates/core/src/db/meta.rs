// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{parse_timestamp, Change, Database, StoreTable};
use crate::error::Result;

/// Per-connection pull position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMeta {
    pub connection_id: String,
    pub last_sync_time: DateTime<Utc>,
    /// Absent means the next pull is a full resync.
    pub last_sync_cursor: Option<String>,
}

impl Database {
    /// Sync metadata for a connection, if it ever pulled.
    pub fn get_sync_meta(&self, connection_id: &str) -> Result<Option<SyncMeta>> {
        Ok(self
            .conn
            .query_row(
                "SELECT connection_id, last_sync_time, last_sync_cursor
                 FROM sync_meta WHERE connection_id = ?1",
                params![connection_id],
                |row| {
                    let time: String = row.get(1)?;
                    Ok(SyncMeta {
                        connection_id: row.get(0)?,
                        last_sync_time: parse_timestamp(&time, "last_sync_time")?,
                        last_sync_cursor: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    /// Write sync metadata for a connection.
    pub fn put_sync_meta(&self, meta: &SyncMeta) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sync_meta (connection_id, last_sync_time, last_sync_cursor)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(connection_id) DO UPDATE SET
                last_sync_time = excluded.last_sync_time,
                last_sync_cursor = excluded.last_sync_cursor",
            params![meta.connection_id, meta.last_sync_time.to_rfc3339(), meta.last_sync_cursor],
        )?;
        self.notify(StoreTable::SyncMeta, &meta.connection_id, Change::Put);
        Ok(())
    }

    /// Forget a connection's pull position.
    pub fn delete_sync_meta(&self, connection_id: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM sync_meta WHERE connection_id = ?1", params![connection_id])?;
        if affected > 0 {
            self.notify(StoreTable::SyncMeta, connection_id, Change::Delete);
        }
        Ok(())
    }
}
