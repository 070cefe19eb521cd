// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_db, parse_json, parse_timestamp, Change, Database, StoreTable};
use crate::error::Result;
use crate::merge::Conflict;

const CONFLICT_COLUMNS: &str = "entity_id, entity_type, entity_key, connection_id, fields,
     local_value, remote_value, remote_version, detected_at";

fn conflict_from_row(row: &Row<'_>) -> rusqlite::Result<Conflict> {
    let entity_type: String = row.get(1)?;
    let fields: String = row.get(4)?;
    let local_value: String = row.get(5)?;
    let remote_value: Option<String> = row.get(6)?;
    let detected_at: String = row.get(8)?;

    Ok(Conflict {
        entity_id: row.get(0)?,
        entity_type: parse_db(&entity_type, "entity_type")?,
        entity_key: row.get(2)?,
        connection_id: row.get(3)?,
        fields: parse_json(&fields, "fields")?,
        local_value: parse_json(&local_value, "local_value")?,
        remote_value: remote_value.map(|v| parse_json(&v, "remote_value")).transpose()?,
        remote_version: row.get(7)?,
        detected_at: parse_timestamp(&detected_at, "detected_at")?,
    })
}

impl Database {
    /// Insert or replace the conflict for an entity.
    pub fn put_conflict(&self, conflict: &Conflict) -> Result<()> {
        let remote_value = conflict.remote_value.as_ref().map(serde_json::to_string).transpose()?;
        self.conn.execute(
            "INSERT INTO conflicts (entity_id, entity_type, entity_key, connection_id, fields,
             local_value, remote_value, remote_version, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(entity_id) DO UPDATE SET
                entity_type = excluded.entity_type, entity_key = excluded.entity_key,
                connection_id = excluded.connection_id, fields = excluded.fields,
                local_value = excluded.local_value, remote_value = excluded.remote_value,
                remote_version = excluded.remote_version, detected_at = excluded.detected_at",
            params![
                conflict.entity_id,
                conflict.entity_type.as_str(),
                conflict.entity_key,
                conflict.connection_id,
                serde_json::to_string(&conflict.fields)?,
                serde_json::to_string(&conflict.local_value)?,
                remote_value,
                conflict.remote_version,
                conflict.detected_at.to_rfc3339(),
            ],
        )?;
        self.notify(StoreTable::Conflicts, &conflict.entity_id, Change::Put);
        Ok(())
    }

    /// The conflict registered for an entity, if any.
    pub fn find_conflict(&self, entity_id: &str) -> Result<Option<Conflict>> {
        let sql = format!("SELECT {CONFLICT_COLUMNS} FROM conflicts WHERE entity_id = ?1");
        Ok(self.conn.query_row(&sql, params![entity_id], conflict_from_row).optional()?)
    }

    /// All registered conflicts, oldest first.
    pub fn list_conflicts(&self) -> Result<Vec<Conflict>> {
        let sql = format!("SELECT {CONFLICT_COLUMNS} FROM conflicts ORDER BY detected_at, entity_id");
        let mut stmt = self.conn.prepare(&sql)?;
        let conflicts = stmt.query_map([], conflict_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(conflicts)
    }

    /// Remove the conflict for an entity. Returns whether one existed.
    pub fn delete_conflict(&self, entity_id: &str) -> Result<bool> {
        let affected =
            self.conn.execute("DELETE FROM conflicts WHERE entity_id = ?1", params![entity_id])?;
        if affected > 0 {
            self.notify(StoreTable::Conflicts, entity_id, Change::Delete);
        }
        Ok(affected > 0)
    }

    /// Returns true if the entity is in the conflict registry.
    pub fn is_conflicted(&self, entity_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM conflicts WHERE entity_id = ?1",
            params![entity_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
