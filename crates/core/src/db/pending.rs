// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_db, parse_json, Change, Database, StoreTable};
use crate::error::{Error, Result};
use crate::op::{EntityType, FieldMap, PendingOperation};

const OP_COLUMNS: &str =
    "id, entity_type, entity_id, kind, fields, base, created_at, attempts, last_error, state";

fn operation_from_row(row: &Row<'_>) -> rusqlite::Result<PendingOperation> {
    let entity_type: String = row.get(1)?;
    let kind: String = row.get(3)?;
    let fields: String = row.get(4)?;
    let base: String = row.get(5)?;
    let state: String = row.get(9)?;

    Ok(PendingOperation {
        id: row.get(0)?,
        entity_type: parse_db(&entity_type, "entity_type")?,
        entity_id: row.get(2)?,
        kind: parse_db(&kind, "kind")?,
        fields: parse_json(&fields, "fields")?,
        base: parse_json(&base, "base")?,
        created_at: row.get(6)?,
        attempts: row.get(7)?,
        last_error: row.get(8)?,
        state: parse_db(&state, "state")?,
    })
}

impl Database {
    /// Append a pending operation.
    pub fn insert_operation(&self, op: &PendingOperation) -> Result<()> {
        self.conn.execute(
            "INSERT INTO pending_operations
             (id, entity_type, entity_id, kind, fields, base, created_at, attempts, last_error, state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                op.id,
                op.entity_type.as_str(),
                op.entity_id,
                op.kind.as_str(),
                serde_json::to_string(&op.fields)?,
                serde_json::to_string(&op.base)?,
                op.created_at,
                op.attempts,
                op.last_error,
                op.state.as_str(),
            ],
        )?;
        self.notify(StoreTable::PendingOperations, &op.id, Change::Put);
        Ok(())
    }

    /// Overwrite a pending operation by ID.
    pub fn update_operation(&self, op: &PendingOperation) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE pending_operations SET entity_type = ?2, entity_id = ?3, kind = ?4,
             fields = ?5, base = ?6, created_at = ?7, attempts = ?8, last_error = ?9, state = ?10
             WHERE id = ?1",
            params![
                op.id,
                op.entity_type.as_str(),
                op.entity_id,
                op.kind.as_str(),
                serde_json::to_string(&op.fields)?,
                serde_json::to_string(&op.base)?,
                op.created_at,
                op.attempts,
                op.last_error,
                op.state.as_str(),
            ],
        )?;
        if affected == 0 {
            return Err(Error::OperationNotFound(op.id.clone()));
        }
        self.notify(StoreTable::PendingOperations, &op.id, Change::Put);
        Ok(())
    }

    /// Find a pending operation by ID.
    pub fn find_operation(&self, id: &str) -> Result<Option<PendingOperation>> {
        let sql = format!("SELECT {OP_COLUMNS} FROM pending_operations WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], operation_from_row).optional()?)
    }

    /// Get a pending operation by ID.
    pub fn get_operation(&self, id: &str) -> Result<PendingOperation> {
        self.find_operation(id)?.ok_or_else(|| Error::OperationNotFound(id.to_string()))
    }

    /// The pending operation targeting an entity, if any.
    pub fn operation_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<Option<PendingOperation>> {
        let sql = format!(
            "SELECT {OP_COLUMNS} FROM pending_operations WHERE entity_type = ?1 AND entity_id = ?2"
        );
        Ok(self
            .conn
            .query_row(&sql, params![entity_type.as_str(), entity_id], operation_from_row)
            .optional()?)
    }

    /// All pending operations in creation order.
    pub fn list_operations(&self) -> Result<Vec<PendingOperation>> {
        let sql =
            format!("SELECT {OP_COLUMNS} FROM pending_operations ORDER BY created_at, rowid");
        let mut stmt = self.conn.prepare(&sql)?;
        let ops = stmt.query_map([], operation_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ops)
    }

    /// Pending operations on the comments of an issue, tombstoned comments
    /// included, in creation order.
    pub fn comment_operations(&self, issue_id: &str) -> Result<Vec<PendingOperation>> {
        let sql = format!(
            "SELECT {OP_COLUMNS} FROM pending_operations
             WHERE entity_type = 'comment'
               AND entity_id IN (SELECT id FROM comments WHERE issue_id = ?1)
             ORDER BY created_at, rowid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ops =
            stmt.query_map(params![issue_id], operation_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ops)
    }

    /// Delete a pending operation.
    pub fn delete_operation(&self, id: &str) -> Result<()> {
        let affected =
            self.conn.execute("DELETE FROM pending_operations WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Error::OperationNotFound(id.to_string()));
        }
        self.notify(StoreTable::PendingOperations, id, Change::Delete);
        Ok(())
    }

    /// Count pending operations, abandoned ones included.
    pub fn count_operations(&self) -> Result<usize> {
        let count: i64 =
            self.conn.query_row("SELECT COUNT(*) FROM pending_operations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub(crate) fn retarget_operations(
        &self,
        entity_type: EntityType,
        old_id: &str,
        new_id: &str,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE pending_operations SET entity_id = ?1 WHERE entity_type = ?2 AND entity_id = ?3",
            params![new_id, entity_type.as_str(), old_id],
        )?;
        Ok(())
    }

    /// Point queued comment creates at a re-keyed issue.
    pub(crate) fn retarget_comment_parents(&self, old_issue_id: &str, new_issue_id: &str) -> Result<()> {
        let sql = format!("SELECT {OP_COLUMNS} FROM pending_operations WHERE entity_type = 'comment'");
        let mut stmt = self.conn.prepare(&sql)?;
        let ops = stmt.query_map([], operation_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        for mut op in ops {
            if retarget_field(&mut op.fields, old_issue_id, new_issue_id) {
                self.update_operation(&op)?;
            }
        }
        Ok(())
    }
}

fn retarget_field(fields: &mut FieldMap, old_id: &str, new_id: &str) -> bool {
    match fields.get_mut("issue_id") {
        Some(value) if value.as_str() == Some(old_id) => {
            *value = serde_json::Value::from(new_id);
            true
        }
        _ => false,
    }
}
