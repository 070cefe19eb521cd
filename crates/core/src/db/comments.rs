// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_db, parse_json, parse_timestamp, Change, Database, ReplicaTable, StoreTable};
use crate::error::{Error, Result};
use crate::issue::{Comment, LocalMeta};

const COMMENT_COLUMNS: &str = "id, issue_id, body, author, created, updated,
     local_updated, sync_status, sync_error, remote_version, deleted";

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let body: String = row.get(2)?;
    let created: String = row.get(4)?;
    let updated: String = row.get(5)?;
    let sync_status: String = row.get(7)?;

    Ok(Comment {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        body: parse_json(&body, "body")?,
        author: row.get(3)?,
        created: parse_timestamp(&created, "created")?,
        updated: parse_timestamp(&updated, "updated")?,
        local: LocalMeta {
            local_updated: row.get(6)?,
            sync_status: parse_db(&sync_status, "sync_status")?,
            sync_error: row.get(8)?,
            remote_version: row.get(9)?,
            deleted: row.get(10)?,
        },
    })
}

impl Database {
    /// Insert or replace a comment.
    pub fn put_comment(&self, comment: &Comment) -> Result<()> {
        let body = serde_json::to_string(&comment.body)?;
        self.conn.execute(
            "INSERT INTO comments (id, issue_id, body, author, created, updated,
             local_updated, sync_status, sync_error, remote_version, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                issue_id = excluded.issue_id, body = excluded.body,
                author = excluded.author, created = excluded.created,
                updated = excluded.updated, local_updated = excluded.local_updated,
                sync_status = excluded.sync_status, sync_error = excluded.sync_error,
                remote_version = excluded.remote_version, deleted = excluded.deleted",
            params![
                comment.id,
                comment.issue_id,
                body,
                comment.author,
                comment.created.to_rfc3339(),
                comment.updated.to_rfc3339(),
                comment.local.local_updated,
                comment.local.sync_status.as_str(),
                comment.local.sync_error,
                comment.local.remote_version,
                comment.local.deleted,
            ],
        )?;
        self.notify(StoreTable::Comments, &comment.id, Change::Put);
        Ok(())
    }

    /// Find a comment by ID, including tombstoned ones.
    pub fn find_comment(&self, id: &str) -> Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], comment_from_row).optional()?)
    }

    /// Get a comment by ID.
    pub fn get_comment(&self, id: &str) -> Result<Comment> {
        self.find_comment(id)?.ok_or_else(|| Error::CommentNotFound(id.to_string()))
    }

    /// List live comments on an issue, oldest first.
    pub fn list_comments(&self, issue_id: &str) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE issue_id = ?1 AND deleted = 0
             ORDER BY created, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let comments =
            stmt.query_map(params![issue_id], comment_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    /// Remove a comment.
    pub fn delete_comment(&self, id: &str) -> Result<()> {
        let affected = self.conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        if affected > 0 {
            self.notify(StoreTable::Comments, id, Change::Delete);
        }
        Ok(())
    }

    /// Replace a locally assigned comment id with the remote one.
    pub fn rekey_comment(&self, old_id: &str, new_id: &str) -> Result<()> {
        if old_id != new_id {
            self.conn.execute("DELETE FROM comments WHERE id = ?1", params![new_id])?;
        }
        let affected = self.conn.execute(
            "UPDATE comments SET id = ?1 WHERE id = ?2",
            params![new_id, old_id],
        )?;
        if affected == 0 {
            return Err(Error::CommentNotFound(old_id.to_string()));
        }
        self.retarget_operations(crate::op::EntityType::Comment, old_id, new_id)?;
        self.conn.execute(
            "UPDATE conflicts SET entity_id = ?1, entity_key = ?1
             WHERE entity_type = 'comment' AND entity_id = ?2",
            params![new_id, old_id],
        )?;
        self.notify(StoreTable::Comments, old_id, Change::Delete);
        self.notify(StoreTable::Comments, new_id, Change::Put);
        Ok(())
    }
}

impl ReplicaTable for Comment {
    const TABLE: StoreTable = StoreTable::Comments;

    fn load(db: &Database, id: &str) -> Result<Option<Self>> {
        db.find_comment(id)
    }

    fn save(db: &Database, record: &Self) -> Result<()> {
        db.put_comment(record)
    }

    fn purge(db: &Database, id: &str) -> Result<()> {
        db.delete_comment(id)
    }
}
