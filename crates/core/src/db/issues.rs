// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_db, parse_json, parse_timestamp, Change, Database, ReplicaTable, StoreTable};
use crate::error::{Error, Result};
use crate::issue::{Issue, LocalMeta};

const ISSUE_COLUMNS: &str = "id, key, project_key, summary, description, status, status_category,
     assignee, reporter, priority, issue_type, labels, created, updated,
     local_updated, sync_status, sync_error, remote_version, deleted";

fn issue_from_row(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let description: Option<String> = row.get(4)?;
    let category: String = row.get(6)?;
    let labels: String = row.get(11)?;
    let created: String = row.get(12)?;
    let updated: String = row.get(13)?;
    let sync_status: String = row.get(15)?;

    Ok(Issue {
        id: row.get(0)?,
        key: row.get(1)?,
        project_key: row.get(2)?,
        summary: row.get(3)?,
        description: description.map(|d| parse_json(&d, "description")).transpose()?,
        status: row.get(5)?,
        status_category: parse_db(&category, "status_category")?,
        assignee: row.get(7)?,
        reporter: row.get(8)?,
        priority: row.get(9)?,
        issue_type: row.get(10)?,
        labels: parse_json(&labels, "labels")?,
        created: parse_timestamp(&created, "created")?,
        updated: parse_timestamp(&updated, "updated")?,
        local: LocalMeta {
            local_updated: row.get(14)?,
            sync_status: parse_db(&sync_status, "sync_status")?,
            sync_error: row.get(16)?,
            remote_version: row.get(17)?,
            deleted: row.get(18)?,
        },
    })
}

impl Database {
    /// Insert or replace an issue.
    pub fn put_issue(&self, issue: &Issue) -> Result<()> {
        let description = issue.description.as_ref().map(serde_json::to_string).transpose()?;
        let labels = serde_json::to_string(&issue.labels)?;
        self.conn.execute(
            "INSERT INTO issues (id, key, project_key, summary, description, status,
             status_category, assignee, reporter, priority, issue_type, labels, created,
             updated, local_updated, sync_status, sync_error, remote_version, deleted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
             ON CONFLICT(id) DO UPDATE SET
                key = excluded.key, project_key = excluded.project_key,
                summary = excluded.summary, description = excluded.description,
                status = excluded.status, status_category = excluded.status_category,
                assignee = excluded.assignee, reporter = excluded.reporter,
                priority = excluded.priority, issue_type = excluded.issue_type,
                labels = excluded.labels, created = excluded.created,
                updated = excluded.updated, local_updated = excluded.local_updated,
                sync_status = excluded.sync_status, sync_error = excluded.sync_error,
                remote_version = excluded.remote_version, deleted = excluded.deleted",
            params![
                issue.id,
                issue.key,
                issue.project_key,
                issue.summary,
                description,
                issue.status,
                issue.status_category.as_str(),
                issue.assignee,
                issue.reporter,
                issue.priority,
                issue.issue_type,
                labels,
                issue.created.to_rfc3339(),
                issue.updated.to_rfc3339(),
                issue.local.local_updated,
                issue.local.sync_status.as_str(),
                issue.local.sync_error,
                issue.local.remote_version,
                issue.local.deleted,
            ],
        )?;
        self.notify(StoreTable::Issues, &issue.id, Change::Put);
        Ok(())
    }

    /// Find an issue by ID, including tombstoned ones.
    pub fn find_issue(&self, id: &str) -> Result<Option<Issue>> {
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], issue_from_row).optional()?)
    }

    /// Get an issue by ID.
    pub fn get_issue(&self, id: &str) -> Result<Issue> {
        self.find_issue(id)?.ok_or_else(|| Error::IssueNotFound(id.to_string()))
    }

    /// Resolve an issue by ID or display key.
    pub fn resolve_issue(&self, id_or_key: &str) -> Result<Issue> {
        if let Some(issue) = self.find_issue(id_or_key)? {
            return Ok(issue);
        }
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE key = ?1 LIMIT 1");
        self.conn
            .query_row(&sql, params![id_or_key], issue_from_row)
            .optional()?
            .ok_or_else(|| Error::IssueNotFound(id_or_key.to_string()))
    }

    /// List live issues, most recently touched first.
    pub fn list_issues(&self) -> Result<Vec<Issue>> {
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE deleted = 0
             ORDER BY local_updated DESC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let issues = stmt.query_map([], issue_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(issues)
    }

    /// Remove an issue and its comments.
    pub fn delete_issue(&self, id: &str) -> Result<()> {
        let mut stmt = self.conn.prepare("SELECT id FROM comments WHERE issue_id = ?1")?;
        let comment_ids =
            stmt.query_map(params![id], |row| row.get::<_, String>(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
        for comment_id in comment_ids {
            self.delete_comment(&comment_id)?;
        }
        let affected = self.conn.execute("DELETE FROM issues WHERE id = ?1", params![id])?;
        if affected > 0 {
            self.notify(StoreTable::Issues, id, Change::Delete);
        }
        Ok(())
    }

    /// Count live issues.
    pub fn count_issues(&self) -> Result<usize> {
        let count: i64 =
            self.conn.query_row("SELECT COUNT(*) FROM issues WHERE deleted = 0", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Replace a locally assigned issue id with the remote one.
    ///
    /// Rewrites every reference: comments, pending operations (including the
    /// `issue_id` field of queued comment creates) and conflicts.
    pub fn rekey_issue(&self, old_id: &str, new_id: &str, new_key: Option<&str>) -> Result<()> {
        if old_id != new_id {
            // A pull may already have delivered the acknowledged record.
            self.conn.execute("DELETE FROM issues WHERE id = ?1", params![new_id])?;
        }
        let affected = self.conn.execute(
            "UPDATE issues SET id = ?1, key = COALESCE(?2, key) WHERE id = ?3",
            params![new_id, new_key, old_id],
        )?;
        if affected == 0 {
            return Err(Error::IssueNotFound(old_id.to_string()));
        }
        self.conn.execute(
            "UPDATE comments SET issue_id = ?1 WHERE issue_id = ?2",
            params![new_id, old_id],
        )?;
        self.retarget_operations(crate::op::EntityType::Issue, old_id, new_id)?;
        self.retarget_comment_parents(old_id, new_id)?;
        self.conn.execute(
            "UPDATE conflicts SET entity_id = ?1 WHERE entity_type = 'issue' AND entity_id = ?2",
            params![new_id, old_id],
        )?;
        self.notify(StoreTable::Issues, old_id, Change::Delete);
        self.notify(StoreTable::Issues, new_id, Change::Put);
        Ok(())
    }
}

impl ReplicaTable for Issue {
    const TABLE: StoreTable = StoreTable::Issues;

    fn load(db: &Database, id: &str) -> Result<Option<Self>> {
        db.find_issue(id)
    }

    fn save(db: &Database, record: &Self) -> Result<()> {
        db.put_issue(record)
    }

    fn purge(db: &Database, id: &str) -> Result<()> {
        db.delete_issue(id)
    }
}
