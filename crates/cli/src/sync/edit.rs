// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optimistic local edits.
//!
//! Each mutator writes the replica and enqueues the matching pending
//! operation in one transaction, then returns the record as stored.

use std::sync::Arc;

use chrono::Utc;
use ot_core::{
    Comment, Error, FieldMap, Issue, LocalClock, OpChange, Replica, RichText, StatusCategory,
};
use serde_json::Value;

use super::error::SyncResult;
use super::queue::PendingQueue;
use super::SharedStore;
use crate::id::{local_id, local_key};

/// Fields for a new issue.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub project_key: String,
    pub summary: String,
    pub description: Option<RichText>,
    pub issue_type: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
}

impl NewIssue {
    pub fn new(project_key: impl Into<String>, summary: impl Into<String>) -> Self {
        NewIssue { project_key: project_key.into(), summary: summary.into(), ..Default::default() }
    }
}

pub struct LocalEditor {
    store: SharedStore,
    queue: Arc<PendingQueue>,
    clock: Arc<LocalClock>,
}

fn require_text(field: &str, value: &str) -> ot_core::Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidField { field: field.to_string(), reason: "must not be empty".into() });
    }
    Ok(())
}

fn pending_deletion(issue: &Issue) -> Error {
    Error::InvalidInput(format!("issue {} is pending deletion", issue.key))
}

impl LocalEditor {
    pub fn new(store: SharedStore, queue: Arc<PendingQueue>, clock: Arc<LocalClock>) -> Self {
        LocalEditor { store, queue, clock }
    }

    /// Creates an issue under a local id until the remote assigns one.
    pub async fn create_issue(&self, new: NewIssue) -> SyncResult<Issue> {
        require_text("summary", &new.summary)?;
        require_text("project_key", &new.project_key)?;

        let db = self.store.lock().await;
        let stamp = self.clock.tick();
        let id = local_id(&new.summary, stamp, |candidate| {
            db.find_issue(candidate).map(|i| i.is_some()).unwrap_or(false)
        });
        let mut issue = Issue::new(&id, local_key(&id), new.project_key, new.summary, Utc::now());
        issue.description = new.description.map(|d| RichText::Document(d.into_document()));
        if let Some(issue_type) = new.issue_type {
            issue.issue_type = issue_type;
        }
        issue.priority = new.priority;
        issue.assignee = new.assignee;
        issue.labels = new.labels;
        issue.local.local_updated = stamp;

        self.queue.enqueue(&db, &issue, OpChange::create(issue.fields()))?;
        Ok(db.get_issue(&id)?)
    }

    /// Applies a field patch. Fields whose value does not change are
    /// dropped; an edit that changes nothing enqueues nothing.
    pub async fn update_fields(&self, id_or_key: &str, patch: FieldMap) -> SyncResult<Issue> {
        let db = self.store.lock().await;
        let mut issue = db.resolve_issue(id_or_key)?;
        if issue.local.deleted {
            return Err(pending_deletion(&issue).into());
        }

        let before = issue.fields();
        issue.apply_patch(&patch)?;
        let after = issue.fields();

        let mut changed = FieldMap::new();
        let mut base = FieldMap::new();
        for name in patch.keys() {
            if before.get(name) != after.get(name) {
                if let Some(value) = after.get(name) {
                    changed.insert(name.clone(), value.clone());
                }
                if let Some(value) = before.get(name) {
                    base.insert(name.clone(), value.clone());
                }
            }
        }
        if changed.is_empty() {
            return Ok(db.get_issue(&issue.id)?);
        }

        issue.local.local_updated = self.clock.tick();
        self.queue.enqueue(&db, &issue, OpChange::update(changed, base))?;
        Ok(db.get_issue(&issue.id)?)
    }

    pub async fn update_summary(&self, id_or_key: &str, summary: &str) -> SyncResult<Issue> {
        require_text("summary", summary)?;
        self.update_fields(id_or_key, patch([("summary", Value::from(summary))])).await
    }

    /// Sets the description. Plain text is stored as a rich document.
    pub async fn update_description(&self, id_or_key: &str, text: RichText) -> SyncResult<Issue> {
        let doc = serde_json::to_value(RichText::Document(text.into_document()))
            .map_err(Error::from)?;
        self.update_fields(id_or_key, patch([("description", doc)])).await
    }

    pub async fn transition(
        &self,
        id_or_key: &str,
        status: &str,
        category: StatusCategory,
    ) -> SyncResult<Issue> {
        require_text("status", status)?;
        self.update_fields(
            id_or_key,
            patch([
                ("status", Value::from(status)),
                ("status_category", Value::from(category.as_str())),
            ]),
        )
        .await
    }

    pub async fn assign(&self, id_or_key: &str, assignee: Option<&str>) -> SyncResult<Issue> {
        self.update_fields(id_or_key, patch([("assignee", Value::from(assignee))])).await
    }

    /// Hides the issue locally until the remote confirms the delete. An
    /// issue that never reached the remote is dropped outright.
    pub async fn delete_issue(&self, id_or_key: &str) -> SyncResult<()> {
        let db = self.store.lock().await;
        let mut issue = db.resolve_issue(id_or_key)?;
        if issue.local.deleted {
            return Err(pending_deletion(&issue).into());
        }
        let base = issue.fields();
        issue.local.deleted = true;
        issue.local.local_updated = self.clock.tick();
        self.queue.enqueue(&db, &issue, OpChange::delete(base))?;
        Ok(())
    }

    pub async fn add_comment(&self, issue_id_or_key: &str, body: RichText) -> SyncResult<Comment> {
        require_text("body", &body.plain_text())?;

        let db = self.store.lock().await;
        let issue = db.resolve_issue(issue_id_or_key)?;
        if issue.local.deleted {
            return Err(pending_deletion(&issue).into());
        }
        let stamp = self.clock.tick();
        let seed = format!("{}{}", issue.id, body.plain_text());
        let id = local_id(&seed, stamp, |candidate| {
            db.find_comment(candidate).map(|c| c.is_some()).unwrap_or(false)
        });
        let mut comment = Comment::new(&id, &issue.id, body, Utc::now());
        comment.local.local_updated = stamp;

        self.queue.enqueue(&db, &comment, OpChange::create(comment.fields()))?;
        Ok(db.get_comment(&id)?)
    }
}

fn patch<const N: usize>(entries: [(&str, Value); N]) -> FieldMap {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
