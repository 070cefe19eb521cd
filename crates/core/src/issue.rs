// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Replicated record types: issues and comments.
//!
//! Both carry the remote tracker's fields plus [`LocalMeta`], the
//! bookkeeping the replica adds on top. Fields are addressed by name through
//! [`Replica::fields`] and [`Replica::apply_patch`] so pending operations
//! and conflict detection can work on field-level patches.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::document::RichText;
use crate::error::{Error, Result};
use crate::op::{EntityType, FieldMap};

/// Coarse workflow bucket shared by every tracker workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Todo,
    Indeterminate,
    Done,
}

impl StatusCategory {
    /// Maps the remote tracker's category key.
    ///
    /// `new` and `undefined` are to-do, `done` is done, anything else is in
    /// progress.
    pub fn from_remote_key(key: &str) -> Self {
        match key {
            "new" | "undefined" => StatusCategory::Todo,
            "done" => StatusCategory::Done,
            _ => StatusCategory::Indeterminate,
        }
    }

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::Todo => "todo",
            StatusCategory::Indeterminate => "indeterminate",
            StatusCategory::Done => "done",
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StatusCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(StatusCategory::Todo),
            "indeterminate" => Ok(StatusCategory::Indeterminate),
            "done" => Ok(StatusCategory::Done),
            _ => Err(Error::InvalidStatusCategory(s.to_string())),
        }
    }
}

/// Replication state of a local record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Matches the last known remote state.
    #[default]
    Synced,
    /// Has an undrained pending operation.
    Pending,
    /// Registered in the conflict registry.
    Conflict,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
            SyncStatus::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "synced" => Ok(SyncStatus::Synced),
            "pending" => Ok(SyncStatus::Pending),
            "conflict" => Ok(SyncStatus::Conflict),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// Bookkeeping the replica keeps next to each record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalMeta {
    /// Monotonic ms timestamp of the last local touch.
    #[serde(default)]
    pub local_updated: i64,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub sync_error: Option<String>,
    /// Opaque remote version stamp of the last merged remote state.
    #[serde(default)]
    pub remote_version: Option<String>,
    /// Optimistically deleted, awaiting remote acknowledgement.
    #[serde(default)]
    pub deleted: bool,
}

/// A record replicated from the remote tracker.
pub trait Replica: Clone + fmt::Debug + Send + Sync + 'static {
    const ENTITY: EntityType;
    /// Names accepted by `apply_patch` and produced by `fields`.
    const FIELDS: &'static [&'static str];

    fn id(&self) -> &str;

    /// Human-facing key (issue key, or the id for comments).
    fn display_key(&self) -> &str;

    /// Remote `updated` timestamp.
    fn updated(&self) -> DateTime<Utc>;

    /// Snapshot of every syncable field.
    fn fields(&self) -> FieldMap;

    /// Applies a field-level patch. Unknown names and ill-typed values are
    /// rejected without modifying the record.
    fn apply_patch(&mut self, patch: &FieldMap) -> Result<()>;

    fn meta(&self) -> &LocalMeta;

    fn meta_mut(&mut self) -> &mut LocalMeta;

    /// Copies the attributes only the remote writes (key, timestamps) from a
    /// remote copy of the same record.
    fn adopt_remote_attributes(&mut self, remote: &Self);

    /// Snapshot of the named fields only.
    fn project(&self, names: &[String]) -> FieldMap {
        let all = self.fields();
        names.iter().filter_map(|n| all.get(n).map(|v| (n.clone(), v.clone()))).collect()
    }

    /// Version stamp to compare against the stored one. Falls back to the
    /// `updated` timestamp when the remote sends no explicit version.
    fn effective_version(&self) -> String {
        self.meta().remote_version.clone().unwrap_or_else(|| self.updated().to_rfc3339())
    }
}

fn decode<T: DeserializeOwned>(field: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| Error::InvalidField { field: field.to_string(), reason: e.to_string() })
}

fn encode<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// An issue as replicated from the remote tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub project_key: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<RichText>,
    pub status: String,
    pub status_category: StatusCategory,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    pub issue_type: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(flatten)]
    pub local: LocalMeta,
}

impl Issue {
    /// Creates an issue in the to-do category with no optional fields set.
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        project_key: impl Into<String>,
        summary: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Issue {
            id: id.into(),
            key: key.into(),
            project_key: project_key.into(),
            summary: summary.into(),
            description: None,
            status: "To Do".to_string(),
            status_category: StatusCategory::Todo,
            assignee: None,
            reporter: None,
            priority: None,
            issue_type: "Task".to_string(),
            labels: Vec::new(),
            created,
            updated: created,
            local: LocalMeta::default(),
        }
    }

    /// Flattened description text, empty when absent.
    pub fn description_text(&self) -> String {
        self.description.as_ref().map(RichText::plain_text).unwrap_or_default()
    }

    /// Returns true if this issue was created locally and never acknowledged.
    pub fn is_local_only(&self) -> bool {
        self.id.starts_with(crate::LOCAL_ID_PREFIX)
    }
}

impl Replica for Issue {
    const ENTITY: EntityType = EntityType::Issue;
    const FIELDS: &'static [&'static str] = &[
        "summary",
        "description",
        "status",
        "status_category",
        "assignee",
        "reporter",
        "priority",
        "issue_type",
        "labels",
        "project_key",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn display_key(&self) -> &str {
        &self.key
    }

    fn adopt_remote_attributes(&mut self, remote: &Self) {
        self.key = remote.key.clone();
        self.created = remote.created;
        self.updated = remote.updated;
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    fn fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("summary".into(), encode(&self.summary));
        map.insert("description".into(), encode(&self.description));
        map.insert("status".into(), encode(&self.status));
        map.insert("status_category".into(), encode(&self.status_category));
        map.insert("assignee".into(), encode(&self.assignee));
        map.insert("reporter".into(), encode(&self.reporter));
        map.insert("priority".into(), encode(&self.priority));
        map.insert("issue_type".into(), encode(&self.issue_type));
        map.insert("labels".into(), encode(&self.labels));
        map.insert("project_key".into(), encode(&self.project_key));
        map
    }

    fn apply_patch(&mut self, patch: &FieldMap) -> Result<()> {
        let mut next = self.clone();
        for (name, value) in patch {
            match name.as_str() {
                "summary" => next.summary = decode(name, value)?,
                "description" => next.description = decode(name, value)?,
                "status" => next.status = decode(name, value)?,
                "status_category" => next.status_category = decode(name, value)?,
                "assignee" => next.assignee = decode(name, value)?,
                "reporter" => next.reporter = decode(name, value)?,
                "priority" => next.priority = decode(name, value)?,
                "issue_type" => next.issue_type = decode(name, value)?,
                "labels" => next.labels = decode(name, value)?,
                "project_key" => next.project_key = decode(name, value)?,
                _ => return Err(Error::UnknownField { entity: "issue", field: name.clone() }),
            }
        }
        *self = next;
        Ok(())
    }

    fn meta(&self) -> &LocalMeta {
        &self.local
    }

    fn meta_mut(&mut self) -> &mut LocalMeta {
        &mut self.local
    }
}

/// A comment on an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub issue_id: String,
    pub body: RichText,
    #[serde(default)]
    pub author: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(flatten)]
    pub local: LocalMeta,
}

impl Comment {
    /// Creates a comment with the given body.
    pub fn new(
        id: impl Into<String>,
        issue_id: impl Into<String>,
        body: RichText,
        created: DateTime<Utc>,
    ) -> Self {
        Comment {
            id: id.into(),
            issue_id: issue_id.into(),
            body,
            author: None,
            created,
            updated: created,
            local: LocalMeta::default(),
        }
    }
}

impl Replica for Comment {
    const ENTITY: EntityType = EntityType::Comment;
    const FIELDS: &'static [&'static str] = &["issue_id", "body", "author"];

    fn id(&self) -> &str {
        &self.id
    }

    fn display_key(&self) -> &str {
        &self.id
    }

    fn adopt_remote_attributes(&mut self, remote: &Self) {
        self.created = remote.created;
        self.updated = remote.updated;
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    fn fields(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert("issue_id".into(), encode(&self.issue_id));
        map.insert("body".into(), encode(&self.body));
        map.insert("author".into(), encode(&self.author));
        map
    }

    fn apply_patch(&mut self, patch: &FieldMap) -> Result<()> {
        let mut next = self.clone();
        for (name, value) in patch {
            match name.as_str() {
                "issue_id" => next.issue_id = decode(name, value)?,
                "body" => next.body = decode(name, value)?,
                "author" => next.author = decode(name, value)?,
                _ => return Err(Error::UnknownField { entity: "comment", field: name.clone() }),
            }
        }
        *self = next;
        Ok(())
    }

    fn meta(&self) -> &LocalMeta {
        &self.local
    }

    fn meta_mut(&mut self) -> &mut LocalMeta {
        &mut self.local
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
