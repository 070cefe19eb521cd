// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending operations: local mutations not yet acknowledged by the remote.
//!
//! Each operation targets one entity and carries a field-level patch plus
//! the `base` values that patch replaced. There is at most one operation per
//! entity; a later edit is folded into the existing one with
//! [`PendingOperation::amend`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Field name to JSON value.
pub type FieldMap = BTreeMap<String, Value>;

/// Kind of replicated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Issue,
    Comment,
}

impl EntityType {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Issue => "issue",
            EntityType::Comment => "comment",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "issue" => Ok(EntityType::Issue),
            "comment" => Ok(EntityType::Comment),
            _ => Err(Error::InvalidEntityType(s.to_string())),
        }
    }
}

/// What the operation does to its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Create,
    Update,
    Delete,
}

impl OpKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Create => "create",
            OpKind::Update => "update",
            OpKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(OpKind::Create),
            "update" => Ok(OpKind::Update),
            "delete" => Ok(OpKind::Delete),
            _ => Err(Error::InvalidOpKind(s.to_string())),
        }
    }
}

/// Lifecycle of a pending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpState {
    /// Eligible for push.
    #[default]
    Queued,
    /// Gave up after a non-retryable error or the retry cap. Retained until
    /// retried or discarded by hand.
    Abandoned,
}

impl OpState {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpState::Queued => "queued",
            OpState::Abandoned => "abandoned",
        }
    }
}

impl FromStr for OpState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(OpState::Queued),
            "abandoned" => Ok(OpState::Abandoned),
            _ => Err(Error::InvalidOpState(s.to_string())),
        }
    }
}

/// A local mutation awaiting remote acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub kind: OpKind,
    /// Patch for updates, full body for creates, empty for deletes.
    pub fields: FieldMap,
    /// Values the patch replaced, as last seen from the remote.
    pub base: FieldMap,
    /// Ms timestamp; the queue's FIFO key.
    pub created_at: i64,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub state: OpState,
}

/// A new local edit to fold into the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct OpChange {
    pub kind: OpKind,
    pub fields: FieldMap,
    pub base: FieldMap,
}

impl OpChange {
    pub fn create(fields: FieldMap) -> Self {
        OpChange { kind: OpKind::Create, fields, base: FieldMap::new() }
    }

    pub fn update(fields: FieldMap, base: FieldMap) -> Self {
        OpChange { kind: OpKind::Update, fields, base }
    }

    pub fn delete(base: FieldMap) -> Self {
        OpChange { kind: OpKind::Delete, fields: FieldMap::new(), base }
    }
}

/// Result of folding an edit into an existing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amendment {
    /// The operation now describes both edits.
    Replaced,
    /// The edits cancel out (create then delete); drop the operation.
    Cancelled,
}

impl PendingOperation {
    /// Creates a queued operation from a change.
    pub fn new(
        id: impl Into<String>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        change: OpChange,
        created_at: i64,
    ) -> Self {
        PendingOperation {
            id: id.into(),
            entity_type,
            entity_id: entity_id.into(),
            kind: change.kind,
            fields: change.fields,
            base: change.base,
            created_at,
            attempts: 0,
            last_error: None,
            state: OpState::Queued,
        }
    }

    /// Names of the fields this operation changes locally.
    pub fn changed_fields(&self) -> BTreeSet<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn is_abandoned(&self) -> bool {
        self.state == OpState::Abandoned
    }

    /// Folds a later edit of the same entity into this operation.
    ///
    /// Keeps `created_at`, so the entity keeps its FIFO slot, and resets
    /// attempts, error and abandonment.
    pub fn amend(&mut self, change: OpChange) -> Result<Amendment> {
        let outcome = match (self.kind, change.kind) {
            (OpKind::Delete, _) => {
                return Err(Error::InvalidInput(format!(
                    "{} {} is pending deletion",
                    self.entity_type, self.entity_id
                )));
            }
            (_, OpKind::Create) => {
                return Err(Error::InvalidInput(format!(
                    "{} {} already exists",
                    self.entity_type, self.entity_id
                )));
            }
            (OpKind::Create, OpKind::Delete) => Amendment::Cancelled,
            (OpKind::Create, OpKind::Update) => {
                self.fields.extend(change.fields);
                Amendment::Replaced
            }
            (OpKind::Update, OpKind::Update) => {
                self.fields.extend(change.fields);
                for (name, value) in change.base {
                    self.base.entry(name).or_insert(value);
                }
                Amendment::Replaced
            }
            (OpKind::Update, OpKind::Delete) => {
                self.kind = OpKind::Delete;
                self.fields.clear();
                for (name, value) in change.base {
                    self.base.entry(name).or_insert(value);
                }
                Amendment::Replaced
            }
        };
        self.attempts = 0;
        self.last_error = None;
        self.state = OpState::Queued;
        Ok(outcome)
    }

    /// Returns true if `other` describes the same change, ignoring retry
    /// bookkeeping.
    pub fn same_change(&self, other: &PendingOperation) -> bool {
        self.id == other.id
            && self.entity_id == other.entity_id
            && self.kind == other.kind
            && self.fields == other.fields
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;
