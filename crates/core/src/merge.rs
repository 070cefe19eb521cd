// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict detection between a pending local change and a remote delta.
//!
//! Detection rules for the default [`FieldOverlap`] policy:
//! - The remote changed-field set is the delta's declared set, or else the
//!   fields whose remote value differs from the operation's `base` value
//!   (or from the local row for fields the operation does not touch)
//! - Disjoint local and remote sets auto-merge
//! - Intersecting sets conflict, except fields where both sides already
//!   agree on the new value
//! - A pending local delete conflicts with any remote change
//!
//! [`Strict`] conflicts on any remote change at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::op::{EntityType, FieldMap, OpKind, PendingOperation};

/// An entity whose local and remote states diverged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub entity_key: String,
    pub connection_id: String,
    /// Field names both sides changed.
    pub fields: Vec<String>,
    pub local_value: FieldMap,
    /// `None` when the entity was deleted remotely.
    pub remote_value: Option<FieldMap>,
    pub remote_version: Option<String>,
    pub detected_at: DateTime<Utc>,
}

impl Conflict {
    pub fn is_remote_delete(&self) -> bool {
        self.remote_value.is_none()
    }
}

/// Outcome of comparing a pending operation with a remote state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Apply these remote fields, keep the local ones.
    AutoMerge { remote_fields: Vec<String> },
    /// Leave the local row untouched and register a conflict.
    Conflict { fields: Vec<String> },
}

/// Decides whether a remote change collides with a pending local one.
pub trait ConflictPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Judges a remote state against a pending operation.
    ///
    /// `local` is the local row's field snapshot, `remote` the remote one
    /// (`None` when deleted remotely), `declared` the remote's own list of
    /// changed fields when it sends one.
    fn judge(
        &self,
        op: &PendingOperation,
        local: &FieldMap,
        remote: Option<&FieldMap>,
        declared: Option<&[String]>,
    ) -> Verdict;
}

/// Fields the remote changed relative to what the local side last saw.
pub fn remote_changed_fields(
    op: &PendingOperation,
    local: &FieldMap,
    remote: &FieldMap,
    declared: Option<&[String]>,
) -> BTreeSet<String> {
    if let Some(declared) = declared {
        return declared.iter().filter(|f| remote.contains_key(*f)).cloned().collect();
    }
    remote
        .iter()
        .filter(|(name, value)| {
            let seen = op.base.get(*name).or_else(|| local.get(*name));
            seen != Some(*value)
        })
        .map(|(name, _)| name.clone())
        .collect()
}

/// Conflict only on intersecting field sets. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldOverlap;

impl ConflictPolicy for FieldOverlap {
    fn name(&self) -> &'static str {
        "field_overlap"
    }

    fn judge(
        &self,
        op: &PendingOperation,
        local: &FieldMap,
        remote: Option<&FieldMap>,
        declared: Option<&[String]>,
    ) -> Verdict {
        let Some(remote) = remote else {
            return Verdict::Conflict { fields: op.changed_fields().into_iter().collect() };
        };
        let remote_fields = remote_changed_fields(op, local, remote, declared);

        if op.kind == OpKind::Delete {
            return if remote_fields.is_empty() {
                Verdict::AutoMerge { remote_fields: Vec::new() }
            } else {
                Verdict::Conflict { fields: remote_fields.into_iter().collect() }
            };
        }

        let overlap: Vec<String> = remote_fields
            .iter()
            .filter(|f| op.fields.contains_key(*f) && op.fields.get(*f) != remote.get(*f))
            .cloned()
            .collect();

        if overlap.is_empty() {
            Verdict::AutoMerge { remote_fields: remote_fields.into_iter().collect() }
        } else {
            Verdict::Conflict { fields: overlap }
        }
    }
}

/// Conflict on any remote change to an entity with a pending operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Strict;

impl ConflictPolicy for Strict {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn judge(
        &self,
        op: &PendingOperation,
        local: &FieldMap,
        remote: Option<&FieldMap>,
        declared: Option<&[String]>,
    ) -> Verdict {
        let Some(remote) = remote else {
            return Verdict::Conflict { fields: op.changed_fields().into_iter().collect() };
        };
        let remote_fields = remote_changed_fields(op, local, remote, declared);
        if remote_fields.is_empty() {
            return Verdict::AutoMerge { remote_fields: Vec::new() };
        }
        let mut fields = remote_fields;
        fields.extend(op.changed_fields());
        Verdict::Conflict { fields: fields.into_iter().collect() }
    }
}

/// Named policy, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    FieldOverlap,
    Strict,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::FieldOverlap => "field_overlap",
            PolicyKind::Strict => "strict",
        }
    }

    /// Builds the policy object.
    pub fn build(&self) -> Arc<dyn ConflictPolicy> {
        match self {
            PolicyKind::FieldOverlap => Arc::new(FieldOverlap),
            PolicyKind::Strict => Arc::new(Strict),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "field_overlap" => Ok(PolicyKind::FieldOverlap),
            "strict" => Ok(PolicyKind::Strict),
            _ => Err(Error::InvalidPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
