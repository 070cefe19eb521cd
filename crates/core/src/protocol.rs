// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wire messages exchanged with the remote tracker.
//!
//! The exchange is request/response:
//! - Client pulls deltas since a cursor, or pushes one pending operation
//! - Server answers with a batch, an acknowledgement, or a rejection

use serde::{Deserialize, Serialize};

use crate::issue::{Comment, Issue, Replica};
use crate::op::{EntityType, FieldMap, OpKind, PendingOperation};

/// A full remote record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "entity_type", rename_all = "snake_case")]
pub enum RemoteEntity {
    Issue(Issue),
    Comment(Comment),
}

impl RemoteEntity {
    pub fn entity_type(&self) -> EntityType {
        match self {
            RemoteEntity::Issue(_) => EntityType::Issue,
            RemoteEntity::Comment(_) => EntityType::Comment,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RemoteEntity::Issue(issue) => &issue.id,
            RemoteEntity::Comment(comment) => &comment.id,
        }
    }

    pub fn display_key(&self) -> &str {
        match self {
            RemoteEntity::Issue(issue) => issue.display_key(),
            RemoteEntity::Comment(comment) => comment.display_key(),
        }
    }

    /// Remote version stamp, falling back to the `updated` timestamp.
    pub fn version(&self) -> String {
        match self {
            RemoteEntity::Issue(issue) => issue.effective_version(),
            RemoteEntity::Comment(comment) => comment.effective_version(),
        }
    }

    /// Snapshot of every syncable field.
    pub fn fields(&self) -> FieldMap {
        match self {
            RemoteEntity::Issue(issue) => issue.fields(),
            RemoteEntity::Comment(comment) => comment.fields(),
        }
    }
}

/// One remote change since the pull cursor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RemoteDelta {
    /// The record was created or modified.
    Upsert {
        entity: RemoteEntity,
        /// Fields the remote changed, when the remote tracks them.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        changed_fields: Option<Vec<String>>,
    },
    /// The record was deleted.
    Delete { entity_type: EntityType, id: String },
}

impl RemoteDelta {
    pub fn upsert(entity: RemoteEntity) -> Self {
        RemoteDelta::Upsert { entity, changed_fields: None }
    }

    pub fn upsert_fields(entity: RemoteEntity, changed: &[&str]) -> Self {
        RemoteDelta::Upsert {
            entity,
            changed_fields: Some(changed.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn delete(entity_type: EntityType, id: impl Into<String>) -> Self {
        RemoteDelta::Delete { entity_type, id: id.into() }
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            RemoteDelta::Upsert { entity, .. } => entity.entity_type(),
            RemoteDelta::Delete { entity_type, .. } => *entity_type,
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            RemoteDelta::Upsert { entity, .. } => entity.id(),
            RemoteDelta::Delete { id, .. } => id,
        }
    }
}

/// A page of remote changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PullBatch {
    /// Deltas in remote order.
    pub deltas: Vec<RemoteDelta>,
    /// Cursor to pass on the next pull.
    pub next_cursor: Option<String>,
    /// More pages are available right away.
    #[serde(default)]
    pub has_more: bool,
}

/// A single local change sent to the remote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushRequest {
    pub operation_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub kind: OpKind,
    pub fields: FieldMap,
    /// Remote version the local change was based on.
    #[serde(default)]
    pub base_version: Option<String>,
    /// Owning issue for comment creates.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl PushRequest {
    /// Builds the request for a pending operation.
    pub fn from_operation(
        op: &PendingOperation,
        base_version: Option<String>,
        parent_id: Option<String>,
    ) -> Self {
        PushRequest {
            operation_id: op.id.clone(),
            entity_type: op.entity_type,
            entity_id: op.entity_id.clone(),
            kind: op.kind,
            fields: op.fields.clone(),
            base_version,
            parent_id,
        }
    }
}

/// Remote acknowledgement of a push.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushAck {
    pub remote_version: String,
    /// Remote-assigned id, returned for creates.
    #[serde(default)]
    pub remote_id: Option<String>,
    /// Remote-assigned display key, returned for issue creates.
    #[serde(default)]
    pub remote_key: Option<String>,
}

impl PushAck {
    pub fn new(remote_version: impl Into<String>) -> Self {
        PushAck { remote_version: remote_version.into(), remote_id: None, remote_key: None }
    }

    pub fn created(
        remote_version: impl Into<String>,
        remote_id: impl Into<String>,
        remote_key: Option<String>,
    ) -> Self {
        PushAck {
            remote_version: remote_version.into(),
            remote_id: Some(remote_id.into()),
            remote_key,
        }
    }
}

/// Why the remote refused a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Credentials missing or expired.
    Auth,
    /// The record changed remotely since `base_version`.
    Conflict,
    /// The payload was refused as invalid.
    Validation,
    /// Temporary server-side failure.
    Unavailable,
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request deltas since a cursor. No cursor means a full resync.
    Pull { request_id: u64, connection_id: String, cursor: Option<String> },

    /// Push one pending operation.
    Push { request_id: u64, connection_id: String, request: PushRequest },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Response to a Pull request.
    PullResponse { request_id: u64, batch: PullBatch },

    /// Response to a Push request.
    PushResponse { request_id: u64, ack: PushAck },

    /// The request was refused.
    Rejected {
        request_id: u64,
        reason: RejectReason,
        message: String,
        /// Current remote version, for conflicts.
        #[serde(default)]
        remote_version: Option<String>,
        /// Current remote record, for conflicts.
        #[serde(default)]
        remote: Option<RemoteEntity>,
    },
}

impl ClientMessage {
    /// Creates a Pull message.
    pub fn pull(request_id: u64, connection_id: impl Into<String>, cursor: Option<String>) -> Self {
        ClientMessage::Pull { request_id, connection_id: connection_id.into(), cursor }
    }

    /// Creates a Push message.
    pub fn push(request_id: u64, connection_id: impl Into<String>, request: PushRequest) -> Self {
        ClientMessage::Push { request_id, connection_id: connection_id.into(), request }
    }

    pub fn request_id(&self) -> u64 {
        match self {
            ClientMessage::Pull { request_id, .. } | ClientMessage::Push { request_id, .. } => {
                *request_id
            }
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a PullResponse message.
    pub fn pull_response(request_id: u64, batch: PullBatch) -> Self {
        ServerMessage::PullResponse { request_id, batch }
    }

    /// Creates a PushResponse message.
    pub fn push_response(request_id: u64, ack: PushAck) -> Self {
        ServerMessage::PushResponse { request_id, ack }
    }

    /// Creates a Rejected message without conflict details.
    pub fn rejected(request_id: u64, reason: RejectReason, message: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            request_id,
            reason,
            message: message.into(),
            remote_version: None,
            remote: None,
        }
    }

    /// Creates a conflict rejection carrying the current remote state.
    pub fn conflict(
        request_id: u64,
        message: impl Into<String>,
        remote_version: Option<String>,
        remote: Option<RemoteEntity>,
    ) -> Self {
        ServerMessage::Rejected {
            request_id,
            reason: RejectReason::Conflict,
            message: message.into(),
            remote_version,
            remote,
        }
    }

    pub fn request_id(&self) -> u64 {
        match self {
            ServerMessage::PullResponse { request_id, .. }
            | ServerMessage::PushResponse { request_id, .. }
            | ServerMessage::Rejected { request_id, .. } => *request_id,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
