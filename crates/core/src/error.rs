// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ot-core operations.

use thiserror::Error;

/// All possible errors that can occur in ot-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("comment not found: {0}")]
    CommentNotFound(String),

    #[error("pending operation not found: {0}")]
    OperationNotFound(String),

    #[error("unknown {entity} field: '{field}'")]
    UnknownField { entity: &'static str, field: String },

    #[error("invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("invalid entity type: '{0}'\n  hint: valid types are: issue, comment")]
    InvalidEntityType(String),

    #[error("invalid operation kind: '{0}'\n  hint: valid kinds are: create, update, delete")]
    InvalidOpKind(String),

    #[error("invalid operation state: '{0}'")]
    InvalidOpState(String),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: synced, pending, conflict")]
    InvalidSyncStatus(String),

    #[error(
        "invalid status category: '{0}'\n  hint: valid categories are: todo, indeterminate, done"
    )]
    InvalidStatusCategory(String),

    #[error("invalid conflict policy: '{0}'\n  hint: valid policies are: field_overlap, strict")]
    InvalidPolicy(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Returns true for errors caused by a malformed local payload rather
    /// than by the store itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownField { .. } | Error::InvalidField { .. } | Error::InvalidInput(_)
        )
    }
}

/// A specialized Result type for ot-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
