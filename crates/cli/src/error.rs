// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::SyncError;

/// All possible errors that can occur in the otrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'offtrack init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("{field} cannot be empty")]
    FieldEmpty { field: &'static str },

    #[error("unknown attribute '{0}'\n  hint: valid attributes are summary, description, priority, type, assignee, labels")]
    UnknownAttribute(String),

    #[error("invalid merged value: {0}\n  hint: pass a JSON object of field values, e.g. '{{\"summary\": \"...\"}}'")]
    InvalidMerged(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] ot_core::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for otrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
