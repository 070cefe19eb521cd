// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::client::RemoteError;

/// Error type for sync engine operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The remote refused or could not be reached.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Local store failure. Aborts the cycle.
    #[error(transparent)]
    Store(#[from] ot_core::Error),

    /// The cycle was cancelled between phases.
    #[error("sync cancelled")]
    Cancelled,

    #[error("no conflict registered for {0}")]
    ConflictNotFound(String),

    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("offline\n  hint: queued changes are pushed once back online")]
    Offline,
}

impl SyncError {
    /// Network failures that a later attempt may clear.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Remote(e) if e.is_retryable())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Remote(RemoteError::Auth(_)))
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
