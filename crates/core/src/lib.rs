// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ot-core: Shared library for the offtrack replica
//!
//! This crate provides the replicated record types, the SQLite store, the
//! wire protocol and the conflict policies used by the offtrack sync engine.

pub mod clock;
pub mod db;
pub mod document;
pub mod error;
pub mod issue;
pub mod merge;
pub mod op;
pub mod protocol;

/// Prefix of ids assigned to records created while offline.
pub const LOCAL_ID_PREFIX: &str = "LOCAL-";

pub use clock::{ClockSource, LocalClock, SystemClock};
pub use db::{Change, Database, ReplicaTable, StoreEvent, StoreTable, SyncMeta};
pub use document::{DocNode, RichText};
pub use error::{Error, Result};
pub use issue::{Comment, Issue, LocalMeta, Replica, StatusCategory, SyncStatus};
pub use merge::{Conflict, ConflictPolicy, FieldOverlap, PolicyKind, Strict, Verdict};
pub use op::{Amendment, EntityType, FieldMap, OpChange, OpKind, OpState, PendingOperation};
pub use protocol::{
    ClientMessage, PullBatch, PushAck, PushRequest, RejectReason, RemoteDelta, RemoteEntity,
    ServerMessage,
};
