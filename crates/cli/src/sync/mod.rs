// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync with the remote tracker.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ LocalEditor │────►│   Pending   │────►│ SyncEngine  │────►│ RemoteClient│
//! │ (mutators)  │     │    Queue    │     │ pull/merge/ │◄────│   (trait)   │
//! └─────────────┘     └─────────────┘     │    push     │     └─────────────┘
//!                                         └─────────────┘
//!                                          ▲          │
//!                           ┌──────────────┘          ▼
//!                    ┌─────────────┐          ┌─────────────┐
//!                    │  Scheduler  │          │  Conflict   │
//!                    │ (per conn.) │          │  Registry   │
//!                    └─────────────┘          └─────────────┘
//! ```
//!
//! Every step appends to the [`DebugLog`].

use std::sync::Arc;

use ot_core::Database;

mod client;
mod conflicts;
mod edit;
mod engine;
mod error;
mod log;
mod queue;
mod scheduler;
mod transport;

pub use client::{RemoteClient, RemoteError, RemoteFuture, WsRemote};
pub use conflicts::{ConflictRegistry, Resolution};
pub use edit::{LocalEditor, NewIssue};
pub use engine::{CycleReport, MergeOutcome, PushOutcome, SyncEngine, DEFAULT_MAX_ATTEMPTS};
pub use error::{SyncError, SyncResult};
pub use log::{DebugLog, LogEntry, LogLevel, LogOp, RingBuffer, LOG_CAPACITY};
pub use queue::{Enqueued, PendingQueue};
pub use scheduler::{Phase, SyncOutcome, SyncScheduler, Trigger};
pub use transport::{Transport, TransportError, WebSocketTransport};

/// The replica store, shared between the engine, the editor and the
/// search indexer. Never held across a network call.
pub type SharedStore = Arc<tokio::sync::Mutex<Database>>;

#[cfg(test)]
pub(crate) mod test_helpers;



#[cfg(test)]
mod edit_tests;





#[cfg(test)]
mod queue_tests;

#[cfg(test)]
mod scheduler_tests;

#[cfg(test)]
mod transport_tests;
