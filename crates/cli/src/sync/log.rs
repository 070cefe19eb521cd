// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Debug log: a bounded, in-memory record of what the engine did.
//!
//! Every entry is mirrored to `tracing` at the matching level, so the same
//! events reach stderr when `RUST_LOG` allows it.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use chrono::{DateTime, Utc};
use ot_core::EntityType;
use serde::Serialize;
use serde_json::{Map, Value};

/// Entries kept before the oldest is evicted.
pub const LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine step an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOp {
    Queue,
    Pull,
    Merge,
    Push,
    Conflict,
    Cycle,
    Scheduler,
    IsolatedSync,
}

impl LogOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOp::Queue => "queue",
            LogOp::Pull => "pull",
            LogOp::Merge => "merge",
            LogOp::Push => "push",
            LogOp::Conflict => "conflict",
            LogOp::Cycle => "cycle",
            LogOp::Scheduler => "scheduler",
            LogOp::IsolatedSync => "isolated_sync",
        }
    }
}

impl fmt::Display for LogOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Increasing across the life of the log, never reused.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub operation: LogOp,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

/// Fixed-capacity FIFO that silently drops its oldest item when full.
#[derive(Debug)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        RingBuffer { items: VecDeque::with_capacity(capacity), capacity: capacity.max(1) }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

struct LogState {
    entries: RingBuffer<LogEntry>,
    next_id: u64,
    /// Entries held back per thread by [`DebugLog::hold`].
    held: HashMap<ThreadId, Vec<LogEntry>>,
}

impl LogState {
    fn record(&mut self, mut entry: LogEntry) -> u64 {
        entry.id = self.next_id;
        self.next_id += 1;
        let id = entry.id;
        self.entries.push(entry);
        id
    }
}

/// Shared handle to the debug log. Clones append to the same buffer.
#[derive(Clone)]
pub struct DebugLog {
    state: Arc<Mutex<LogState>>,
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugLog {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DebugLog {
            state: Arc::new(Mutex::new(LogState {
                entries: RingBuffer::new(capacity),
                next_id: 1,
                held: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        // A panic while appending leaves the buffer consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts an entry; nothing is recorded until [`EntryBuilder::emit`].
    pub fn entry(&self, level: LogLevel, operation: LogOp, message: impl Into<String>) -> EntryBuilder<'_> {
        EntryBuilder {
            log: self,
            level,
            operation,
            message: message.into(),
            entity: None,
            context: Map::new(),
        }
    }

    pub fn info(&self, operation: LogOp, message: impl Into<String>) -> EntryBuilder<'_> {
        self.entry(LogLevel::Info, operation, message)
    }

    pub fn success(&self, operation: LogOp, message: impl Into<String>) -> EntryBuilder<'_> {
        self.entry(LogLevel::Success, operation, message)
    }

    pub fn warn(&self, operation: LogOp, message: impl Into<String>) -> EntryBuilder<'_> {
        self.entry(LogLevel::Warn, operation, message)
    }

    pub fn error(&self, operation: LogOp, message: impl Into<String>) -> EntryBuilder<'_> {
        self.entry(LogLevel::Error, operation, message)
    }

    /// Snapshot of the retained entries, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.capacity()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Runs `f` with the entries this thread emits held back. They are
    /// recorded if `f` returns `Ok` and dropped if it returns `Err`.
    ///
    /// `f` must not await: holding is per thread. Nested holds share the
    /// outermost one.
    pub fn hold<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let me = thread::current().id();
        {
            let mut state = self.lock();
            if state.held.contains_key(&me) {
                drop(state);
                return f();
            }
            state.held.insert(me, Vec::new());
        }

        let result = f();

        let held = self.lock().held.remove(&me).unwrap_or_default();
        if result.is_ok() {
            for entry in &held {
                mirror(entry);
            }
            let mut state = self.lock();
            for entry in held {
                state.record(entry);
            }
        } else if !held.is_empty() {
            tracing::debug!(dropped = held.len(), "debug log entries rolled back");
        }
        result
    }

    fn append(&self, builder: EntryBuilder<'_>) -> Option<u64> {
        let (entity_type, entity_id) = match builder.entity {
            Some((t, id)) => (Some(t), Some(id)),
            None => (None, None),
        };
        let entry = LogEntry {
            id: 0,
            timestamp: Utc::now(),
            level: builder.level,
            operation: builder.operation,
            message: builder.message,
            entity_type,
            entity_id,
            context: builder.context,
        };

        let mut state = self.lock();
        if let Some(held) = state.held.get_mut(&thread::current().id()) {
            held.push(entry);
            return None;
        }
        mirror(&entry);
        Some(state.record(entry))
    }
}

fn mirror(entry: &LogEntry) {
    let op = entry.operation.as_str();
    let entity = entry.entity_id.as_deref().unwrap_or("-");
    let message = entry.message.as_str();
    match entry.level {
        LogLevel::Info | LogLevel::Success => tracing::info!(op, entity, "{}", message),
        LogLevel::Warn => tracing::warn!(op, entity, "{}", message),
        LogLevel::Error => tracing::error!(op, entity, "{}", message),
    }
}

/// A log entry under construction.
#[must_use = "entries are recorded only by emit()"]
pub struct EntryBuilder<'a> {
    log: &'a DebugLog,
    level: LogLevel,
    operation: LogOp,
    message: String,
    entity: Option<(EntityType, String)>,
    context: Map<String, Value>,
}

impl EntryBuilder<'_> {
    pub fn entity(mut self, entity_type: EntityType, id: impl Into<String>) -> Self {
        self.entity = Some((entity_type, id.into()));
        self
    }

    pub fn context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    /// Records the entry and returns its id, or `None` while held back by
    /// [`DebugLog::hold`].
    pub fn emit(self) -> Option<u64> {
        let log = self.log;
        log.append(self)
    }
}
