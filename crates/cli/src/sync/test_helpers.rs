// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use ot_core::{
    Database, Issue, LocalClock, PolicyKind, PullBatch, PushAck, PushRequest, RemoteDelta,
    RemoteEntity, SyncStatus,
};
use tokio::sync::Semaphore;

use super::client::{RemoteClient, RemoteError, RemoteFuture};
use super::conflicts::ConflictRegistry;
use super::edit::LocalEditor;
use super::engine::SyncEngine;
use super::log::DebugLog;
use super::queue::PendingQueue;
use super::SharedStore;

pub const CONN: &str = "acme";

/// Scripted remote. Unscripted pulls return an empty batch; unscripted
/// pushes are acknowledged with a fresh version.
#[derive(Default)]
pub struct MockRemote {
    pulls: Mutex<VecDeque<Result<PullBatch, RemoteError>>>,
    pushes: Mutex<VecDeque<Result<PushAck, RemoteError>>>,
    pushed: Mutex<Vec<PushRequest>>,
    cursors: Mutex<Vec<Option<String>>>,
    pull_calls: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
    push_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_pull(&self, batch: Result<PullBatch, RemoteError>) {
        self.pulls.lock().unwrap().push_back(batch);
    }

    pub fn queue_push(&self, ack: Result<PushAck, RemoteError>) {
        self.pushes.lock().unwrap().push_back(ack);
    }

    /// Requests received by `push`, in order.
    pub fn pushed(&self) -> Vec<PushRequest> {
        self.pushed.lock().unwrap().clone()
    }

    /// Cursors received by `pull`, in order.
    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    /// Makes every pull wait for a permit on the returned semaphore.
    pub fn gate_pulls(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Makes every push wait for a permit, after the request is recorded.
    pub fn gate_pushes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.push_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

impl RemoteClient for MockRemote {
    fn pull<'a>(
        &'a self,
        _connection_id: &'a str,
        cursor: Option<&'a str>,
    ) -> RemoteFuture<'a, PullBatch> {
        Box::pin(async move {
            self.pull_calls.fetch_add(1, Ordering::SeqCst);
            self.cursors.lock().unwrap().push(cursor.map(String::from));
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }
            let scripted = self.pulls.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| Ok(PullBatch::default()))
        })
    }

    fn push<'a>(
        &'a self,
        _connection_id: &'a str,
        request: &'a PushRequest,
    ) -> RemoteFuture<'a, PushAck> {
        Box::pin(async move {
            let n = {
                let mut pushed = self.pushed.lock().unwrap();
                pushed.push(request.clone());
                pushed.len()
            };
            let gate = self.push_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }
            let scripted = self.pushes.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| Ok(PushAck::new(format!("pushed-{}", n))))
        })
    }
}

pub fn ts(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// An issue as the remote would send it.
pub fn remote_issue(id: &str, key: &str, summary: &str, version: &str) -> Issue {
    let mut issue = Issue::new(id, key, key.split('-').next().unwrap_or("ABC"), summary, ts(0));
    issue.local.remote_version = Some(version.to_string());
    issue
}

pub fn upsert(issue: &Issue) -> RemoteDelta {
    RemoteDelta::upsert(RemoteEntity::Issue(issue.clone()))
}

pub fn page(deltas: Vec<RemoteDelta>, cursor: &str) -> PullBatch {
    PullBatch { deltas, next_cursor: Some(cursor.to_string()), has_more: false }
}

pub fn shared_store() -> SharedStore {
    Arc::new(tokio::sync::Mutex::new(Database::open_in_memory().unwrap()))
}

/// Stores an issue as already synced.
pub async fn seed(store: &SharedStore, issue: &Issue) {
    let mut issue = issue.clone();
    issue.local.sync_status = SyncStatus::Synced;
    store.lock().await.put_issue(&issue).unwrap();
}

/// Engine, editor and collaborators over an in-memory store.
pub struct Harness {
    pub store: SharedStore,
    pub remote: Arc<MockRemote>,
    pub log: DebugLog,
    pub queue: Arc<PendingQueue>,
    pub conflicts: Arc<ConflictRegistry>,
    pub engine: Arc<SyncEngine<MockRemote>>,
    pub editor: LocalEditor,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(PolicyKind::FieldOverlap, 5)
    }

    pub fn with(policy: PolicyKind, max_attempts: u32) -> Self {
        let store = shared_store();
        let remote = Arc::new(MockRemote::new());
        let log = DebugLog::new();
        let clock = Arc::new(LocalClock::new());
        let queue = Arc::new(PendingQueue::new(log.clone(), Arc::clone(&clock)));
        let conflicts = Arc::new(ConflictRegistry::new(log.clone()));
        let engine = Arc::new(
            SyncEngine::new(
                Arc::clone(&store),
                Arc::clone(&remote),
                Arc::clone(&queue),
                Arc::clone(&conflicts),
                policy.build(),
                log.clone(),
            )
            .with_max_attempts(max_attempts),
        );
        let editor = LocalEditor::new(Arc::clone(&store), Arc::clone(&queue), clock);
        Harness { store, remote, log, queue, conflicts, engine, editor }
    }

    pub async fn issue(&self, id: &str) -> Option<Issue> {
        self.store.lock().await.find_issue(id).unwrap()
    }

    pub async fn pending(&self) -> Vec<ot_core::PendingOperation> {
        self.store.lock().await.list_operations().unwrap()
    }
}
