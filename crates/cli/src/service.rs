// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync service: one object owning the replica's moving parts.
//!
//! Built once per process from the project [`Config`], handed to whatever
//! drives it (the CLI here), and torn down with [`SyncService::shutdown`].

use std::sync::{Arc, Mutex};

use ot_core::{Conflict, Database, Issue, LocalClock, PendingOperation};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::search::SearchIndex;
use crate::sync::{
    ConflictRegistry, DebugLog, LocalEditor, LogEntry, LogOp, PendingQueue, PushOutcome,
    RemoteClient, Resolution, SharedStore, SyncEngine, SyncError, SyncOutcome, SyncResult,
    SyncScheduler, Trigger, WsRemote,
};

pub struct SyncService<R: RemoteClient = WsRemote> {
    store: SharedStore,
    connection_id: String,
    scheduler: Arc<SyncScheduler<R>>,
    search: Arc<SearchIndex>,
    editor: LocalEditor,
    log: DebugLog,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncService<WsRemote> {
    /// Starts a service talking to the configured WebSocket remote.
    pub async fn open(config: &Config, db: Database) -> SyncResult<Self> {
        let remote = Arc::new(WsRemote::new(&config.remote));
        Self::with_remote(config, db, remote).await
    }
}

impl<R: RemoteClient> SyncService<R> {
    /// Wires the service around `remote`, indexes the store and starts the
    /// background tasks (search watcher, periodic timer when configured).
    pub async fn with_remote(config: &Config, db: Database, remote: Arc<R>) -> SyncResult<Self> {
        let store: SharedStore = Arc::new(tokio::sync::Mutex::new(db));
        let log = DebugLog::new();
        let clock = Arc::new(LocalClock::new());
        let queue = Arc::new(PendingQueue::new(log.clone(), Arc::clone(&clock)));
        let conflicts = Arc::new(ConflictRegistry::new(log.clone()));

        let engine = SyncEngine::new(
            Arc::clone(&store),
            remote,
            Arc::clone(&queue),
            conflicts,
            config.sync.conflict_policy.build(),
            log.clone(),
        )
        .with_max_attempts(config.sync.max_attempts);

        let scheduler =
            Arc::new(SyncScheduler::new(Arc::new(engine), config.sync.clone(), log.clone()));
        scheduler.set_active_connection(&config.connection);

        let shutdown = CancellationToken::new();
        let search = Arc::new(SearchIndex::new(config.search.fuzziness));
        let mut tasks = vec![search.watch(Arc::clone(&store), shutdown.child_token()).await?];
        if let Some(interval) = config.sync.periodic_interval() {
            tasks.push(scheduler.spawn_periodic(interval, shutdown.child_token()));
        }

        tracing::debug!(connection = %config.connection, "sync service started");

        Ok(SyncService {
            editor: LocalEditor::new(Arc::clone(&store), queue, clock),
            store,
            connection_id: config.connection.clone(),
            scheduler,
            search,
            log,
            shutdown,
            tasks: Mutex::new(tasks),
        })
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn scheduler(&self) -> &Arc<SyncScheduler<R>> {
        &self.scheduler
    }

    /// Local mutators. Every edit is queued for the next cycle.
    pub fn editor(&self) -> &LocalEditor {
        &self.editor
    }

    pub fn debug_log(&self) -> Vec<LogEntry> {
        self.log.entries()
    }

    /// Runs a manual cycle for the active connection.
    pub async fn start_sync(&self) -> SyncResult<SyncOutcome> {
        self.scheduler.start_sync(&self.connection_id, Trigger::Manual).await
    }

    pub async fn pending_count(&self) -> SyncResult<usize> {
        let db = self.store.lock().await;
        self.scheduler.engine().queue().count(&db)
    }

    pub async fn pending_operations(&self) -> SyncResult<Vec<PendingOperation>> {
        let db = self.store.lock().await;
        self.scheduler.engine().queue().list_pending(&db)
    }

    pub async fn conflicts(&self) -> SyncResult<Vec<Conflict>> {
        let db = self.store.lock().await;
        self.scheduler.engine().conflicts().list(&db)
    }

    pub fn is_online(&self) -> bool {
        self.scheduler.is_online()
    }

    /// Records connectivity; see [`SyncScheduler::set_online`].
    pub async fn set_online(&self, online: bool) -> SyncResult<Option<SyncOutcome>> {
        self.scheduler.set_online(online).await
    }

    /// Pushes one queued operation outside the cycle. An abandoned
    /// operation is requeued first.
    pub async fn sync_single_operation(&self, op_id: &str) -> SyncResult<PushOutcome> {
        if !self.is_online() {
            return Err(SyncError::Offline);
        }
        {
            let db = self.store.lock().await;
            let op = db.get_operation(op_id)?;
            if op.is_abandoned() {
                self.scheduler.engine().queue().retry(&db, op_id)?;
            }
        }
        self.scheduler
            .engine()
            .push_operation(&self.connection_id, op_id, LogOp::IsolatedSync)
            .await
    }

    /// Discards a queued operation, reverting its record.
    pub async fn delete_pending_operation(&self, op_id: &str) -> SyncResult<PendingOperation> {
        let db = self.store.lock().await;
        self.scheduler.engine().queue().discard(&db, op_id)
    }

    pub async fn resolve_conflict(&self, entity_id: &str, resolution: Resolution) -> SyncResult<()> {
        let db = self.store.lock().await;
        let engine = self.scheduler.engine();
        engine.conflicts().resolve(&db, engine.queue(), entity_id, resolution)
    }

    pub async fn search(&self, query: &str) -> SyncResult<Vec<Issue>> {
        let db = self.store.lock().await;
        Ok(self.search.search(&db, query)?)
    }

    /// Rebuilds the search index from the store; returns the number of
    /// indexed issues.
    pub async fn reindex_all(&self) -> SyncResult<usize> {
        let db = self.store.lock().await;
        Ok(self.search.reindex_all(&db)?)
    }

    /// Cancels any cycle and stops the background tasks.
    pub async fn shutdown(&self) {
        self.scheduler.cancel_all();
        self.shutdown.cancel();
        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.drain(..).collect()
        };
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("background task ended abnormally: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
