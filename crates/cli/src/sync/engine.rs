// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync cycle: pull, merge, push, finalize.
//!
//! The store lock is taken for each local step and released before every
//! network call, so local edits keep flowing while a cycle waits on the
//! remote. Progress is committed page by page and operation by operation;
//! a cancelled or failed cycle keeps whatever it already committed.

use std::sync::Arc;

use chrono::Utc;
use ot_core::{
    Comment, Conflict, ConflictPolicy, Database, EntityType, Issue, OpKind, PendingOperation,
    PushAck, PushRequest, RemoteDelta, RemoteEntity, Replica, ReplicaTable, SyncMeta, SyncStatus,
    Verdict,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::client::{RemoteClient, RemoteError};
use super::conflicts::ConflictRegistry;
use super::error::{SyncError, SyncResult};
use super::log::{DebugLog, LogOp};
use super::queue::{mark_record, PendingQueue};
use super::SharedStore;

/// Default push attempts before an operation is abandoned.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Counts for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub pulled: usize,
    pub merged: usize,
    pub conflicted: usize,
    pub pushed: usize,
    pub failed: usize,
    pub deferred: usize,
}

/// What merging one remote delta did locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Overwritten,
    /// Same version as stored, or nothing local to act on.
    Unchanged,
    /// Remote fields applied next to a pending local change.
    AutoMerged,
    Conflicted,
    /// Removed locally to follow the remote.
    Deleted,
}

/// What happened to one pending operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    /// Pushed, but a newer local edit arrived meanwhile and stays queued.
    PushedAmended,
    /// The entity is in conflict; nothing was sent.
    Skipped,
    /// Waiting for the parent issue's create; nothing was sent.
    Deferred,
    /// The remote answered with a conflict.
    Conflicted,
    /// Attempt recorded; the operation stays queued.
    Retrying { attempts: u32 },
    /// The operation was abandoned.
    Abandoned,
    /// The operation no longer exists.
    Gone,
}

/// Drives cycles against one remote.
pub struct SyncEngine<R: RemoteClient> {
    store: SharedStore,
    remote: Arc<R>,
    queue: Arc<PendingQueue>,
    conflicts: Arc<ConflictRegistry>,
    policy: Arc<dyn ConflictPolicy>,
    log: DebugLog,
    max_attempts: u32,
}

impl<R: RemoteClient> SyncEngine<R> {
    pub fn new(
        store: SharedStore,
        remote: Arc<R>,
        queue: Arc<PendingQueue>,
        conflicts: Arc<ConflictRegistry>,
        policy: Arc<dyn ConflictPolicy>,
        log: DebugLog,
    ) -> Self {
        SyncEngine {
            store,
            remote,
            queue,
            conflicts,
            policy,
            log,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn conflicts(&self) -> &Arc<ConflictRegistry> {
        &self.conflicts
    }

    /// Runs one full cycle for `connection_id`.
    ///
    /// Pull, storage and auth failures end the cycle with an error. Push
    /// failures are recorded on their operations and do not.
    pub async fn run_cycle(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
    ) -> SyncResult<CycleReport> {
        self.log
            .info(LogOp::Cycle, format!("Sync started for {}", connection_id))
            .context("policy", self.policy.name())
            .emit();

        let mut report = CycleReport::default();
        let result = match self.pull_phase(connection_id, cancel, &mut report).await {
            Ok(()) => self.push_phase(connection_id, cancel, &mut report).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.log
                    .success(
                        LogOp::Cycle,
                        format!(
                            "Sync finished: {} pulled, {} merged, {} conflicted, {} pushed, {} failed",
                            report.pulled, report.merged, report.conflicted, report.pushed, report.failed
                        ),
                    )
                    .context("report", serde_json::to_value(report).unwrap_or_default())
                    .emit();
                Ok(report)
            }
            Err(SyncError::Cancelled) => {
                self.log.warn(LogOp::Cycle, "Sync cancelled").emit();
                Err(SyncError::Cancelled)
            }
            Err(e) => {
                self.log.error(LogOp::Cycle, format!("Sync failed: {}", e)).emit();
                Err(e)
            }
        }
    }

    async fn pull_phase(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
        report: &mut CycleReport,
    ) -> SyncResult<()> {
        let mut cursor = {
            let db = self.store.lock().await;
            db.get_sync_meta(connection_id)?.and_then(|m| m.last_sync_cursor)
        };

        loop {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            self.log
                .info(
                    LogOp::Pull,
                    match &cursor {
                        Some(c) => format!("Pulling changes since {}", c),
                        None => "Pulling everything (no cursor)".to_string(),
                    },
                )
                .emit();

            let batch = match self.remote.pull(connection_id, cursor.as_deref()).await {
                Ok(batch) => batch,
                Err(e) => {
                    self.log.error(LogOp::Pull, format!("Pull failed: {}", e)).emit();
                    return Err(e.into());
                }
            };
            report.pulled += batch.deltas.len();

            let next_cursor = batch.next_cursor.clone().or_else(|| cursor.clone());
            {
                let db = self.store.lock().await;
                let mut page = CycleReport::default();
                // Entries about a page that rolls back are dropped with it.
                self.log.hold(|| {
                    db.try_transaction(|db| -> SyncResult<()> {
                        for delta in &batch.deltas {
                            match self.merge_delta(db, connection_id, delta)? {
                                MergeOutcome::Unchanged => {}
                                MergeOutcome::Conflicted => page.conflicted += 1,
                                _ => page.merged += 1,
                            }
                        }
                        db.put_sync_meta(&SyncMeta {
                            connection_id: connection_id.to_string(),
                            last_sync_time: Utc::now(),
                            last_sync_cursor: next_cursor.clone(),
                        })?;
                        Ok(())
                    })
                })?;
                report.merged += page.merged;
                report.conflicted += page.conflicted;
            }
            self.log
                .info(LogOp::Pull, format!("Merged page of {} changes", batch.deltas.len()))
                .context("cursor", next_cursor.clone())
                .emit();

            cursor = next_cursor;
            if !batch.has_more {
                return Ok(());
            }
        }
    }

    /// Merges one remote delta into the store.
    pub fn merge_delta(
        &self,
        db: &Database,
        connection_id: &str,
        delta: &RemoteDelta,
    ) -> SyncResult<MergeOutcome> {
        match delta {
            RemoteDelta::Upsert { entity: RemoteEntity::Issue(issue), changed_fields } => {
                self.merge_upsert(db, connection_id, issue, changed_fields.as_deref())
            }
            RemoteDelta::Upsert { entity: RemoteEntity::Comment(comment), changed_fields } => {
                self.merge_upsert(db, connection_id, comment, changed_fields.as_deref())
            }
            RemoteDelta::Delete { entity_type: EntityType::Issue, id } => {
                if self.hold_for_comment_edits(db, connection_id, id)? {
                    return Ok(MergeOutcome::Conflicted);
                }
                self.merge_delete::<Issue>(db, connection_id, id)
            }
            RemoteDelta::Delete { entity_type: EntityType::Comment, id } => {
                self.merge_delete::<Comment>(db, connection_id, id)
            }
        }
    }

    fn merge_upsert<T: ReplicaTable>(
        &self,
        db: &Database,
        connection_id: &str,
        remote: &T,
        declared: Option<&[String]>,
    ) -> SyncResult<MergeOutcome> {
        let id = remote.id();
        let version = remote.effective_version();

        let Some(mut local) = T::load(db, id)? else {
            let mut record = remote.clone();
            let meta = record.meta_mut();
            meta.local_updated = remote.updated().timestamp_millis();
            meta.sync_status = SyncStatus::Synced;
            meta.sync_error = None;
            meta.remote_version = Some(version);
            meta.deleted = false;
            T::save(db, &record)?;
            self.log_merge(T::ENTITY, id, format!("Inserted {} {}", T::ENTITY, remote.display_key()));
            return Ok(MergeOutcome::Inserted);
        };

        if local.meta().remote_version.as_deref() == Some(version.as_str()) {
            return Ok(MergeOutcome::Unchanged);
        }

        let Some(op) = db.operation_for_entity(T::ENTITY, id)? else {
            let mut record = remote.clone();
            let meta = record.meta_mut();
            meta.local_updated = local.meta().local_updated;
            meta.sync_status = SyncStatus::Synced;
            meta.sync_error = None;
            meta.remote_version = Some(version);
            meta.deleted = false;
            T::save(db, &record)?;
            self.log_merge(T::ENTITY, id, format!("Updated {} {}", T::ENTITY, remote.display_key()));
            return Ok(MergeOutcome::Overwritten);
        };

        let local_fields = local.fields();
        let remote_fields = remote.fields();
        let in_conflict = db.is_conflicted(id)?;
        match self.policy.judge(&op, &local_fields, Some(&remote_fields), declared) {
            Verdict::AutoMerge { remote_fields: names } if !in_conflict => {
                let patch: ot_core::FieldMap = remote_fields
                    .into_iter()
                    .filter(|(name, _)| names.contains(name) && !op.fields.contains_key(name))
                    .collect();
                if op.kind != OpKind::Delete {
                    local.apply_patch(&patch)?;
                }
                local.adopt_remote_attributes(remote);
                local.meta_mut().remote_version = Some(version);
                T::save(db, &local)?;
                self.log
                    .info(LogOp::Merge, format!("Auto-merged remote changes into {}", local.display_key()))
                    .entity(T::ENTITY, id)
                    .context("remote_fields", names)
                    .emit();
                Ok(MergeOutcome::AutoMerged)
            }
            verdict => {
                let fields = match verdict {
                    Verdict::Conflict { fields } => fields,
                    // Already in conflict: keep the recorded field set.
                    Verdict::AutoMerge { .. } => db
                        .find_conflict(id)?
                        .map(|c| c.fields)
                        .unwrap_or_else(|| op.changed_fields().into_iter().collect()),
                };
                self.conflicts.raise(
                    db,
                    &Conflict {
                        entity_type: T::ENTITY,
                        entity_id: id.to_string(),
                        entity_key: local.display_key().to_string(),
                        connection_id: connection_id.to_string(),
                        fields,
                        local_value: local_fields,
                        remote_value: Some(remote_fields),
                        remote_version: Some(version),
                        detected_at: Utc::now(),
                    },
                )?;
                Ok(MergeOutcome::Conflicted)
            }
        }
    }

    fn merge_delete<T: ReplicaTable>(
        &self,
        db: &Database,
        connection_id: &str,
        id: &str,
    ) -> SyncResult<MergeOutcome> {
        let Some(local) = T::load(db, id)? else {
            return Ok(MergeOutcome::Unchanged);
        };

        match db.operation_for_entity(T::ENTITY, id)? {
            None => {
                T::purge(db, id)?;
                self.log_merge(T::ENTITY, id, format!("Removed {} {}", T::ENTITY, local.display_key()));
                Ok(MergeOutcome::Deleted)
            }
            Some(op) if op.kind == OpKind::Delete => {
                self.queue.remove(db, &op.id)?;
                db.delete_conflict(id)?;
                T::purge(db, id)?;
                self.log_merge(
                    T::ENTITY,
                    id,
                    format!("{} was already deleted remotely", local.display_key()),
                );
                Ok(MergeOutcome::Deleted)
            }
            Some(op) => {
                let local_fields = local.fields();
                let fields = match self.policy.judge(&op, &local_fields, None, None) {
                    Verdict::Conflict { fields } => fields,
                    Verdict::AutoMerge { .. } => op.changed_fields().into_iter().collect(),
                };
                self.conflicts.raise(
                    db,
                    &Conflict {
                        entity_type: T::ENTITY,
                        entity_id: id.to_string(),
                        entity_key: local.display_key().to_string(),
                        connection_id: connection_id.to_string(),
                        fields,
                        local_value: local_fields,
                        remote_value: None,
                        remote_version: None,
                        detected_at: Utc::now(),
                    },
                )?;
                Ok(MergeOutcome::Conflicted)
            }
        }
    }

    /// Comment edits queued under an issue the remote deleted keep the issue
    /// as a remote-delete conflict instead of letting the purge take them.
    /// Queued comment deletes agree with the remote and are settled.
    fn hold_for_comment_edits(
        &self,
        db: &Database,
        connection_id: &str,
        issue_id: &str,
    ) -> SyncResult<bool> {
        let Some(issue) = Issue::load(db, issue_id)? else {
            return Ok(false);
        };
        let own = db.operation_for_entity(EntityType::Issue, issue_id)?;
        let local_delete = own.as_ref().is_some_and(|op| op.kind == OpKind::Delete);

        let mut edited = Vec::new();
        for op in db.comment_operations(issue_id)? {
            if local_delete || op.kind == OpKind::Delete {
                self.queue.remove(db, &op.id)?;
            } else {
                edited.push(op.entity_id);
            }
        }
        if edited.is_empty() {
            return Ok(false);
        }

        let mut fields: Vec<String> =
            own.map(|op| op.changed_fields().into_iter().collect()).unwrap_or_default();
        fields.push("comments".to_string());
        self.conflicts.raise(
            db,
            &Conflict {
                entity_type: EntityType::Issue,
                entity_id: issue_id.to_string(),
                entity_key: issue.key.clone(),
                connection_id: connection_id.to_string(),
                fields,
                local_value: issue.fields(),
                remote_value: None,
                remote_version: None,
                detected_at: Utc::now(),
            },
        )?;
        self.log
            .warn(LogOp::Merge, format!("Kept {} for {} queued comment changes", issue.key, edited.len()))
            .entity(EntityType::Issue, issue_id)
            .context("comments", edited)
            .emit();
        Ok(true)
    }

    fn log_merge(&self, entity_type: EntityType, id: &str, message: String) {
        self.log.info(LogOp::Merge, message).entity(entity_type, id).emit();
    }

    async fn push_phase(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
        report: &mut CycleReport,
    ) -> SyncResult<()> {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let ops = {
            let db = self.store.lock().await;
            self.queue.list_pending(&db)?
        };

        for op in ops {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            if op.is_abandoned() {
                continue;
            }
            match self.push_operation(connection_id, &op.id, LogOp::Push).await? {
                PushOutcome::Pushed | PushOutcome::PushedAmended => report.pushed += 1,
                PushOutcome::Conflicted => report.conflicted += 1,
                PushOutcome::Deferred => report.deferred += 1,
                PushOutcome::Retrying { .. } | PushOutcome::Abandoned => report.failed += 1,
                PushOutcome::Skipped | PushOutcome::Gone => {}
            }
        }
        Ok(())
    }

    /// Pushes one operation and settles the result locally.
    ///
    /// Only auth and storage failures are returned as errors; every other
    /// remote failure is recorded on the operation.
    pub async fn push_operation(
        &self,
        connection_id: &str,
        op_id: &str,
        tag: LogOp,
    ) -> SyncResult<PushOutcome> {
        let (op, request, key) = {
            let db = self.store.lock().await;
            let Some(op) = db.find_operation(op_id)? else {
                return Ok(PushOutcome::Gone);
            };
            if db.is_conflicted(&op.entity_id)? {
                return Ok(PushOutcome::Skipped);
            }
            let parent = parent_issue(&db, &op)?;
            if let Some(parent) = &parent {
                if db.is_conflicted(parent)? {
                    return Ok(PushOutcome::Skipped);
                }
            }
            if let Some(parent_op) = self.waits_for_parent(&db, &op, parent.as_deref())? {
                if parent_op.is_abandoned() {
                    self.flag_stuck_child(&db, &op, &parent_op)?;
                } else {
                    self.log
                        .info(tag, format!("Deferred {} until its issue is created", op.id))
                        .entity(op.entity_type, &op.entity_id)
                        .emit();
                }
                return Ok(PushOutcome::Deferred);
            }
            let Some((request, key)) = prepare(&db, &op)? else {
                // The record went away under the operation (e.g. with its issue).
                self.queue.remove(&db, &op.id)?;
                return Ok(PushOutcome::Gone);
            };
            (op, request, key)
        };

        self.log
            .info(tag, format!("Pushing {} of {} {}", op.kind, op.entity_type, key))
            .entity(op.entity_type, &op.entity_id)
            .context("operation_id", op.id.as_str())
            .context("attempt", op.attempts + 1)
            .emit();

        let result = self.remote.push(connection_id, &request).await;

        let db = self.store.lock().await;
        match result {
            Ok(ack) => {
                let outcome = db.try_transaction(|db| self.settle_ack(db, &op, &ack))?;
                self.log
                    .success(tag, format!("Pushed {} of {} {}", op.kind, op.entity_type, key))
                    .entity(op.entity_type, ack.remote_id.as_deref().unwrap_or(&op.entity_id))
                    .context("remote_version", ack.remote_version.as_str())
                    .emit();
                Ok(outcome)
            }
            Err(RemoteError::Conflict { message, remote_version, remote }) => {
                self.raise_push_conflict(&db, connection_id, &op, &key, remote_version, remote.map(|r| *r))?;
                self.log.warn(tag, format!("Remote refused {}: {}", key, message)).emit();
                Ok(PushOutcome::Conflicted)
            }
            Err(RemoteError::Auth(message)) => {
                self.log.error(tag, format!("Push of {} not authorized: {}", key, message)).emit();
                Err(RemoteError::Auth(message).into())
            }
            Err(e) => {
                let reason = e.to_string();
                let current = db.find_operation(&op.id)?;
                if !current.as_ref().is_some_and(|c| c.same_change(&op)) {
                    // Amended or removed while in flight; the new edit gets a fresh try.
                    return Ok(PushOutcome::Gone);
                }
                let op = self.queue.mark_attempt(&db, &op.id, Some(&reason))?;
                if !e.is_retryable() || op.attempts >= self.max_attempts {
                    self.queue.abandon(&db, &op.id, &reason)?;
                    return Ok(PushOutcome::Abandoned);
                }
                Ok(PushOutcome::Retrying { attempts: op.attempts })
            }
        }
    }

    /// The queued create of the issue a comment create belongs to, if the
    /// issue has not reached the remote yet.
    fn waits_for_parent(
        &self,
        db: &Database,
        op: &PendingOperation,
        parent: Option<&str>,
    ) -> SyncResult<Option<PendingOperation>> {
        if op.entity_type != EntityType::Comment || op.kind != OpKind::Create {
            return Ok(None);
        }
        let Some(parent) = parent else {
            return Ok(None);
        };
        Ok(db
            .operation_for_entity(EntityType::Issue, parent)?
            .filter(|p| p.kind == OpKind::Create))
    }

    /// Records on a deferred comment that its issue's create was abandoned.
    /// No attempt is counted; retrying the issue releases the comment.
    fn flag_stuck_child(
        &self,
        db: &Database,
        op: &PendingOperation,
        parent_op: &PendingOperation,
    ) -> SyncResult<()> {
        let parent_key = Issue::load(db, &parent_op.entity_id)?
            .map(|issue| issue.key)
            .unwrap_or_else(|| parent_op.entity_id.clone());
        let reason = match &parent_op.last_error {
            Some(error) => format!("waiting for abandoned create of {}: {}", parent_key, error),
            None => format!("waiting for abandoned create of {}", parent_key),
        };
        if op.last_error.as_deref() == Some(reason.as_str()) {
            return Ok(());
        }
        db.transaction(|db| {
            let mut stuck = op.clone();
            stuck.last_error = Some(reason.clone());
            db.update_operation(&stuck)?;
            mark_record(db, op.entity_type, &op.entity_id, SyncStatus::Pending, Some(&reason))
        })?;
        self.log
            .warn(LogOp::Push, format!("{} is stuck: {}", op.id, reason))
            .entity(op.entity_type, &op.entity_id)
            .context("parent_operation", parent_op.id.as_str())
            .emit();
        Ok(())
    }

    fn settle_ack(
        &self,
        db: &Database,
        pushed: &PendingOperation,
        ack: &PushAck,
    ) -> SyncResult<PushOutcome> {
        let Some(current) = db.find_operation(&pushed.id)? else {
            self.log
                .warn(LogOp::Push, format!("{} was dropped locally while in flight", pushed.id))
                .entity(pushed.entity_type, &pushed.entity_id)
                .emit();
            return Ok(PushOutcome::Gone);
        };

        let mut entity_id = pushed.entity_id.clone();
        if pushed.kind == OpKind::Create {
            if let Some(remote_id) = ack.remote_id.as_deref().filter(|rid| *rid != entity_id) {
                match pushed.entity_type {
                    EntityType::Issue => {
                        db.rekey_issue(&entity_id, remote_id, ack.remote_key.as_deref())?
                    }
                    EntityType::Comment => db.rekey_comment(&entity_id, remote_id)?,
                }
                entity_id = remote_id.to_string();
            }
        }

        if pushed.kind == OpKind::Delete {
            self.queue.remove(db, &pushed.id)?;
            match pushed.entity_type {
                EntityType::Issue => Issue::purge(db, &entity_id)?,
                EntityType::Comment => Comment::purge(db, &entity_id)?,
            }
            return Ok(PushOutcome::Pushed);
        }

        let amended = !current.same_change(pushed);
        if amended {
            let mut next = db.get_operation(&pushed.id)?;
            if next.kind == OpKind::Create {
                next.kind = OpKind::Update;
            }
            // What was just pushed is what the remote now holds.
            for (name, value) in &pushed.fields {
                if next.fields.contains_key(name) {
                    next.base.insert(name.clone(), value.clone());
                }
            }
            db.update_operation(&next)?;
        } else {
            self.queue.remove(db, &pushed.id)?;
        }

        match pushed.entity_type {
            EntityType::Issue => acknowledge::<Issue>(db, &entity_id, ack, amended)?,
            EntityType::Comment => acknowledge::<Comment>(db, &entity_id, ack, amended)?,
        }
        Ok(if amended { PushOutcome::PushedAmended } else { PushOutcome::Pushed })
    }

    fn raise_push_conflict(
        &self,
        db: &Database,
        connection_id: &str,
        op: &PendingOperation,
        key: &str,
        remote_version: Option<String>,
        remote: Option<RemoteEntity>,
    ) -> SyncResult<()> {
        let local_value = match op.entity_type {
            EntityType::Issue => Issue::load(db, &op.entity_id)?.map(|r| r.fields()),
            EntityType::Comment => Comment::load(db, &op.entity_id)?.map(|r| r.fields()),
        }
        .unwrap_or_default();
        let remote_value = remote.map(|r| r.fields());
        let fields = match &remote_value {
            Some(remote) => match self.policy.judge(op, &local_value, Some(remote), None) {
                Verdict::Conflict { fields } => fields,
                Verdict::AutoMerge { .. } => op.changed_fields().into_iter().collect(),
            },
            None => op.changed_fields().into_iter().collect(),
        };
        // A refusal without a remote snapshot still keeps the remote side.
        let remote_value = remote_value.or_else(|| Some(op.base.clone()));
        self.conflicts.raise(
            db,
            &Conflict {
                entity_type: op.entity_type,
                entity_id: op.entity_id.clone(),
                entity_key: key.to_string(),
                connection_id: connection_id.to_string(),
                fields,
                local_value,
                remote_value,
                remote_version,
                detected_at: Utc::now(),
            },
        )
    }
}

/// The issue a comment operation hangs under.
fn parent_issue(db: &Database, op: &PendingOperation) -> SyncResult<Option<String>> {
    if op.entity_type != EntityType::Comment {
        return Ok(None);
    }
    if let Some(parent) = op.fields.get("issue_id").and_then(|v| v.as_str()) {
        return Ok(Some(parent.to_string()));
    }
    Ok(Comment::load(db, &op.entity_id)?.map(|c| c.issue_id))
}

/// Builds the wire request, or `None` when the record is gone.
fn prepare(db: &Database, op: &PendingOperation) -> SyncResult<Option<(PushRequest, String)>> {
    match op.entity_type {
        EntityType::Issue => {
            let Some(issue) = Issue::load(db, &op.entity_id)? else {
                return Ok(None);
            };
            let request = PushRequest::from_operation(op, issue.local.remote_version.clone(), None);
            Ok(Some((request, issue.key)))
        }
        EntityType::Comment => {
            let Some(comment) = Comment::load(db, &op.entity_id)? else {
                return Ok(None);
            };
            let parent = op
                .fields
                .get("issue_id")
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(|| comment.issue_id.clone());
            let request =
                PushRequest::from_operation(op, comment.local.remote_version.clone(), Some(parent));
            Ok(Some((request, comment.id)))
        }
    }
}

fn acknowledge<T: ReplicaTable>(
    db: &Database,
    id: &str,
    ack: &PushAck,
    still_pending: bool,
) -> SyncResult<()> {
    let Some(mut record) = T::load(db, id)? else {
        return Ok(());
    };
    let meta = record.meta_mut();
    meta.remote_version = Some(ack.remote_version.clone());
    meta.sync_error = None;
    meta.sync_status = if still_pending { SyncStatus::Pending } else { SyncStatus::Synced };
    T::save(db, &record)?;
    Ok(())
}
