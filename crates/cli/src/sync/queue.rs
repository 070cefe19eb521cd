// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable queue of local changes awaiting the remote.
//!
//! Operations live in the `pending_operations` table and are drained oldest
//! first. Each entity has at most one operation; later edits amend it.
//! Every write to the queue goes through the same SQLite transaction as the
//! optimistic write of the record it describes.

use std::sync::Arc;

use ot_core::{
    Amendment, Comment, Database, EntityType, Error, Issue, LocalClock, OpChange, OpKind,
    OpState, PendingOperation, ReplicaTable, SyncStatus,
};

use super::error::SyncResult;
use super::log::{DebugLog, LogOp};
use crate::id::operation_id;

/// What enqueueing a change did to the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Enqueued {
    /// A new operation was appended.
    Queued(PendingOperation),
    /// The entity's existing operation now covers the change too.
    Amended(PendingOperation),
    /// The change undid a queued create; operation and record are gone.
    Cancelled(PendingOperation),
}

impl Enqueued {
    pub fn operation(&self) -> &PendingOperation {
        match self {
            Enqueued::Queued(op) | Enqueued::Amended(op) | Enqueued::Cancelled(op) => op,
        }
    }
}

pub struct PendingQueue {
    log: DebugLog,
    clock: Arc<LocalClock>,
}

impl PendingQueue {
    pub fn new(log: DebugLog, clock: Arc<LocalClock>) -> Self {
        PendingQueue { log, clock }
    }

    /// Saves `record` as pending and records `change` for it, atomically.
    pub fn enqueue<T: ReplicaTable>(
        &self,
        db: &Database,
        record: &T,
        change: OpChange,
    ) -> SyncResult<Enqueued> {
        let id = record.id();
        let outcome = db.transaction(|db| match db.operation_for_entity(T::ENTITY, id)? {
            Some(mut op) => match op.amend(change)? {
                Amendment::Replaced => {
                    db.update_operation(&op)?;
                    save_pending(db, record)?;
                    Ok(Enqueued::Amended(op))
                }
                Amendment::Cancelled => {
                    db.delete_operation(&op.id)?;
                    db.delete_conflict(id)?;
                    T::purge(db, id)?;
                    Ok(Enqueued::Cancelled(op))
                }
            },
            None => {
                let op = self.new_operation(db, T::ENTITY, id, change);
                db.insert_operation(&op)?;
                save_pending(db, record)?;
                Ok(Enqueued::Queued(op))
            }
        })?;

        let op = outcome.operation();
        let message = match &outcome {
            Enqueued::Queued(_) => format!("Queued {} {} {}", op.kind, op.entity_type, record.display_key()),
            Enqueued::Amended(_) => format!("Amended {} of {} {}", op.kind, op.entity_type, record.display_key()),
            Enqueued::Cancelled(_) => {
                format!("Dropped unsynced {} {}", op.entity_type, record.display_key())
            }
        };
        self.log
            .info(LogOp::Queue, message)
            .entity(op.entity_type, &op.entity_id)
            .context("operation_id", op.id.as_str())
            .context("fields", op.fields.keys().cloned().collect::<Vec<_>>())
            .emit();
        Ok(outcome)
    }

    /// All operations, oldest first, abandoned ones included.
    pub fn list_pending(&self, db: &Database) -> SyncResult<Vec<PendingOperation>> {
        Ok(db.list_operations()?)
    }

    pub fn count(&self, db: &Database) -> SyncResult<usize> {
        Ok(db.count_operations()?)
    }

    /// Counts a push attempt and records its error, or clears it.
    pub fn mark_attempt(
        &self,
        db: &Database,
        id: &str,
        error: Option<&str>,
    ) -> SyncResult<PendingOperation> {
        let mut op = db.get_operation(id)?;
        op.attempts += 1;
        op.last_error = error.map(String::from);
        db.update_operation(&op)?;

        let entry = match error {
            Some(e) => self.log.warn(LogOp::Queue, format!("Attempt {} failed: {}", op.attempts, e)),
            None => self.log.info(LogOp::Queue, format!("Attempt {} recorded", op.attempts)),
        };
        entry.entity(op.entity_type, &op.entity_id).context("operation_id", id).emit();
        Ok(op)
    }

    /// Stops retrying an operation. The record stays pending with the error
    /// attached until the user retries or discards.
    pub fn abandon(&self, db: &Database, id: &str, reason: &str) -> SyncResult<PendingOperation> {
        let op = db.transaction(|db| {
            let mut op = db.get_operation(id)?;
            op.state = OpState::Abandoned;
            op.last_error = Some(reason.to_string());
            db.update_operation(&op)?;
            let status = pending_status(db, &op.entity_id)?;
            mark_record(db, op.entity_type, &op.entity_id, status, Some(reason))?;
            Ok(op)
        })?;
        self.log
            .error(LogOp::Queue, format!("Gave up on {} after {} attempts: {}", op.id, op.attempts, reason))
            .entity(op.entity_type, &op.entity_id)
            .context("operation_id", id)
            .emit();
        Ok(op)
    }

    /// Puts an operation back in line with a fresh attempt budget.
    pub fn retry(&self, db: &Database, id: &str) -> SyncResult<PendingOperation> {
        let op = db.transaction(|db| {
            let mut op = db.get_operation(id)?;
            op.attempts = 0;
            op.last_error = None;
            op.state = OpState::Queued;
            db.update_operation(&op)?;
            let status = pending_status(db, &op.entity_id)?;
            mark_record(db, op.entity_type, &op.entity_id, status, None)?;
            Ok(op)
        })?;
        self.log
            .info(LogOp::Queue, format!("Requeued {}", op.id))
            .entity(op.entity_type, &op.entity_id)
            .emit();
        Ok(op)
    }

    /// Deletes an operation the remote has acknowledged.
    pub fn remove(&self, db: &Database, id: &str) -> SyncResult<()> {
        db.delete_operation(id)?;
        self.log.info(LogOp::Queue, format!("Removed {}", id)).context("operation_id", id).emit();
        Ok(())
    }

    /// Drops an operation and reverts its record to the last synced state.
    pub fn discard(&self, db: &Database, id: &str) -> SyncResult<PendingOperation> {
        let op = db.transaction(|db| {
            let op = db.get_operation(id)?;
            match op.entity_type {
                EntityType::Issue => revert::<Issue>(db, &op)?,
                EntityType::Comment => revert::<Comment>(db, &op)?,
            }
            db.delete_operation(&op.id)?;
            db.delete_conflict(&op.entity_id)?;
            Ok(op)
        })?;
        self.log
            .warn(LogOp::Queue, format!("Discarded {} of {} {}", op.kind, op.entity_type, op.entity_id))
            .entity(op.entity_type, &op.entity_id)
            .context("operation_id", id)
            .emit();
        Ok(op)
    }

    /// Builds an operation without storing it.
    pub(crate) fn new_operation(
        &self,
        db: &Database,
        entity_type: EntityType,
        entity_id: &str,
        change: OpChange,
    ) -> PendingOperation {
        let stamp = self.clock.tick();
        let op_id = operation_id(entity_id, stamp, |candidate| {
            db.find_operation(candidate).map(|o| o.is_some()).unwrap_or(false)
        });
        PendingOperation::new(op_id, entity_type, entity_id, change, stamp)
    }
}

/// Status for a record with an undrained operation.
pub(crate) fn pending_status(db: &Database, entity_id: &str) -> ot_core::Result<SyncStatus> {
    Ok(if db.is_conflicted(entity_id)? { SyncStatus::Conflict } else { SyncStatus::Pending })
}

/// Sets a record's sync state; a record that is already gone is fine.
pub(crate) fn mark_record(
    db: &Database,
    entity_type: EntityType,
    id: &str,
    status: SyncStatus,
    error: Option<&str>,
) -> ot_core::Result<()> {
    match db.set_sync_state(entity_type, id, status, error) {
        Err(Error::IssueNotFound(_)) | Err(Error::CommentNotFound(_)) => Ok(()),
        other => other,
    }
}

fn save_pending<T: ReplicaTable>(db: &Database, record: &T) -> ot_core::Result<()> {
    let mut record = record.clone();
    record.meta_mut().sync_status = pending_status(db, record.id())?;
    record.meta_mut().sync_error = None;
    T::save(db, &record)
}

fn revert<T: ReplicaTable>(db: &Database, op: &PendingOperation) -> ot_core::Result<()> {
    if op.kind == OpKind::Create {
        return T::purge(db, &op.entity_id);
    }
    let Some(mut record) = T::load(db, &op.entity_id)? else {
        return Ok(());
    };
    record.apply_patch(&op.base)?;
    let meta = record.meta_mut();
    meta.deleted = false;
    meta.sync_status = SyncStatus::Synced;
    meta.sync_error = None;
    T::save(db, &record)
}
