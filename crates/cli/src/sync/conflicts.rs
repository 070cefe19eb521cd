// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict registry: entities whose local and remote edits collided.
//!
//! Conflicts are persisted next to the records so `sync_status = conflict`
//! survives restarts. A conflicted entity is skipped by the push phase until
//! [`ConflictRegistry::resolve`] clears it.

use std::fmt;
use std::str::FromStr;

use ot_core::{
    Comment, Conflict, Database, EntityType, FieldMap, Issue, OpChange, OpKind, ReplicaTable,
    SyncStatus,
};

use super::error::{SyncError, SyncResult};
use super::log::{DebugLog, LogOp};
use super::queue::{mark_record, PendingQueue};

/// How the user settled a conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Push the local values over the remote ones.
    KeepLocal,
    /// Drop the local change and take the remote state.
    KeepRemote,
    /// Push a hand-merged set of values.
    Merged(FieldMap),
}

impl Resolution {
    pub fn name(&self) -> &'static str {
        match self {
            Resolution::KeepLocal => "keep_local",
            Resolution::KeepRemote => "keep_remote",
            Resolution::Merged(_) => "merged",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resolution {
    type Err = SyncError;

    /// Parses `local` or `remote`. Merged values have no string form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" | "keep_local" | "keep-local" => Ok(Resolution::KeepLocal),
            "remote" | "keep_remote" | "keep-remote" => Ok(Resolution::KeepRemote),
            other => Err(SyncError::InvalidResolution(format!(
                "unknown resolution '{}', expected 'local' or 'remote'",
                other
            ))),
        }
    }
}

pub struct ConflictRegistry {
    log: DebugLog,
}

impl ConflictRegistry {
    pub fn new(log: DebugLog) -> Self {
        ConflictRegistry { log }
    }

    /// Records a conflict and flags the entity. Raising again for the same
    /// entity refreshes the remote side.
    pub fn raise(&self, db: &Database, conflict: &Conflict) -> SyncResult<()> {
        db.transaction(|db| {
            db.put_conflict(conflict)?;
            mark_record(db, conflict.entity_type, &conflict.entity_id, SyncStatus::Conflict, None)
        })?;
        let message = if conflict.is_remote_delete() {
            format!("{} was deleted remotely while edited locally", conflict.entity_key)
        } else {
            format!("Conflict on {}: {}", conflict.entity_key, conflict.fields.join(", "))
        };
        self.log
            .warn(LogOp::Conflict, message)
            .entity(conflict.entity_type, &conflict.entity_id)
            .context("fields", conflict.fields.clone())
            .context("remote_version", conflict.remote_version.clone())
            .emit();
        Ok(())
    }

    pub fn contains(&self, db: &Database, entity_id: &str) -> SyncResult<bool> {
        Ok(db.is_conflicted(entity_id)?)
    }

    pub fn get(&self, db: &Database, entity_id: &str) -> SyncResult<Conflict> {
        db.find_conflict(entity_id)?
            .ok_or_else(|| SyncError::ConflictNotFound(entity_id.to_string()))
    }

    pub fn list(&self, db: &Database) -> SyncResult<Vec<Conflict>> {
        Ok(db.list_conflicts()?)
    }

    /// Forgets a conflict without touching the local change.
    pub fn clear(&self, db: &Database, entity_id: &str) -> SyncResult<bool> {
        let Some(conflict) = db.find_conflict(entity_id)? else {
            return Ok(false);
        };
        db.transaction(|db| {
            db.delete_conflict(entity_id)?;
            let status = match db.operation_for_entity(conflict.entity_type, entity_id)? {
                Some(_) => SyncStatus::Pending,
                None => SyncStatus::Synced,
            };
            mark_record(db, conflict.entity_type, entity_id, status, None)
        })?;
        Ok(true)
    }

    /// Settles a conflict and returns normal queue processing to the entity.
    pub fn resolve(
        &self,
        db: &Database,
        queue: &PendingQueue,
        entity_id: &str,
        resolution: Resolution,
    ) -> SyncResult<()> {
        let conflict = self.get(db, entity_id)?;
        db.try_transaction(|db| match conflict.entity_type {
            EntityType::Issue => settle::<Issue>(db, queue, &conflict, &resolution),
            EntityType::Comment => settle::<Comment>(db, queue, &conflict, &resolution),
        })?;
        self.log
            .success(LogOp::Conflict, format!("Resolved {} ({})", conflict.entity_key, resolution))
            .entity(conflict.entity_type, entity_id)
            .emit();
        Ok(())
    }
}

fn settle<T: ReplicaTable>(
    db: &Database,
    queue: &PendingQueue,
    conflict: &Conflict,
    resolution: &Resolution,
) -> SyncResult<()> {
    let id = conflict.entity_id.as_str();
    let op = db.operation_for_entity(T::ENTITY, id)?;

    if let Resolution::KeepRemote = resolution {
        if let Some(op) = op {
            db.delete_operation(&op.id)?;
        }
        match &conflict.remote_value {
            None => {
                // Comment changes held under a deleted issue go with it.
                if T::ENTITY == EntityType::Issue {
                    for child in db.comment_operations(id)? {
                        db.delete_operation(&child.id)?;
                    }
                }
                T::purge(db, id)?
            }
            Some(remote) => {
                if let Some(mut record) = T::load(db, id)? {
                    record.apply_patch(remote)?;
                    let meta = record.meta_mut();
                    meta.remote_version = conflict.remote_version.clone();
                    meta.deleted = false;
                    meta.sync_status = SyncStatus::Synced;
                    meta.sync_error = None;
                    T::save(db, &record)?;
                }
            }
        }
        db.delete_conflict(id)?;
        return Ok(());
    }

    let Some(mut record) = T::load(db, id)? else {
        return Err(SyncError::InvalidResolution(format!("{} no longer exists locally", id)));
    };

    let mut op = match op {
        Some(op) => op,
        None => {
            // Conflict reported by a push whose operation has since gone.
            let fields = conflict
                .local_value
                .iter()
                .filter(|(name, _)| conflict.fields.contains(name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect();
            let op = queue.new_operation(db, T::ENTITY, id, OpChange::update(fields, FieldMap::new()));
            db.insert_operation(&op)?;
            op
        }
    };

    if let Resolution::Merged(values) = resolution {
        if op.kind == OpKind::Delete {
            return Err(SyncError::InvalidResolution(
                "a pending delete cannot take merged values".into(),
            ));
        }
        record.apply_patch(values)?;
        op.fields.extend(values.iter().map(|(n, v)| (n.clone(), v.clone())));
    }

    match &conflict.remote_value {
        Some(remote) => {
            // Take the remote's other changes; the operation's fields win.
            let untouched: FieldMap = remote
                .iter()
                .filter(|(name, _)| !op.fields.contains_key(*name))
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect();
            if op.kind != OpKind::Delete {
                record.apply_patch(&untouched)?;
            }
            op.base = remote
                .iter()
                .filter(|(name, _)| op.fields.contains_key(*name) || op.kind == OpKind::Delete)
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect();
            record.meta_mut().remote_version = conflict.remote_version.clone();
        }
        None => {
            // Gone remotely: recreate it from the local state.
            op.kind = OpKind::Create;
            op.fields = record.fields();
            op.base = FieldMap::new();
            record.meta_mut().remote_version = None;
            record.meta_mut().deleted = false;
        }
    }

    op.attempts = 0;
    op.last_error = None;
    op.state = ot_core::OpState::Queued;
    db.update_operation(&op)?;
    db.delete_conflict(id)?;

    let meta = record.meta_mut();
    meta.sync_status = SyncStatus::Pending;
    meta.sync_error = None;
    T::save(db, &record)?;
    Ok(())
}
