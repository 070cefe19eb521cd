// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use super::log::{DebugLog, LogOp};
use super::queue::{Enqueued, PendingQueue};
use super::test_helpers::remote_issue;
use ot_core::{
    Database, EntityType, Error, FieldMap, Issue, LocalClock, OpChange, OpKind, OpState, Replica,
    SyncStatus,
};
use serde_json::json;

fn setup() -> (Database, PendingQueue, DebugLog) {
    let log = DebugLog::new();
    let queue = PendingQueue::new(log.clone(), Arc::new(LocalClock::new()));
    (Database::open_in_memory().unwrap(), queue, log)
}

fn synced(db: &Database, id: &str, summary: &str) -> Issue {
    let issue = remote_issue(id, &format!("ABC-{}", id), summary, "v1");
    db.put_issue(&issue).unwrap();
    issue
}

fn summary_change(before: &str, after: &str) -> OpChange {
    let mut fields = FieldMap::new();
    fields.insert("summary".into(), json!(after));
    let mut base = FieldMap::new();
    base.insert("summary".into(), json!(before));
    OpChange::update(fields, base)
}

fn edited(issue: &Issue, summary: &str) -> Issue {
    let mut issue = issue.clone();
    issue.summary = summary.to_string();
    issue
}

#[test]
fn test_enqueue_writes_record_and_operation_together() {
    let (db, queue, log) = setup();
    let issue = synced(&db, "1", "Old");

    let outcome = queue.enqueue(&db, &edited(&issue, "New"), summary_change("Old", "New")).unwrap();

    let op = match outcome {
        Enqueued::Queued(op) => op,
        other => panic!("expected a new operation, got {:?}", other),
    };
    assert_eq!(op.kind, OpKind::Update);
    assert_eq!(op.entity_id, "1");
    assert!(op.id.starts_with("op-"));

    let stored = db.get_issue("1").unwrap();
    assert_eq!(stored.summary, "New");
    assert_eq!(stored.local.sync_status, SyncStatus::Pending);
    assert_eq!(queue.count(&db).unwrap(), 1);
    assert_eq!(log.entries().last().unwrap().operation, LogOp::Queue);
}

#[test]
fn test_list_pending_is_fifo() {
    let (db, queue, _) = setup();
    for id in ["3", "1", "2"] {
        let issue = synced(&db, id, "Old");
        queue.enqueue(&db, &edited(&issue, "New"), summary_change("Old", "New")).unwrap();
    }

    let ids: Vec<String> =
        queue.list_pending(&db).unwrap().into_iter().map(|op| op.entity_id).collect();
    assert_eq!(ids, vec!["3", "1", "2"]);
}

#[test]
fn test_second_edit_amends_and_keeps_slot_and_first_base() {
    let (db, queue, _) = setup();
    let a = synced(&db, "a", "A0");
    let b = synced(&db, "b", "B0");
    queue.enqueue(&db, &edited(&a, "A1"), summary_change("A0", "A1")).unwrap();
    queue.enqueue(&db, &edited(&b, "B1"), summary_change("B0", "B1")).unwrap();

    let outcome = queue.enqueue(&db, &edited(&a, "A2"), summary_change("A1", "A2")).unwrap();
    assert!(matches!(outcome, Enqueued::Amended(_)));

    let ops = queue.list_pending(&db).unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].entity_id, "a");
    assert_eq!(ops[0].fields["summary"], json!("A2"));
    assert_eq!(ops[0].base["summary"], json!("A0"));
}

#[test]
fn test_create_then_delete_vanishes() {
    let (db, queue, _) = setup();
    let issue = remote_issue("LOCAL-1", "LOCAL-1", "Draft", "v0");
    queue.enqueue(&db, &issue, OpChange::create(issue.fields())).unwrap();

    let outcome = queue.enqueue(&db, &issue, OpChange::delete(issue.fields())).unwrap();

    assert!(matches!(outcome, Enqueued::Cancelled(_)));
    assert_eq!(queue.count(&db).unwrap(), 0);
    assert!(db.find_issue("LOCAL-1").unwrap().is_none());
}

#[test]
fn test_edit_after_pending_delete_is_rejected() {
    let (db, queue, _) = setup();
    let issue = synced(&db, "1", "Old");
    queue.enqueue(&db, &issue, OpChange::delete(issue.fields())).unwrap();

    let err = queue.enqueue(&db, &edited(&issue, "New"), summary_change("Old", "New")).unwrap_err();
    assert!(matches!(err, super::error::SyncError::Store(Error::InvalidInput(_))));
    // rolled back: the record is untouched
    assert_eq!(db.get_issue("1").unwrap().summary, "Old");
}

#[test]
fn test_mark_attempt_counts_and_records_error() {
    let (db, queue, _) = setup();
    let issue = synced(&db, "1", "Old");
    let op = queue
        .enqueue(&db, &edited(&issue, "New"), summary_change("Old", "New"))
        .unwrap()
        .operation()
        .clone();

    let op1 = queue.mark_attempt(&db, &op.id, Some("timeout")).unwrap();
    assert_eq!(op1.attempts, 1);
    assert_eq!(op1.last_error.as_deref(), Some("timeout"));

    let op2 = queue.mark_attempt(&db, &op.id, None).unwrap();
    assert_eq!(op2.attempts, 2);
    assert_eq!(op2.last_error, None);
}

#[test]
fn test_abandon_keeps_operation_and_sets_sync_error() {
    let (db, queue, _) = setup();
    let issue = synced(&db, "1", "Old");
    let op = queue
        .enqueue(&db, &edited(&issue, "New"), summary_change("Old", "New"))
        .unwrap()
        .operation()
        .clone();

    queue.abandon(&db, &op.id, "rejected").unwrap();

    let stored_op = db.get_operation(&op.id).unwrap();
    assert_eq!(stored_op.state, OpState::Abandoned);
    let stored = db.get_issue("1").unwrap();
    assert_eq!(stored.local.sync_status, SyncStatus::Pending);
    assert_eq!(stored.local.sync_error.as_deref(), Some("rejected"));

    let retried = queue.retry(&db, &op.id).unwrap();
    assert_eq!(retried.state, OpState::Queued);
    assert_eq!(retried.attempts, 0);
    assert_eq!(db.get_issue("1").unwrap().local.sync_error, None);
}

#[test]
fn test_discard_update_restores_base() {
    let (db, queue, _) = setup();
    let issue = synced(&db, "1", "Old");
    let op = queue
        .enqueue(&db, &edited(&issue, "New"), summary_change("Old", "New"))
        .unwrap()
        .operation()
        .clone();

    queue.discard(&db, &op.id).unwrap();

    let stored = db.get_issue("1").unwrap();
    assert_eq!(stored.summary, "Old");
    assert_eq!(stored.local.sync_status, SyncStatus::Synced);
    assert_eq!(queue.count(&db).unwrap(), 0);
}

#[test]
fn test_discard_delete_clears_tombstone() {
    let (db, queue, _) = setup();
    let issue = synced(&db, "1", "Old");
    let mut tombstoned = issue.clone();
    tombstoned.local.deleted = true;
    let op = queue
        .enqueue(&db, &tombstoned, OpChange::delete(issue.fields()))
        .unwrap()
        .operation()
        .clone();
    assert!(db.list_issues().unwrap().is_empty());

    queue.discard(&db, &op.id).unwrap();

    assert_eq!(db.list_issues().unwrap().len(), 1);
    assert!(!db.get_issue("1").unwrap().local.deleted);
}

#[test]
fn test_discard_create_purges_record() {
    let (db, queue, _) = setup();
    let issue = remote_issue("LOCAL-1", "LOCAL-1", "Draft", "v0");
    let op = queue
        .enqueue(&db, &issue, OpChange::create(issue.fields()))
        .unwrap()
        .operation()
        .clone();

    let discarded = queue.discard(&db, &op.id).unwrap();

    assert_eq!(discarded.entity_type, EntityType::Issue);
    assert!(db.find_issue("LOCAL-1").unwrap().is_none());
}

#[test]
fn test_remove_missing_operation_fails() {
    let (db, queue, _) = setup();
    assert!(queue.remove(&db, "op-missing").is_err());
}
