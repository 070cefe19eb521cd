// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use ot_core::{Error, FieldMap, OpKind, RichText, StatusCategory, SyncStatus};
use serde_json::json;

use super::edit::NewIssue;
use super::error::SyncError;
use super::test_helpers::{remote_issue, seed, Harness};

#[tokio::test]
async fn test_create_issue_uses_local_id_and_key() {
    let h = Harness::new();
    let mut new = NewIssue::new("ABC", "Write the release notes");
    new.description = Some(RichText::from("Covers 2.0"));
    new.labels = vec!["docs".into()];

    let issue = h.editor.create_issue(new).await.unwrap();

    assert!(issue.id.starts_with("LOCAL-"));
    assert!(issue.is_local_only());
    assert_eq!(issue.key, issue.id.to_uppercase());
    assert_eq!(issue.project_key, "ABC");
    assert_eq!(issue.local.sync_status, SyncStatus::Pending);
    assert!(issue.local.local_updated > 0);
    assert!(matches!(issue.description, Some(RichText::Document(_))));
    assert_eq!(issue.description_text(), "Covers 2.0");

    let ops = h.pending().await;
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OpKind::Create);
    assert_eq!(ops[0].entity_id, issue.id);
    assert_eq!(ops[0].fields["labels"], json!(["docs"]));
}

#[tokio::test]
async fn test_create_issue_requires_summary() {
    let h = Harness::new();
    let err = h.editor.create_issue(NewIssue::new("ABC", "   ")).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(Error::InvalidField { field, .. }) if field == "summary"));
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn test_update_records_only_changed_fields_with_base() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    let mut patch = FieldMap::new();
    patch.insert("summary".into(), json!("New"));
    patch.insert("status".into(), json!("To Do"));
    let issue = h.editor.update_fields("ABC-1", patch).await.unwrap();

    assert_eq!(issue.summary, "New");
    assert_eq!(issue.local.sync_status, SyncStatus::Pending);
    let ops = h.pending().await;
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind, OpKind::Update);
    assert_eq!(ops[0].fields.keys().collect::<Vec<_>>(), vec!["summary"]);
    assert_eq!(ops[0].base["summary"], json!("Old"));
}

#[tokio::test]
async fn test_update_without_changes_enqueues_nothing() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Same", "v1")).await;

    let issue = h.editor.update_summary("1", "Same").await.unwrap();

    assert_eq!(issue.local.sync_status, SyncStatus::Synced);
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn test_update_unknown_field_is_rejected() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    let mut patch = FieldMap::new();
    patch.insert("story_points".into(), json!(3));
    let err = h.editor.update_fields("1", patch).await.unwrap_err();

    assert!(matches!(err, SyncError::Store(Error::UnknownField { .. })));
}

#[tokio::test]
async fn test_update_missing_issue_fails() {
    let h = Harness::new();
    let err = h.editor.update_summary("ABC-404", "x").await.unwrap_err();
    assert!(matches!(err, SyncError::Store(Error::IssueNotFound(_))));
}

#[tokio::test]
async fn test_description_plain_text_is_stored_as_document() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    let issue = h.editor.update_description("1", RichText::from("Steps to reproduce")).await.unwrap();

    match issue.description {
        Some(RichText::Document(doc)) => {
            assert!(doc.is_document());
            assert_eq!(doc.plain_text(), "Steps to reproduce");
        }
        other => unreachable!("expected a document, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transition_sets_status_and_category() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    let issue = h.editor.transition("ABC-1", "Done", StatusCategory::Done).await.unwrap();

    assert_eq!(issue.status, "Done");
    assert_eq!(issue.status_category, StatusCategory::Done);
    let ops = h.pending().await;
    assert_eq!(ops[0].fields["status_category"], json!("done"));
    assert_eq!(ops[0].base["status"], json!("To Do"));
}

#[tokio::test]
async fn test_assign_and_unassign() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    let issue = h.editor.assign("1", Some("dana")).await.unwrap();
    assert_eq!(issue.assignee.as_deref(), Some("dana"));

    let issue = h.editor.assign("1", None).await.unwrap();
    assert_eq!(issue.assignee, None);
    // Both edits amend one operation back to the original value.
    assert_eq!(h.pending().await.len(), 1);
}

#[tokio::test]
async fn test_delete_tombstones_and_blocks_edits() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    h.editor.delete_issue("ABC-1").await.unwrap();

    let issue = h.issue("1").await.unwrap();
    assert!(issue.local.deleted);
    assert_eq!(h.store.lock().await.list_issues().unwrap().len(), 0);
    let ops = h.pending().await;
    assert_eq!(ops[0].kind, OpKind::Delete);

    let err = h.editor.update_summary("1", "New").await.unwrap_err();
    assert!(matches!(err, SyncError::Store(Error::InvalidInput(_))));
    assert!(h.editor.delete_issue("1").await.is_err());
}

#[tokio::test]
async fn test_delete_of_unpushed_issue_drops_it() {
    let h = Harness::new();
    let issue = h.editor.create_issue(NewIssue::new("ABC", "Draft")).await.unwrap();

    h.editor.delete_issue(&issue.id).await.unwrap();

    assert!(h.issue(&issue.id).await.is_none());
    assert!(h.pending().await.is_empty());
}

#[tokio::test]
async fn test_add_comment_queues_create_under_issue() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    let comment = h.editor.add_comment("ABC-1", RichText::from("Looks good")).await.unwrap();

    assert!(comment.id.starts_with("LOCAL-"));
    assert_eq!(comment.issue_id, "1");
    assert_eq!(comment.local.sync_status, SyncStatus::Pending);
    let ops = h.pending().await;
    assert_eq!(ops[0].fields["issue_id"], json!("1"));
    assert_eq!(h.store.lock().await.list_comments("1").unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_empty_comment_is_rejected() {
    let h = Harness::new();
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    let err = h.editor.add_comment("1", RichText::from("  ")).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(Error::InvalidField { .. })));
}
