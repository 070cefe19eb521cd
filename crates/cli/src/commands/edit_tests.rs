// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use ot_core::SyncStatus;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    priority = { "priority", "High", "priority", json!("High") },
    clear_priority = { "priority", "", "priority", json!(null) },
    assignee = { "assignee", "dana", "assignee", json!("dana") },
    unassign = { "assignee", "  ", "assignee", json!(null) },
    issue_type = { "type", "Bug", "issue_type", json!("Bug") },
    labels = { "labels", "ui, safari,,ui", "labels", json!(["ui", "safari"]) },
    no_labels = { "labels", "", "labels", json!([]) },
)]
fn test_field_value(attr: &str, value: &str, field: &str, expected: Value) {
    let (name, v) = field_value(attr, value).unwrap();
    assert_eq!(name, field);
    assert_eq!(v, expected);
}

#[test]
fn test_field_value_rejects_unknown_attribute() {
    let err = field_value("title", "x").unwrap_err();
    assert!(matches!(err, Error::UnknownAttribute(a) if a == "title"));
}

#[test]
fn test_field_value_rejects_blank_type() {
    assert!(matches!(field_value("type", " "), Err(Error::FieldEmpty { .. })));
}

#[tokio::test]
async fn test_edit_summary_queues_update() {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Login fails").await;

    let issue = run_impl(&ctx.service, "ABC-1", "summary", "Login fails on Safari").await.unwrap();

    assert_eq!(issue.summary, "Login fails on Safari");
    assert_eq!(issue.local.sync_status, SyncStatus::Pending);
    let ops = ctx.service.pending_operations().await.unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].base["summary"], json!("Login fails"));
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_edit_description_stores_document() {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Login fails").await;

    let issue = run_impl(&ctx.service, "10001", "description", "Safari only").await.unwrap();

    assert_eq!(issue.description_text(), "Safari only");
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_edit_missing_issue_fails() {
    let ctx = TestContext::new().await;

    assert!(run_impl(&ctx.service, "ABC-404", "summary", "x").await.is_err());
    assert_eq!(ctx.pending_count().await, 0);
    ctx.service.shutdown().await;
}
