// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use ot_core::SyncStatus;
use yare::parameterized;

#[parameterized(
    to_do = { "To Do", StatusCategory::Todo },
    backlog = { "Backlog", StatusCategory::Todo },
    in_progress = { "In Progress", StatusCategory::Indeterminate },
    in_review = { "In Review", StatusCategory::Indeterminate },
    done = { "Done", StatusCategory::Done },
    closed = { " closed ", StatusCategory::Done },
)]
fn test_infer_category(status: &str, expected: StatusCategory) {
    assert_eq!(infer_category(status), expected);
}

#[tokio::test]
async fn test_transition_infers_category() {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Login fails").await;

    let issue = transition_impl(&ctx.service, "ABC-1", "Done", None).await.unwrap();

    assert_eq!(issue.status, "Done");
    assert_eq!(issue.status_category, StatusCategory::Done);
    assert_eq!(issue.local.sync_status, SyncStatus::Pending);
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_transition_with_explicit_category() {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Login fails").await;

    let issue = transition_impl(&ctx.service, "ABC-1", "Shipped", Some("done")).await.unwrap();
    assert_eq!(issue.status_category, StatusCategory::Done);

    assert!(transition_impl(&ctx.service, "ABC-1", "Shipped", Some("finished")).await.is_err());
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_delete_hides_issue_until_pushed() {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Login fails").await;

    delete_impl(&ctx.service, "ABC-1").await.unwrap();

    assert!(ctx.service.store().lock().await.list_issues().unwrap().is_empty());
    assert_eq!(ctx.pending_count().await, 1);
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_comment_is_queued() {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Login fails").await;

    let comment = comment_impl(&ctx.service, "ABC-1", "Seen on 17.2").await.unwrap();

    assert_eq!(comment.issue_id, "10001");
    assert_eq!(comment.body.plain_text(), "Seen on 17.2");
    assert_eq!(ctx.pending_count().await, 1);
    ctx.service.shutdown().await;
}
