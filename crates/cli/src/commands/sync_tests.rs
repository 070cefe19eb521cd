// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;
use crate::commands::testing::TestContext;
use crate::sync::test_helpers::{page, remote_issue, upsert};
use crate::sync::RemoteError;
use ot_core::SyncStatus;

#[tokio::test]
async fn test_sync_pulls_and_pushes() {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Login fails").await;
    ctx.service.editor().update_summary("ABC-1", "Login fails on Safari").await.unwrap();
    ctx.remote.queue_pull(Ok(page(
        vec![upsert(&remote_issue("10002", "ABC-2", "New remotely", "v1"))],
        "c1",
    )));

    let outcome = run_impl(&ctx.service, true).await.unwrap();

    let SyncOutcome::Completed(report) = outcome else {
        unreachable!("expected a completed cycle, got {:?}", outcome);
    };
    assert_eq!(report.pulled, 1);
    assert_eq!(report.pushed, 1);
    assert_eq!(ctx.issue("ABC-1").await.local.sync_status, SyncStatus::Synced);
    assert_eq!(ctx.issue("ABC-2").await.summary, "New remotely");
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_sync_pull_failure_is_an_error() {
    let ctx = TestContext::new().await;
    ctx.remote.queue_pull(Err(RemoteError::Network("connection refused".into())));

    let err = run_impl(&ctx.service, true).await.unwrap_err();

    assert!(err.to_string().contains("connection refused"));
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_sync_offline() {
    let ctx = TestContext::new().await;
    ctx.service.set_online(false).await.unwrap();

    let outcome = run_impl(&ctx.service, false).await.unwrap();

    assert_eq!(outcome, SyncOutcome::Offline);
    assert_eq!(ctx.remote.pull_calls(), 0);
    ctx.service.shutdown().await;
}
