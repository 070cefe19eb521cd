// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;

async fn context() -> TestContext {
    let ctx = TestContext::new().await;
    ctx.seed_issue("10001", "ABC-1", "Performance Testing").await;
    ctx.seed_issue("10002", "ABC-2", "Performance budget").await;
    ctx.seed_issue("10003", "ABC-3", "Login page crash").await;
    ctx.service.reindex_all().await.unwrap();
    ctx
}

#[tokio::test]
async fn test_search_exact_prefixes() {
    let ctx = context().await;

    let issues = run_impl(&ctx.service, "perf test", None).await.unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].key, "ABC-1");
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_search_falls_back_to_fuzzy() {
    let ctx = context().await;

    let issues = run_impl(&ctx.service, "lgoin", None).await.unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].key, "ABC-3");
    ctx.service.shutdown().await;
}

#[tokio::test]
async fn test_search_limit() {
    let ctx = context().await;

    assert_eq!(run_impl(&ctx.service, "performance", None).await.unwrap().len(), 2);
    assert_eq!(run_impl(&ctx.service, "performance", Some(1)).await.unwrap().len(), 1);
    ctx.service.shutdown().await;
}
