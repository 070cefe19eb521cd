// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::client::RemoteError;
use super::scheduler::{Phase, SyncOutcome, SyncScheduler, Trigger};
use super::test_helpers::{page, remote_issue, seed, Harness, MockRemote, CONN};
use crate::config::SyncSettings;

fn scheduler(h: &Harness) -> Arc<SyncScheduler<MockRemote>> {
    let settings = SyncSettings { initial_backoff_ms: 1_000, max_backoff_secs: 30, ..Default::default() };
    Arc::new(SyncScheduler::new(Arc::clone(&h.engine), settings, h.log.clone()))
}

async fn wait_for_pulls(h: &Harness, n: usize) {
    while h.remote.pull_calls() < n {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test]
async fn test_concurrent_start_sync_runs_one_cycle() {
    let h = Harness::new();
    let s = scheduler(&h);
    let gate = h.remote.gate_pulls();

    let first = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.start_sync(CONN, Trigger::Manual).await }
    });
    wait_for_pulls(&h, 1).await;
    assert_eq!(s.phase(CONN), Phase::Running);

    for trigger in [Trigger::Manual, Trigger::Reconnect, Trigger::Periodic] {
        assert_eq!(s.start_sync(CONN, trigger).await.unwrap(), SyncOutcome::AlreadyRunning);
    }

    gate.add_permits(1);
    assert!(matches!(first.await.unwrap().unwrap(), SyncOutcome::Completed(_)));
    assert_eq!(h.remote.pull_calls(), 1);
    assert_eq!(s.phase(CONN), Phase::Idle);
}

#[tokio::test]
async fn test_connections_run_independently() {
    let h = Harness::new();
    let s = scheduler(&h);
    let gate = h.remote.gate_pulls();

    let a = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.start_sync("alpha", Trigger::Manual).await }
    });
    wait_for_pulls(&h, 1).await;
    let b = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.start_sync("beta", Trigger::Manual).await }
    });
    wait_for_pulls(&h, 2).await;

    assert_eq!(s.phase("alpha"), Phase::Running);
    assert_eq!(s.phase("beta"), Phase::Running);
    gate.add_permits(2);
    assert!(matches!(a.await.unwrap().unwrap(), SyncOutcome::Completed(_)));
    assert!(matches!(b.await.unwrap().unwrap(), SyncOutcome::Completed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_backs_off_periodic_triggers() {
    let h = Harness::new();
    let s = scheduler(&h);
    h.remote.queue_pull(Err(RemoteError::Network("unreachable".into())));

    let err = s.start_sync(CONN, Trigger::Manual).await.unwrap_err();
    assert!(err.is_transient());
    assert!(matches!(s.phase(CONN), Phase::Backoff { .. }));
    assert_eq!(s.start_sync(CONN, Trigger::Periodic).await.unwrap(), SyncOutcome::BackingOff);
    assert_eq!(h.remote.pull_calls(), 1);

    tokio::time::advance(Duration::from_millis(1_001)).await;
    assert_eq!(s.phase(CONN), Phase::Idle);
    assert!(matches!(
        s.start_sync(CONN, Trigger::Periodic).await.unwrap(),
        SyncOutcome::Completed(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_manual_trigger_bypasses_backoff() {
    let h = Harness::new();
    let s = scheduler(&h);
    h.remote.queue_pull(Err(RemoteError::Network("unreachable".into())));
    h.remote.queue_pull(Err(RemoteError::Network("unreachable".into())));

    s.start_sync(CONN, Trigger::Manual).await.unwrap_err();
    s.start_sync(CONN, Trigger::Manual).await.unwrap_err();
    match s.phase(CONN) {
        // Second failure doubles the delay.
        Phase::Backoff { until } => {
            let left = until - tokio::time::Instant::now();
            assert!(left > Duration::from_millis(1_000) && left <= Duration::from_millis(2_000));
        }
        other => panic!("expected backoff, got {:?}", other),
    }

    assert!(matches!(s.start_sync(CONN, Trigger::Manual).await.unwrap(), SyncOutcome::Completed(_)));
    assert_eq!(s.phase(CONN), Phase::Idle);
}

#[tokio::test]
async fn test_auth_failure_blocks_automatic_triggers() {
    let h = Harness::new();
    let s = scheduler(&h);
    h.remote.queue_pull(Err(RemoteError::Auth("token expired".into())));

    assert!(s.start_sync(CONN, Trigger::Manual).await.unwrap_err().is_auth());
    assert_eq!(s.start_sync(CONN, Trigger::Periodic).await.unwrap(), SyncOutcome::AuthBlocked);
    assert_eq!(s.start_sync(CONN, Trigger::Reconnect).await.unwrap(), SyncOutcome::AuthBlocked);
    assert_eq!(h.remote.pull_calls(), 1);

    s.credentials_refreshed(CONN);
    assert!(matches!(
        s.start_sync(CONN, Trigger::Periodic).await.unwrap(),
        SyncOutcome::Completed(_)
    ));
}

#[tokio::test]
async fn test_offline_holds_every_trigger() {
    let h = Harness::new();
    let s = scheduler(&h);
    s.set_online(false).await.unwrap();

    assert!(!s.is_online());
    assert_eq!(s.start_sync(CONN, Trigger::Manual).await.unwrap(), SyncOutcome::Offline);
    assert_eq!(h.remote.pull_calls(), 0);
}

#[tokio::test]
async fn test_reconnect_with_pending_work_starts_sync() {
    let h = Harness::new();
    let s = scheduler(&h);
    s.set_active_connection(CONN);
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;

    assert_eq!(s.set_online(false).await.unwrap(), None);
    h.editor.update_summary("1", "Offline edit").await.unwrap();

    let outcome = s.set_online(true).await.unwrap();
    match outcome {
        Some(SyncOutcome::Completed(report)) => assert_eq!(report.pushed, 1),
        other => panic!("expected a reconnect cycle, got {:?}", other),
    }
    // Already online: no transition.
    assert_eq!(s.set_online(true).await.unwrap(), None);
}

#[tokio::test]
async fn test_reconnect_without_pending_work_is_quiet() {
    let h = Harness::new();
    let s = scheduler(&h);
    s.set_active_connection(CONN);

    s.set_online(false).await.unwrap();
    assert_eq!(s.set_online(true).await.unwrap(), None);
    assert_eq!(h.remote.pull_calls(), 0);
}

#[tokio::test]
async fn test_switching_connection_cancels_remaining_phases() {
    let h = Harness::new();
    let s = scheduler(&h);
    seed(&h.store, &remote_issue("1", "ABC-1", "Old", "v1")).await;
    h.editor.update_summary("1", "Local").await.unwrap();
    h.remote.queue_pull(Ok(page(vec![], "c1")));
    let gate = h.remote.gate_pulls();
    s.set_active_connection(CONN);

    let run = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.start_sync(CONN, Trigger::Manual).await }
    });
    wait_for_pulls(&h, 1).await;
    s.set_active_connection("beta");
    gate.add_permits(1);

    assert_eq!(run.await.unwrap().unwrap(), SyncOutcome::Cancelled);
    assert_eq!(s.active_connection().as_deref(), Some("beta"));
    // The in-flight pull finished and was kept; the push never ran.
    let meta = h.store.lock().await.get_sync_meta(CONN).unwrap().unwrap();
    assert_eq!(meta.last_sync_cursor.as_deref(), Some("c1"));
    assert!(h.remote.pushed().is_empty());
    assert_eq!(s.phase(CONN), Phase::Idle);
}

#[tokio::test]
async fn test_remove_connection_forgets_sync_meta() {
    let h = Harness::new();
    let s = scheduler(&h);
    s.set_active_connection(CONN);
    h.remote.queue_pull(Ok(page(vec![], "c1")));
    s.start_sync(CONN, Trigger::Manual).await.unwrap();

    s.remove_connection(CONN).await.unwrap();

    assert!(h.store.lock().await.get_sync_meta(CONN).unwrap().is_none());
    assert_eq!(s.active_connection(), None);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_timer_triggers_active_connection() {
    let h = Harness::new();
    let s = scheduler(&h);
    s.set_active_connection(CONN);
    let shutdown = CancellationToken::new();

    let timer = s.spawn_periodic(Duration::from_secs(60), shutdown.clone());
    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(h.remote.pull_calls(), 0);
    tokio::time::sleep(Duration::from_secs(66)).await;
    assert_eq!(h.remote.pull_calls(), 2);

    shutdown.cancel();
    timer.await.unwrap();
}
