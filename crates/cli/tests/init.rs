// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;
use yare::parameterized;

#[test]
fn creates_work_dir() {
    let temp = TempDir::new().unwrap();

    offtrack()
        .args(["init", "--url", "ws://localhost:7001"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized replica"))
        .stdout(predicate::str::contains("Connection: default"));

    assert!(temp.path().join(".offtrack/config.toml").exists());
    assert!(temp.path().join(".offtrack/replica.db").exists());
}

#[test]
fn fails_if_already_initialized() {
    let temp = init_temp();

    offtrack()
        .args(["init", "--url", "ws://localhost:7001"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[parameterized(
    http = { "http://tracker.example.com" },
    bare = { "tracker.example.com" },
)]
fn rejects_non_websocket_url(url: &str) {
    let temp = TempDir::new().unwrap();

    offtrack()
        .args(["init", "--url", url])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be ws:// or wss://"));

    assert!(!temp.path().join(".offtrack").exists());
}

#[test]
fn commands_need_init() {
    let temp = TempDir::new().unwrap();

    offtrack()
        .arg("list")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("offtrack init"));
}

#[test]
fn directory_flag_finds_replica_above() {
    let temp = init_temp();
    let nested = temp.path().join("a/b");
    std::fs::create_dir_all(&nested).unwrap();

    offtrack().args(["-C", nested.to_str().unwrap(), "list"]).assert().success();
}
