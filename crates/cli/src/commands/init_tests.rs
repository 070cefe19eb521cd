// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::config::Config;
use crate::error::Error;
use tempfile::TempDir;

#[test]
fn test_init_creates_config_and_database() {
    let temp = TempDir::new().unwrap();

    let work_dir = run_impl(temp.path(), "acme", "wss://tracker.example.com/sync").unwrap();

    assert_eq!(work_dir, temp.path().join(".offtrack"));
    assert!(work_dir.join("config.toml").exists());
    assert!(work_dir.join("replica.db").exists());
    let config = Config::load(&work_dir).unwrap();
    assert_eq!(config.connection, "acme");
    assert_eq!(config.remote.url, "wss://tracker.example.com/sync");
}

#[test]
fn test_init_twice_fails() {
    let temp = TempDir::new().unwrap();
    run_impl(temp.path(), "acme", "ws://localhost:7001").unwrap();

    let err = run_impl(temp.path(), "acme", "ws://localhost:7001").unwrap_err();
    assert!(matches!(err, Error::AlreadyInitialized(_)));
}

#[test]
fn test_init_rejects_http_url() {
    let temp = TempDir::new().unwrap();

    let err = run_impl(temp.path(), "acme", "https://tracker.example.com").unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(!temp.path().join(".offtrack").exists());
}
