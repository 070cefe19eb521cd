// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Nothing listens here, so every sync attempt fails fast.
pub const DEAD_REMOTE: &str = "ws://127.0.0.1:9";

pub fn offtrack() -> Command {
    cargo_bin_cmd!("offtrack")
}

/// Helper to create an initialized temp directory
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    offtrack()
        .args(["init", "--url", DEAD_REMOTE, "--connection", "acme"])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to create an issue and return its key
pub fn create_issue(temp: &TempDir, summary: &str) -> String {
    let output = offtrack()
        .args(["new", "-p", "ABC", summary, "-o", "id"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
