// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    not_initialized = { Error::NotInitialized, "offtrack init" },
    already_initialized = { Error::AlreadyInitialized("/p/.offtrack".into()), "/p/.offtrack" },
    field_empty = { Error::FieldEmpty { field: "Summary" }, "Summary cannot be empty" },
    unknown_attribute = { Error::UnknownAttribute("title".into()), "valid attributes" },
    invalid_merged = { Error::InvalidMerged("expected an object".into()), "JSON object" },
    config = { Error::Config("bad".into()), "config error: bad" },
)]
fn test_error_display(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected), "{err}");
}

#[test]
fn test_core_errors_are_transparent() {
    let err: Error = ot_core::Error::IssueNotFound("ABC-1".into()).into();
    assert_eq!(err.to_string(), "issue not found: ABC-1");
}

#[test]
fn test_sync_errors_convert() {
    let err: Error = SyncError::ConflictNotFound("ABC-1".into()).into();
    assert!(matches!(err, Error::Sync(_)));
    assert!(err.to_string().contains("ABC-1"));
}

#[test]
fn test_error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();
    assert!(matches!(err, Error::Io(_)));
}
