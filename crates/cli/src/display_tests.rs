// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use chrono::{TimeZone, Utc};
use ot_core::{EntityType, FieldMap, OpKind, OpState, RichText};
use serde_json::json;
use yare::parameterized;

fn test_issue() -> Issue {
    let mut issue = Issue::new(
        "10001",
        "ABC-1",
        "ABC",
        "Login page crash",
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(),
    );
    issue.issue_type = "Bug".into();
    issue.status = "In Progress".into();
    issue
}

fn test_op() -> PendingOperation {
    let mut fields = FieldMap::new();
    fields.insert("summary".into(), json!("Login fails on Safari"));
    PendingOperation {
        id: "op-1a2b3c4d".into(),
        entity_type: EntityType::Issue,
        entity_id: "10001".into(),
        kind: OpKind::Update,
        fields,
        base: FieldMap::new(),
        created_at: 1,
        attempts: 0,
        last_error: None,
        state: OpState::Queued,
    }
}

#[parameterized(
    synced = { SyncStatus::Synced, None, "- [Bug][In Progress] ABC-1: Login page crash" },
    pending = { SyncStatus::Pending, None, "- [Bug][In Progress] ABC-1: Login page crash (pending)" },
    failed = { SyncStatus::Pending, Some("timeout"), "- [Bug][In Progress] ABC-1: Login page crash (sync failed)" },
    conflict = { SyncStatus::Conflict, None, "- [Bug][In Progress] ABC-1: Login page crash (conflict)" },
)]
fn test_format_issue_line(status: SyncStatus, error: Option<&str>, expected: &str) {
    let mut issue = test_issue();
    issue.local.sync_status = status;
    issue.local.sync_error = error.map(String::from);
    assert_eq!(format_issue_line(&issue), expected);
}

#[test]
fn test_format_issue_details_includes_description_and_comments() {
    let mut issue = test_issue();
    issue.description = Some(RichText::from("Safari only"));
    issue.labels = vec!["ui".into(), "safari".into()];
    let mut comment = Comment::new(
        "20001",
        "10001",
        RichText::from("Seen on 17.2"),
        Utc.with_ymd_and_hms(2024, 1, 11, 9, 30, 0).unwrap(),
    );
    comment.author = Some("dana".into());

    let output = format_issue_details(&issue, &[comment]);

    assert!(output.starts_with("[Bug] ABC-1: Login page crash"));
    assert!(output.contains("Labels: ui, safari"));
    assert!(output.contains("Description:\n    Safari only"));
    assert!(output.contains("  2024-01-11 09:30 dana\n    Seen on 17.2"));
}

#[test]
fn test_wrap_text() {
    assert_eq!(wrap_text("short", 10), "short");
    assert_eq!(wrap_text("one two three", 7), "one two\nthree");
    assert_eq!(wrap_text("keep\nlines as they are", 4), "keep\nlines as they are");
}

#[test]
fn test_format_operation_line() {
    let mut op = test_op();
    assert_eq!(format_operation_line(&op), "op-1a2b3c4d  update issue 10001 [summary]");

    op.attempts = 5;
    op.state = OpState::Abandoned;
    op.last_error = Some("network error: timeout".into());
    assert_eq!(
        format_operation_line(&op),
        "op-1a2b3c4d  update issue 10001 [summary] attempts=5 abandoned error: network error: timeout"
    );
}

#[test]
fn test_format_conflict_shows_both_sides() {
    let mut local = FieldMap::new();
    local.insert("summary".into(), json!("Local"));
    let mut remote = FieldMap::new();
    remote.insert("summary".into(), json!("Remote"));
    let conflict = Conflict {
        entity_type: EntityType::Issue,
        entity_id: "10001".into(),
        entity_key: "ABC-1".into(),
        connection_id: "acme".into(),
        fields: vec!["summary".into()],
        local_value: local,
        remote_value: Some(remote),
        remote_version: Some("v2".into()),
        detected_at: Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap(),
    };

    let output = format_conflict(&conflict);
    assert!(output.contains("issue ABC-1 (10001)"));
    assert!(output.contains("local:  Local"));
    assert!(output.contains("remote: Remote"));

    let deleted = Conflict { remote_value: None, ..conflict };
    assert!(format_conflict(&deleted).contains("deleted remotely"));
}

#[test]
fn test_format_report() {
    let report = CycleReport { pulled: 3, merged: 2, conflicted: 1, pushed: 4, failed: 0, deferred: 0 };
    assert_eq!(format_report(&report), "pulled 3, merged 2, conflicted 1, pushed 4, failed 0");
    let report = CycleReport { deferred: 1, ..report };
    assert!(format_report(&report).ends_with(", deferred 1"));
}
