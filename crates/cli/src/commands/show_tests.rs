// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use chrono::Utc;
use ot_core::RichText;
use yare::parameterized;

fn db_with_issue() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.put_issue(&Issue::new("10001", "ABC-1", "ABC", "Login fails", Utc::now())).unwrap();
    db.put_comment(&Comment::new("20001", "10001", RichText::from("Seen on 17.2"), Utc::now()))
        .unwrap();
    db
}

#[parameterized(
    text = { OutputFormat::Text },
    json = { OutputFormat::Json },
    id = { OutputFormat::Id },
)]
fn test_show_by_key_or_id(output: OutputFormat) {
    let db = db_with_issue();
    run_impl(&db, "ABC-1", output).unwrap();
    run_impl(&db, "10001", output).unwrap();
}

#[test]
fn test_show_unknown_issue() {
    let db = db_with_issue();
    let err = run_impl(&db, "ABC-2", OutputFormat::Text).unwrap_err();
    assert!(err.to_string().contains("ABC-2"));
}
