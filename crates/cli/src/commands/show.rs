// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::{Comment, Database, Issue};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::display::format_issue_details;
use crate::error::Result;

use super::{open_db, print_json};

#[derive(Serialize)]
struct IssueDetails {
    #[serde(flatten)]
    issue: Issue,
    comments: Vec<Comment>,
}

pub fn run(id: &str, output: OutputFormat) -> Result<()> {
    let (db, _, _) = open_db()?;
    run_impl(&db, id, output)
}

/// Internal implementation that accepts db for testing.
pub(crate) fn run_impl(db: &Database, id: &str, output: OutputFormat) -> Result<()> {
    let issue = db.resolve_issue(id)?;
    let comments: Vec<Comment> =
        db.list_comments(&issue.id)?.into_iter().filter(|c| !c.local.deleted).collect();

    match output {
        OutputFormat::Text => println!("{}", format_issue_details(&issue, &comments)),
        OutputFormat::Json => print_json(&IssueDetails { issue, comments })?,
        OutputFormat::Id => println!("{}", issue.key),
    }
    Ok(())
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
