// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::{Database, Issue, StatusCategory, SyncStatus};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::display::format_issue_line;
use crate::error::Result;

use super::{open_db, print_json};

/// JSON representation of an issue for list output.
#[derive(Serialize)]
pub(crate) struct ListIssueJson<'a> {
    id: &'a str,
    key: &'a str,
    issue_type: &'a str,
    status: &'a str,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<&'a str>,
    labels: &'a [String],
    sync_status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_error: Option<&'a str>,
}

impl<'a> From<&'a Issue> for ListIssueJson<'a> {
    fn from(issue: &'a Issue) -> Self {
        ListIssueJson {
            id: &issue.id,
            key: &issue.key,
            issue_type: &issue.issue_type,
            status: &issue.status,
            summary: &issue.summary,
            assignee: issue.assignee.as_deref(),
            labels: &issue.labels,
            sync_status: issue.local.sync_status,
            sync_error: issue.local.sync_error.as_deref(),
        }
    }
}

/// Prints issues in the requested format.
pub(crate) fn print_issues(issues: &[Issue], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Text => {
            for issue in issues {
                println!("{}", format_issue_line(issue));
            }
        }
        OutputFormat::Json => {
            let json: Vec<ListIssueJson> = issues.iter().map(ListIssueJson::from).collect();
            print_json(&json)?;
        }
        OutputFormat::Id => {
            for issue in issues {
                println!("{}", issue.key);
            }
        }
    }
    Ok(())
}

pub fn run(
    status: Option<String>,
    unsynced: bool,
    limit: Option<usize>,
    output: OutputFormat,
) -> Result<()> {
    let (db, _, _) = open_db()?;
    let issues = filter_issues(&db, status.as_deref(), unsynced, limit)?;
    print_issues(&issues, output)
}

/// Live issues, most recently touched first.
pub(crate) fn filter_issues(
    db: &Database,
    status: Option<&str>,
    unsynced: bool,
    limit: Option<usize>,
) -> Result<Vec<Issue>> {
    let category = status.map(str::parse::<StatusCategory>).transpose()?;
    let issues = db
        .list_issues()?
        .into_iter()
        .filter(|i| category.is_none_or(|c| i.status_category == c))
        .filter(|i| !unsynced || i.local.sync_status != SyncStatus::Synced)
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    Ok(issues)
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
