// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::{Issue, RichText};

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::service::SyncService;
use crate::sync::{NewIssue, RemoteClient};

use super::{finish, open_service, print_json};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    summary: String,
    project: String,
    description: Option<String>,
    issue_type: Option<String>,
    priority: Option<String>,
    assignee: Option<String>,
    labels: Vec<String>,
    output: OutputFormat,
) -> Result<()> {
    let new = NewIssue {
        project_key: project,
        summary,
        description: description.filter(|d| !d.trim().is_empty()).map(RichText::from),
        issue_type,
        priority,
        assignee,
        labels: normalize_labels(labels),
    };
    let service = open_service().await?;
    let result = run_impl(&service, new, output).await;
    finish(service, result).await.map(|_| ())
}

/// Internal implementation that accepts the service for testing.
pub(crate) async fn run_impl<R: RemoteClient>(
    service: &SyncService<R>,
    new: NewIssue,
    output: OutputFormat,
) -> Result<Issue> {
    let issue = service.editor().create_issue(new).await?;
    match output {
        OutputFormat::Text => {
            println!("Created {}: {} (pending)", issue.key, issue.summary)
        }
        OutputFormat::Json => print_json(&issue)?,
        OutputFormat::Id => println!("{}", issue.key),
    }
    Ok(issue)
}

/// Trims labels and drops empty or repeated ones, keeping first occurrence
/// order.
pub(crate) fn normalize_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

#[cfg(test)]
#[path = "new_tests.rs"]
mod tests;
