// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::{Comment, Conflict, Issue, PendingOperation, SyncStatus};
use serde_json::Value;

use crate::sync::{CycleReport, LogEntry};

/// Maximum line width for wrapped text content (excluding 4-space indent).
const WRAP_WIDTH: usize = 96;

/// Marker shown after an issue that is not in its synced state.
fn sync_marker(status: SyncStatus, error: Option<&str>) -> &'static str {
    match (status, error) {
        (SyncStatus::Synced, _) => "",
        (SyncStatus::Pending, None) => " (pending)",
        (SyncStatus::Pending, Some(_)) => " (sync failed)",
        (SyncStatus::Conflict, _) => " (conflict)",
    }
}

/// Wrap text at word boundaries if it's a single line.
///
/// - If content contains newlines: return as-is (preserve user formatting)
/// - If content is single line >width: wrap at word boundaries
/// - If content is single line <=width: return as-is
pub fn wrap_text(content: &str, width: usize) -> String {
    if content.contains('\n') || content.len() <= width {
        return content.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in content.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

fn indented(content: &str) -> Vec<String> {
    wrap_text(content, WRAP_WIDTH).lines().map(|l| format!("    {}", l)).collect()
}

/// One-line summary: `- [Bug][In Progress] ABC-1: Login crash (pending)`
pub fn format_issue_line(issue: &Issue) -> String {
    format!(
        "- [{}][{}] {}: {}{}",
        issue.issue_type,
        issue.status,
        issue.key,
        issue.summary,
        sync_marker(issue.local.sync_status, issue.local.sync_error.as_deref())
    )
}

/// Multi-line view of an issue and its comments.
pub fn format_issue_details(issue: &Issue, comments: &[Comment]) -> String {
    let mut lines = vec![
        format!("[{}] {}: {}", issue.issue_type, issue.key, issue.summary),
        format!("Status: {} ({})", issue.status, issue.status_category),
    ];
    if let Some(assignee) = &issue.assignee {
        lines.push(format!("Assignee: {}", assignee));
    }
    if let Some(priority) = &issue.priority {
        lines.push(format!("Priority: {}", priority));
    }
    if !issue.labels.is_empty() {
        lines.push(format!("Labels: {}", issue.labels.join(", ")));
    }
    lines.push(format!("Updated: {}", issue.updated.format("%Y-%m-%d %H:%M")));
    lines.push(format!("Sync: {}", issue.local.sync_status));
    if let Some(error) = &issue.local.sync_error {
        lines.push(format!("Sync error: {}", error));
    }

    let description = issue.description_text();
    if !description.is_empty() {
        lines.push(String::new());
        lines.push("Description:".to_string());
        lines.extend(indented(&description));
    }

    if !comments.is_empty() {
        lines.push(String::new());
        lines.push("Comments:".to_string());
        for comment in comments {
            lines.push(format!(
                "  {}{}{}",
                comment.created.format("%Y-%m-%d %H:%M"),
                comment.author.as_deref().map(|a| format!(" {}", a)).unwrap_or_default(),
                sync_marker(comment.local.sync_status, comment.local.sync_error.as_deref())
            ));
            lines.extend(indented(&comment.body.plain_text()));
        }
    }

    lines.join("\n")
}

/// `op-1a2b3c4d  update issue 10001 [summary] attempts=2 error: ...`
pub fn format_operation_line(op: &PendingOperation) -> String {
    let mut line = format!("{}  {} {} {}", op.id, op.kind, op.entity_type, op.entity_id);
    if !op.fields.is_empty() {
        let names: Vec<&str> = op.fields.keys().map(String::as_str).collect();
        line.push_str(&format!(" [{}]", names.join(", ")));
    }
    if op.attempts > 0 {
        line.push_str(&format!(" attempts={}", op.attempts));
    }
    if op.is_abandoned() {
        line.push_str(" abandoned");
    }
    if let Some(error) = &op.last_error {
        line.push_str(&format!(" error: {}", error));
    }
    line
}

fn show_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "(none)".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(value) if ot_core::document::is_document(value) => {
            ot_core::document::plain_text_of(value)
        }
        Some(value) => value.to_string(),
    }
}

/// A conflict with local and remote values side by side.
pub fn format_conflict(conflict: &Conflict) -> String {
    let mut lines = vec![format!(
        "{} {} ({}), detected {}",
        conflict.entity_type,
        conflict.entity_key,
        conflict.entity_id,
        conflict.detected_at.format("%Y-%m-%d %H:%M")
    )];
    match &conflict.remote_value {
        None => lines.push("  deleted remotely".to_string()),
        Some(remote) => {
            for field in &conflict.fields {
                lines.push(format!("  {}:", field));
                lines.push(format!("    local:  {}", show_value(conflict.local_value.get(field))));
                lines.push(format!("    remote: {}", show_value(remote.get(field))));
            }
        }
    }
    lines.join("\n")
}

pub fn format_report(report: &CycleReport) -> String {
    let mut line = format!(
        "pulled {}, merged {}, conflicted {}, pushed {}, failed {}",
        report.pulled, report.merged, report.conflicted, report.pushed, report.failed
    );
    if report.deferred > 0 {
        line.push_str(&format!(", deferred {}", report.deferred));
    }
    line
}

/// `12:04:05.120 INFO  push     Pushing update of issue ABC-1`
pub fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "{} {:<7} {:<9} {}",
        entry.timestamp.format("%H:%M:%S%.3f"),
        entry.level.as_str().to_uppercase(),
        entry.operation.as_str(),
        entry.message
    )
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
