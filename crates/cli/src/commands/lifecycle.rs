// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::{Comment, Issue, RichText, StatusCategory};

use crate::error::Result;
use crate::service::SyncService;
use crate::sync::RemoteClient;

use super::{finish, open_service};

pub async fn transition(id: &str, status: &str, category: Option<&str>) -> Result<()> {
    let service = open_service().await?;
    let result = transition_impl(&service, id, status, category).await;
    finish(service, result).await.map(|_| ())
}

pub async fn delete(id: &str) -> Result<()> {
    let service = open_service().await?;
    let result = delete_impl(&service, id).await;
    finish(service, result).await
}

pub async fn comment(id: &str, body: &str) -> Result<()> {
    let service = open_service().await?;
    let result = comment_impl(&service, id, body).await;
    finish(service, result).await.map(|_| ())
}

/// Category for a status name the user did not classify.
pub(crate) fn infer_category(status: &str) -> StatusCategory {
    match status.trim().to_lowercase().as_str() {
        "to do" | "todo" | "open" | "new" | "backlog" | "selected for development" => {
            StatusCategory::Todo
        }
        "done" | "closed" | "resolved" | "won't do" | "cancelled" => StatusCategory::Done,
        _ => StatusCategory::Indeterminate,
    }
}

pub(crate) async fn transition_impl<R: RemoteClient>(
    service: &SyncService<R>,
    id: &str,
    status: &str,
    category: Option<&str>,
) -> Result<Issue> {
    let category = match category {
        Some(c) => c.parse::<StatusCategory>()?,
        None => infer_category(status),
    };
    let issue = service.editor().transition(id, status, category).await?;
    println!("{} is now {} ({})", issue.key, issue.status, issue.status_category);
    Ok(issue)
}

pub(crate) async fn delete_impl<R: RemoteClient>(service: &SyncService<R>, id: &str) -> Result<()> {
    service.editor().delete_issue(id).await?;
    println!("Deleted {}", id);
    Ok(())
}

pub(crate) async fn comment_impl<R: RemoteClient>(
    service: &SyncService<R>,
    id: &str,
    body: &str,
) -> Result<Comment> {
    let comment = service.editor().add_comment(id, RichText::from(body)).await?;
    println!("Commented on {}", id);
    Ok(comment)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
