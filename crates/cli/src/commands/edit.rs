// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::{FieldMap, Issue, RichText};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::service::SyncService;
use crate::sync::RemoteClient;

use super::new::normalize_labels;
use super::{finish, open_service};

pub async fn run(id: &str, attr: &str, value: &str) -> Result<()> {
    let service = open_service().await?;
    let result = run_impl(&service, id, attr, value).await;
    finish(service, result).await.map(|_| ())
}

/// Internal implementation that accepts the service for testing.
pub(crate) async fn run_impl<R: RemoteClient>(
    service: &SyncService<R>,
    id: &str,
    attr: &str,
    value: &str,
) -> Result<Issue> {
    let editor = service.editor();
    let issue = match attr {
        "summary" => editor.update_summary(id, value).await?,
        "description" => editor.update_description(id, RichText::from(value)).await?,
        _ => {
            let (field, value) = field_value(attr, value)?;
            let mut patch = FieldMap::new();
            patch.insert(field.to_string(), value);
            editor.update_fields(id, patch).await?
        }
    };
    println!("Updated {} of {}", attr, issue.key);
    Ok(issue)
}

/// Maps a CLI attribute to its field and JSON value. Empty text clears
/// optional fields.
pub(crate) fn field_value(attr: &str, value: &str) -> Result<(&'static str, Value)> {
    let optional = |v: &str| match v.trim() {
        "" => Value::Null,
        v => Value::from(v),
    };
    match attr {
        "priority" => Ok(("priority", optional(value))),
        "assignee" => Ok(("assignee", optional(value))),
        "type" | "issue_type" => {
            if value.trim().is_empty() {
                return Err(Error::FieldEmpty { field: "Type" });
            }
            Ok(("issue_type", Value::from(value.trim())))
        }
        "labels" => {
            let labels = normalize_labels(value.split(',').map(String::from).collect());
            Ok(("labels", Value::from(labels)))
        }
        other => Err(Error::UnknownAttribute(other.to_string())),
    }
}

#[cfg(test)]
#[path = "edit_tests.rs"]
mod tests;
