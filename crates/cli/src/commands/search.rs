// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::Issue;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::service::SyncService;
use crate::sync::RemoteClient;

use super::list::print_issues;
use super::{finish, open_service};

pub async fn run(query: &str, limit: Option<usize>, output: OutputFormat) -> Result<()> {
    let service = open_service().await?;
    let result = run_impl(&service, query, limit).await;
    let issues = finish(service, result).await?;
    if issues.is_empty() && output == OutputFormat::Text {
        println!("No issues match '{}'", query);
        return Ok(());
    }
    print_issues(&issues, output)
}

/// Internal implementation that accepts the service for testing.
pub(crate) async fn run_impl<R: RemoteClient>(
    service: &SyncService<R>,
    query: &str,
    limit: Option<usize>,
) -> Result<Vec<Issue>> {
    let mut issues = service.search(query).await?;
    if let Some(limit) = limit {
        issues.truncate(limit);
    }
    Ok(issues)
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
