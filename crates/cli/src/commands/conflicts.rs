// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::{Conflict, FieldMap};
use serde_json::Value;

use crate::cli::{ConflictsCommand, KeepSide, OutputFormat};
use crate::display::format_conflict;
use crate::error::{Error, Result};
use crate::service::SyncService;
use crate::sync::{RemoteClient, Resolution, SyncError};

use super::{finish, open_service, print_json};

pub async fn run(command: Option<ConflictsCommand>) -> Result<()> {
    let service = open_service().await?;
    let result = match command {
        None => list_impl(&service, OutputFormat::Text).await.map(|_| ()),
        Some(ConflictsCommand::List { output }) => {
            list_impl(&service, output.output).await.map(|_| ())
        }
        Some(ConflictsCommand::Resolve { id, keep, merged }) => {
            match resolution(keep, merged.as_deref()) {
                Ok(resolution) => resolve_impl(&service, &id, resolution).await,
                Err(e) => Err(e),
            }
        }
    };
    finish(service, result).await
}

/// Builds the resolution from the `--keep` / `--merged` flags.
pub(crate) fn resolution(keep: Option<KeepSide>, merged: Option<&str>) -> Result<Resolution> {
    match (keep, merged) {
        (_, Some(json)) => {
            let value: Value = serde_json::from_str(json)
                .map_err(|e| Error::InvalidMerged(e.to_string()))?;
            let Value::Object(map) = value else {
                return Err(Error::InvalidMerged("expected a JSON object".into()));
            };
            if map.is_empty() {
                return Err(Error::InvalidMerged("no fields given".into()));
            }
            Ok(Resolution::Merged(map.into_iter().collect::<FieldMap>()))
        }
        (Some(KeepSide::Local), None) => Ok(Resolution::KeepLocal),
        (Some(KeepSide::Remote), None) => Ok(Resolution::KeepRemote),
        (None, None) => Err(SyncError::InvalidResolution("choose --keep or --merged".into()).into()),
    }
}

pub(crate) async fn list_impl<R: RemoteClient>(
    service: &SyncService<R>,
    output: OutputFormat,
) -> Result<Vec<Conflict>> {
    let conflicts = service.conflicts().await?;
    match output {
        OutputFormat::Text if conflicts.is_empty() => println!("No conflicts"),
        OutputFormat::Text => {
            for conflict in &conflicts {
                println!("{}", format_conflict(conflict));
            }
        }
        OutputFormat::Json => print_json(&conflicts)?,
        OutputFormat::Id => {
            for conflict in &conflicts {
                println!("{}", conflict.entity_id);
            }
        }
    }
    Ok(conflicts)
}

/// Resolves the conflict registered for `id`, which may be an entity id or
/// an issue key.
pub(crate) async fn resolve_impl<R: RemoteClient>(
    service: &SyncService<R>,
    id: &str,
    resolution: Resolution,
) -> Result<()> {
    let conflicts = service.conflicts().await?;
    let entity_id = conflicts
        .iter()
        .find(|c| c.entity_id == id || c.entity_key == id)
        .map(|c| c.entity_id.clone())
        .ok_or_else(|| SyncError::ConflictNotFound(id.to_string()))?;

    service.resolve_conflict(&entity_id, resolution.clone()).await?;
    println!("Resolved {} ({})", id, resolution);
    if resolution != Resolution::KeepRemote {
        println!("  hint: run 'offtrack sync' to push the kept values");
    }
    Ok(())
}

#[cfg(test)]
#[path = "conflicts_tests.rs"]
mod tests;
