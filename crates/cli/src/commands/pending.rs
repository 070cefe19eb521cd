// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ot_core::PendingOperation;

use crate::cli::{OutputFormat, PendingCommand};
use crate::display::format_operation_line;
use crate::error::Result;
use crate::service::SyncService;
use crate::sync::{PushOutcome, RemoteClient};

use super::{finish, open_service, print_json};

pub async fn run(command: Option<PendingCommand>) -> Result<()> {
    let service = open_service().await?;
    let result = match command {
        None => list_impl(&service, OutputFormat::Text).await.map(|_| ()),
        Some(PendingCommand::List { output }) => {
            list_impl(&service, output.output).await.map(|_| ())
        }
        Some(PendingCommand::Retry { id }) => retry_impl(&service, &id).await.map(|_| ()),
        Some(PendingCommand::Discard { id }) => discard_impl(&service, &id).await.map(|_| ()),
    };
    finish(service, result).await
}

pub(crate) async fn list_impl<R: RemoteClient>(
    service: &SyncService<R>,
    output: OutputFormat,
) -> Result<Vec<PendingOperation>> {
    let ops = service.pending_operations().await?;
    match output {
        OutputFormat::Text if ops.is_empty() => println!("Nothing queued"),
        OutputFormat::Text => {
            for op in &ops {
                println!("{}", format_operation_line(op));
            }
        }
        OutputFormat::Json => print_json(&ops)?,
        OutputFormat::Id => {
            for op in &ops {
                println!("{}", op.id);
            }
        }
    }
    Ok(ops)
}

/// Pushes one operation now.
pub(crate) async fn retry_impl<R: RemoteClient>(
    service: &SyncService<R>,
    id: &str,
) -> Result<PushOutcome> {
    let outcome = service.sync_single_operation(id).await?;
    match &outcome {
        PushOutcome::Pushed | PushOutcome::PushedAmended => println!("Pushed {}", id),
        PushOutcome::Skipped => println!("{} waits for its conflict to be resolved", id),
        PushOutcome::Deferred => println!("{} waits for its issue to be pushed", id),
        PushOutcome::Conflicted => {
            println!("Remote reported a conflict for {}", id);
            println!("  hint: run 'offtrack conflicts' to review it");
        }
        PushOutcome::Retrying { attempts } => {
            println!("Push of {} failed (attempt {}); it stays queued", id, attempts)
        }
        PushOutcome::Abandoned => println!("Push of {} was refused; see 'offtrack pending'", id),
        PushOutcome::Gone => println!("{} is no longer queued", id),
    }
    Ok(outcome)
}

pub(crate) async fn discard_impl<R: RemoteClient>(
    service: &SyncService<R>,
    id: &str,
) -> Result<PendingOperation> {
    let op = service.delete_pending_operation(id).await?;
    println!("Discarded {} of {} {}", op.kind, op.entity_type, op.entity_id);
    Ok(op)
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
