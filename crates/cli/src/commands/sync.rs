// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::display::{format_log_entry, format_report};
use crate::error::Result;
use crate::service::SyncService;
use crate::sync::{RemoteClient, SyncOutcome};

use super::{finish, open_service};

pub async fn run(verbose: bool) -> Result<()> {
    let service = open_service().await?;
    let result = run_impl(&service, verbose).await;
    finish(service, result).await.map(|_| ())
}

/// Runs one manual cycle and reports it. With `verbose` the debug log is
/// printed even when the cycle fails.
pub(crate) async fn run_impl<R: RemoteClient>(
    service: &SyncService<R>,
    verbose: bool,
) -> Result<SyncOutcome> {
    let outcome = service.start_sync().await;
    if verbose {
        for entry in service.debug_log() {
            println!("{}", format_log_entry(&entry));
        }
    }

    let outcome = outcome?;
    match &outcome {
        SyncOutcome::Completed(report) => {
            println!("Synced {}: {}", service.connection_id(), format_report(report));
            if report.conflicted > 0 {
                println!("  hint: run 'offtrack conflicts' to review conflicts");
            }
            if report.failed > 0 {
                println!("  hint: run 'offtrack pending' to see failed changes");
            }
        }
        SyncOutcome::AlreadyRunning => println!("A sync is already running"),
        SyncOutcome::BackingOff => println!("Waiting before the next attempt"),
        SyncOutcome::AuthBlocked => println!("Sync paused until credentials are refreshed"),
        SyncOutcome::Offline => println!("Offline; changes stay queued"),
        SyncOutcome::Cancelled => println!("Sync cancelled"),
    }
    Ok(outcome)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
