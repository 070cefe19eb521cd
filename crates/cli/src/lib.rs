// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! otrs - An offline-first replica of a remote issue tracker.
//!
//! This crate provides the functionality behind the `offtrack` CLI: a local
//! SQLite replica that can be read and edited while disconnected, and a sync
//! engine that reconciles it with the remote tracker.
//!
//! # Main Components
//!
//! - [`SyncService`] - Owns the replica store, sync engine, scheduler and search index
//! - [`sync`] - Pending queue, pull/merge/push engine, conflict registry, debug log
//! - [`search`] - Hybrid exact/fuzzy issue search
//! - [`Config`] - Project configuration (connection, remote, sync tuning)
//! - [`Error`] - Error types for all operations
//!
//! # Initialization
//!
//! Use [`init_work_dir`] to create a new `.offtrack/` directory, then start
//! the service:
//!
//! ```rust,ignore
//! use otrs::{find_work_dir, get_db_path, init_work_dir, Config, SyncService};
//!
//! // Initialize a new replica
//! let work_dir = init_work_dir(Path::new("."), "acme", "wss://tracker.example.com/sync")?;
//!
//! // Later, find the replica and sync it
//! let work_dir = find_work_dir()?;
//! let config = Config::load(&work_dir)?;
//! let db = ot_core::Database::open(&get_db_path(&work_dir))?;
//! let service = SyncService::open(&config, db).await?;
//! service.start_sync().await?;
//! service.shutdown().await;
//! ```

mod cli;
mod commands;
mod display;

pub mod config;
pub mod error;
pub mod id;
pub mod search;
pub mod service;
pub mod sync;

pub use cli::{
    Cli, Command, ConflictsCommand, KeepSide, LimitArgs, OutputArgs, OutputFormat,
    PendingCommand,
};
pub use config::{find_work_dir, get_db_path, init_work_dir, Config};
pub use error::{Error, Result};
pub use service::SyncService;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(command: Command) -> Result<()> {
    match command {
        Command::Init { url, connection, path } => commands::init::run(url, connection, path),
        Command::New { summary, project, description, issue_type, priority, assignee, label, output } => {
            commands::new::run(
                summary,
                project,
                description,
                issue_type,
                priority,
                assignee,
                label,
                output.output,
            )
            .await
        }
        Command::Edit { id, attr, value } => commands::edit::run(&id, &attr, &value).await,
        Command::Transition { id, status, category } => {
            commands::lifecycle::transition(&id, &status, category.as_deref()).await
        }
        Command::Delete { id } => commands::lifecycle::delete(&id).await,
        Command::Comment { id, body } => commands::lifecycle::comment(&id, &body).await,
        Command::Show { id, output } => commands::show::run(&id, output.output),
        Command::List { status, unsynced, limits, output } => {
            commands::list::run(status, unsynced, limits.effective(), output.output)
        }
        Command::Sync { verbose } => commands::sync::run(verbose).await,
        Command::Pending { command } => commands::pending::run(command).await,
        Command::Conflicts { command } => commands::conflicts::run(command).await,
        Command::Search { query, limits, output } => {
            commands::search::run(&query, limits.effective(), output.output).await
        }
    }
}
