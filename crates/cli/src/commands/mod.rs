// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod conflicts;
pub mod edit;
pub mod init;
pub mod lifecycle;
pub mod list;
pub mod new;
pub mod pending;
pub mod search;
pub mod show;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::PathBuf;

use ot_core::Database;
use serde::Serialize;

use crate::config::{find_work_dir, get_db_path, Config};
use crate::error::Result;
use crate::service::SyncService;

/// Helper to open the database from the current context.
pub fn open_db() -> Result<(Database, Config, PathBuf)> {
    let work_dir = find_work_dir()?;
    let config = Config::load(&work_dir)?;
    let db = Database::open(&get_db_path(&work_dir))?;
    Ok((db, config, work_dir))
}

/// Helper to start the sync service for the current context.
///
/// Callers must `shutdown` it when done.
pub async fn open_service() -> Result<SyncService> {
    let (db, config, _) = open_db()?;
    Ok(SyncService::open(&config, db).await?)
}

/// Shuts the service down and hands back the command's result.
pub async fn finish<T>(service: SyncService, result: Result<T>) -> Result<T> {
    service.shutdown().await;
    result
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
