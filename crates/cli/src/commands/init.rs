// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use ot_core::Database;

use crate::config::{get_db_path, init_work_dir};
use crate::error::Result;

pub fn run(url: String, connection: String, path: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    let work_dir = run_impl(&target_path, &connection, &url)?;

    println!("Initialized replica at {}", work_dir.display());
    println!("Connection: {}", connection);
    println!("Remote: {}", url);
    Ok(())
}

/// Writes the config and creates the database schema.
pub(crate) fn run_impl(target_path: &Path, connection: &str, url: &str) -> Result<PathBuf> {
    let work_dir = init_work_dir(target_path, connection, url)?;
    Database::open(&get_db_path(&work_dir))?;
    Ok(work_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
