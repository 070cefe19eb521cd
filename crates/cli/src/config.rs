// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration management.
//!
//! Configuration is stored in `.offtrack/config.toml` and includes:
//! - `connection`: The active connection id (scopes the pull cursor)
//! - `[remote]`: WebSocket endpoint of the remote tracker
//! - `[sync]`: Retry cap, backoff and conflict policy of the sync engine
//! - `[search]`: Typo tolerance of the fuzzy search fallback

use ot_core::PolicyKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const WORK_DIR_NAME: &str = ".offtrack";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "replica.db";

/// Project configuration stored in `.offtrack/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Active connection id.
    pub connection: String,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub search: SearchSettings,
}

/// Remote tracker endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// `ws://...` or `wss://...`
    pub url: String,
    /// Max time to wait for any single pull or push (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Sync engine and scheduler tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Push attempts before a retryable failure abandons the operation (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First backoff delay after a failed cycle in milliseconds (default: 500).
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff ceiling in seconds (default: 60).
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Periodic sync interval in seconds. Absent or 0 disables the timer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic_interval_secs: Option<u64>,
    #[serde(default)]
    pub conflict_policy: PolicyKind,
}

/// Search tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Allowed edit distance as a fraction of term length (default: 0.2).
    #[serde(default = "default_fuzziness")]
    pub fuzziness: f64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_secs() -> u64 {
    60
}

fn default_fuzziness() -> f64 {
    0.2
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_secs: default_max_backoff_secs(),
            periodic_interval_secs: None,
            conflict_policy: PolicyKind::default(),
        }
    }
}

impl SyncSettings {
    /// Backoff after `failures` consecutive transient failures:
    /// `initial · 2^(failures-1)`, capped.
    pub fn backoff(&self, failures: u32) -> Duration {
        let cap = Duration::from_secs(self.max_backoff_secs);
        let exponent = failures.saturating_sub(1).min(31);
        let delay = Duration::from_millis(self.initial_backoff_ms.saturating_mul(1u64 << exponent));
        delay.min(cap)
    }

    /// The periodic interval, if enabled.
    pub fn periodic_interval(&self) -> Option<Duration> {
        self.periodic_interval_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings { fuzziness: default_fuzziness() }
    }
}

impl RemoteConfig {
    /// Validates that the URL is a WebSocket URL.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        if self.url.starts_with("ws://") || self.url.starts_with("wss://") {
            return None;
        }
        Some(format!("invalid remote URL '{}': must be ws:// or wss://", self.url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    /// Creates a config for the given connection and remote URL.
    pub fn new(connection: &str, url: &str) -> Result<Self> {
        if connection.trim().is_empty() {
            return Err(Error::FieldEmpty { field: "Connection" });
        }
        let remote =
            RemoteConfig { url: url.to_string(), request_timeout_ms: default_request_timeout_ms() };
        if let Some(reason) = remote.validate_url() {
            return Err(Error::Config(reason));
        }
        Ok(Config {
            connection: connection.to_string(),
            remote,
            sync: SyncSettings::default(),
            search: SearchSettings::default(),
        })
    }

    /// Loads configuration from the given `.offtrack/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        if let Some(reason) = config.remote.validate_url() {
            return Err(Error::Config(reason));
        }
        if !(0.0..=1.0).contains(&config.search.fuzziness) {
            return Err(Error::Config(format!(
                "search.fuzziness must be between 0 and 1, got {}",
                config.search.fuzziness
            )));
        }
        if config.sync.max_attempts == 0 {
            return Err(Error::Config("sync.max_attempts must be at least 1".to_string()));
        }
        Ok(config)
    }

    /// Saves configuration to the given `.offtrack/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs::write(&config_path, content)?;
        Ok(())
    }
}

/// Find the .offtrack directory by walking up from the current directory
pub fn find_work_dir() -> Result<PathBuf> {
    find_work_dir_from(&std::env::current_dir()?)
}

/// Find the .offtrack directory by walking up from `start`
pub fn find_work_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Get the database path for a work directory
pub fn get_db_path(work_dir: &Path) -> PathBuf {
    work_dir.join(DB_FILE_NAME)
}

/// Initialize a new .offtrack directory at the given path
pub fn init_work_dir(path: &Path, connection: &str, url: &str) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.join(CONFIG_FILE_NAME).exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let config = Config::new(connection, url)?;
    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;

    Ok(work_dir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
