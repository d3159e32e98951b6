// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher configuration.
//!
//! Configuration is read from a TOML file:
//!
//! ```toml
//! database = "chat/chatline.db"
//!
//! [remote]
//! endpoint = "https://assistant.example.edu/v1/chat"
//! request_timeout_ms = 30000
//!
//! [retention]
//! max_age_days = 30
//! sweep_interval_secs = 86400
//!
//! [probe]
//! address = "8.8.8.8:53"
//! timeout_ms = 1500
//!
//! [[seed]]
//! query = "duration"
//! response = "The program runs for 2 years, divided into 4 semesters."
//! ```
//!
//! Only `[remote].endpoint` is required. `CHATLINE_DB` overrides `database`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chatline_core::ResponseSeed;

/// Environment variable overriding the database path.
pub const DATABASE_ENV: &str = "CHATLINE_DB";

const DEFAULT_DATABASE: &str = "chatline.db";
const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Remote assistant service.
    pub remote: RemoteConfig,
    /// Retention horizon and sweep cadence.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Connectivity probe target.
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Curated answers preloaded into the response cache.
    #[serde(default, rename = "seed", skip_serializing_if = "Vec::is_empty")]
    pub seeds: Vec<ResponseSeed>,
}

/// Remote assistant service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// HTTP(S) URL messages are POSTed to.
    pub endpoint: String,
    /// Caller-visible timeout for a single request in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Retention configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Records older than this many days are purged (default: 30).
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
    /// Interval between background sweeps in seconds (default: 86400).
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            max_age_days: default_max_age_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Connectivity probe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// `host:port` the probe connects to.
    #[serde(default = "default_probe_address")]
    pub address: String,
    /// Connect timeout in milliseconds (default: 1500).
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            address: default_probe_address(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE)
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_age_days() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    86_400
}

fn default_probe_address() -> String {
    "8.8.8.8:53".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    1_500
}

impl Config {
    /// Creates a config with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Config {
            database: default_database(),
            remote: RemoteConfig {
                endpoint: endpoint.into(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            retention: RetentionConfig::default(),
            probe: ProbeConfig::default(),
            seeds: Vec::new(),
        }
    }

    /// Loads and validates a config file, applying environment overrides.
    ///
    /// A relative `database` path is resolved against the config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if config.database.is_relative() {
            if let Some(dir) = path.parent() {
                config.database = dir.join(&config.database);
            }
        }
        config.apply_env_override(std::env::var_os(DATABASE_ENV).map(PathBuf::from));
        Ok(config)
    }

    /// Parses and validates config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the config back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Replaces the database path when an override is present.
    pub fn apply_env_override(&mut self, database: Option<PathBuf>) {
        if let Some(path) = database.filter(|p| !p.as_os_str().is_empty()) {
            self.database = path;
        }
    }

    /// Checks value ranges and formats.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.remote.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "remote endpoint '{endpoint}' must start with http:// or https://"
            )));
        }
        if self.remote.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "remote.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.retention.max_age_days == 0 {
            return Err(ConfigError::Invalid(
                "retention.max_age_days must be greater than 0".to_string(),
            ));
        }
        if self.retention.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "retention.sweep_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.probe.address.trim().is_empty() {
            return Err(ConfigError::Invalid("probe.address is empty".to_string()));
        }
        if let Some(seed) = self.seeds.iter().find(|s| s.query.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "seed with response '{}' has an empty query",
                seed.response
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.request_timeout_ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention.max_age_days.saturating_mul(DAY_MS))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.retention.sweep_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe.timeout_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
