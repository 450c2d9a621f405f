//! HTTP request settings shared by every lookup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "12.0";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Request settings. Passed explicitly to the client; nothing here is global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Verify the server certificate. Only turn off for self-signed test
    /// or staging servers.
    pub reject_unauthorized: bool,
    pub timeout_secs: u64,
    /// Upper bound on offenses requested per entity (`Range` header)
    pub max_results: u32,
    /// Value of the QRadar `Version` header
    pub api_version: String,
    pub max_concurrent_lookups: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            reject_unauthorized: true,
            timeout_secs: 30,
            max_results: 50,
            api_version: DEFAULT_API_VERSION.to_string(),
            max_concurrent_lookups: 10,
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    /// Apply `QRADAR_REJECT_UNAUTHORIZED` and `QRADAR_TIMEOUT_SECS` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("QRADAR_REJECT_UNAUTHORIZED") {
            match v.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "no" => self.reject_unauthorized = false,
                "1" | "true" | "yes" => self.reject_unauthorized = true,
                other => log::warn!("Ignoring QRADAR_REJECT_UNAUTHORIZED={}", other),
            }
        }
        if let Ok(v) = std::env::var("QRADAR_TIMEOUT_SECS") {
            match v.trim().parse::<u64>() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => log::warn!("Ignoring QRADAR_TIMEOUT_SECS={}", v),
            }
        }
        self
    }
}
