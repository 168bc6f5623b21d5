//! TOML configuration.
//!
//! Loaded from `--config <path>` or `<config dir>/designpilot/config.toml`.
//! A missing file yields defaults; `DESIGNPILOT_API_URL` overrides the
//! service address.

use crate::review::history::DEFAULT_CAPACITY;
use crate::review::storage::DEFAULT_QUOTA_BYTES;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const API_URL_ENV: &str = "DESIGNPILOT_API_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the analysis service.
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8010".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory holding one JSON file per content kind. `~` is expanded.
    pub storage_dir: String,
    /// Records kept per kind.
    pub capacity: usize,
    /// Byte budget across all kinds.
    pub quota_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            storage_dir: "~/.designpilot/history".to_string(),
            capacity: DEFAULT_CAPACITY,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl Config {
    /// Load from `path`, or the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let mut config = match path {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                let config = Self::from_toml(&contents)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?;
                info!(config_path = %path.display(), "Configuration loaded");
                config
            }
            _ => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api.base_url = url;
            }
        }
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// JSON Schema for the config file.
    pub fn schema_json() -> Result<String> {
        let schema = schemars::schema_for!(Config);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "designpilot", "designpilot")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
