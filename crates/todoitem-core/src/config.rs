//! Configuration loading
//!
//! The backend address is read once at startup, from
//! `~/.config/todoitem/config.toml`, the `TODOITEM_API_BASE` environment
//! variable, or the command line, and handed to [`crate::ApiClient`].

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `api_base`
pub const API_BASE_ENV: &str = "TODOITEM_API_BASE";

/// todoitem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the to-do REST API, e.g. `http://localhost:7027/api`
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_api_base() -> String {
    "http://localhost:7027/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Config {
    /// Default config file location
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("todoitem")
            .join("config.toml")
    }

    /// Load from the default location, or defaults if there is no file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, or defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Apply `TODOITEM_API_BASE` if set
    pub fn with_env(self) -> Self {
        self.with_env_value(std::env::var(API_BASE_ENV).ok())
    }

    fn with_env_value(self, value: Option<String>) -> Self {
        match value {
            Some(base) if !base.trim().is_empty() => self.with_api_base(base.trim()),
            _ => self,
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Check the base URL and normalize it
    pub fn validate(mut self) -> Result<Self> {
        let url = Url::parse(&self.api_base)
            .with_context(|| format!("Invalid api_base '{}'", self.api_base))?;

        if !matches!(url.scheme(), "http" | "https") {
            bail!("api_base must be an http or https URL, got '{}'", self.api_base);
        }
        if self.request_timeout == 0 {
            bail!("request_timeout must be at least 1 second");
        }

        self.api_base = self.api_base.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
