//! Back-office configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const API_URL_VAR: &str = "ESTATE_API_URL";
const DATA_DIR_VAR: &str = "ESTATE_DATA_DIR";
const TIMEOUT_VAR: &str = "ESTATE_REQUEST_TIMEOUT_SECS";
const LOG_VAR: &str = "ESTATE_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the back-office API
    pub api_base_url: String,
    /// Path to the database file holding persisted credentials
    pub database_path: PathBuf,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Default tracing filter
    pub log_filter: String,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            database_path: data_dir.join("estate.db"),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_filter: "info".to_string(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("EstateDesk"))
            .unwrap_or_else(|| PathBuf::from(".estate"))
    }

    /// Defaults overridden by `ESTATE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = var(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir);
        let mut config = Self::new(data_dir);

        if let Some(url) = var(API_URL_VAR) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(secs) = var(TIMEOUT_VAR) {
            config.request_timeout_secs = secs.trim().parse().map_err(|_| {
                CoreError::Config(format!("{} must be a number of seconds, got {:?}", TIMEOUT_VAR, secs))
            })?;
        }
        if let Some(filter) = var(LOG_VAR) {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request timeout must be at least one second".to_string(),
            ));
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(CoreError::Config(format!(
                "API URL must be http or https: {}",
                self.api_base_url
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
