//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/folio",
//!   "url_secret": "change-me",
//!   "public_base_url": "https://folio.example.com",
//!   "max_upload_bytes": 26214400,
//!   "log_level": "info",
//!   "http": { "host": "0.0.0.0", "port": 54321, "cors_origins": [] }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::http_server::HttpServerConfig;
use crate::observability::Severity;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Base of every blob URL handed out (default "http://127.0.0.1:54321")
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Secret binding blob URLs to their paths (required)
    #[serde(default)]
    pub url_secret: String,

    /// Largest single upload in bytes (default 25 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_public_base_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_max_upload_bytes() -> u64 {
    25 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.url_secret.is_empty() {
            return Err(CliError::config_error("url_secret is required"));
        }

        if self.max_upload_bytes == 0 {
            return Err(CliError::config_error("max_upload_bytes must be > 0"));
        }

        let base = Url::parse(&self.public_base_url).map_err(|e| {
            CliError::config_error(format!(
                "Invalid public_base_url '{}': {}",
                self.public_base_url, e
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.query().is_some() {
            return Err(CliError::config_error(format!(
                "public_base_url must be a plain http(s) URL, got '{}'",
                self.public_base_url
            )));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                self.log_level
            )));
        }

        self.http
            .bind_addr()
            .map_err(|e| CliError::config_error(format!("Invalid http config: {}", e)))?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// One JSON file per record collection
    pub fn collections_dir(&self) -> PathBuf {
        self.data_path().join("collections")
    }

    /// Blob objects, one file each
    pub fn blobs_dir(&self) -> PathBuf {
        self.data_path().join("blobs")
    }

    /// Configured minimum log severity
    pub fn min_severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }
}
