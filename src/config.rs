//! Configuration file parser for ~/.config/sacco-admin/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::util::{validate_api_url, UrlValidationError};

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "SACCO_API_URL";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid API URL: {0}")]
    ApiUrl(#[from] UrlValidationError),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Where content is persisted.
///
/// Chosen once at startup; there is no runtime probing for the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Remote REST content API, with the local store as a read fallback.
    Remote,
    /// Local store only; nothing reaches a server.
    Local,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,

    /// Authenticated API root, e.g. `https://sacco.example.com/api`.
    pub api_base_url: String,

    /// Public (unauthenticated) API root. Defaults to `<api_base_url>/public`.
    pub public_api_url: Option<String>,

    pub request_timeout_secs: u64,

    /// Admin session lifetime.
    pub session_hours: i64,

    /// How long a notification banner stays visible.
    pub notification_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            api_base_url: "http://localhost:8000/api".to_string(),
            public_api_url: None,
            request_timeout_secs: 20,
            session_hours: 24,
            notification_secs: 5,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "backend",
                "api_base_url",
                "public_api_url",
                "request_timeout_secs",
                "session_hours",
                "notification_secs",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), backend = ?config.backend, "Loaded configuration");
        Ok(config)
    }

    /// Apply the `SACCO_API_URL` override when it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(url = %url, "API URL overridden from environment");
                self.api_base_url = url;
            }
        }
        self
    }

    /// Validated authenticated API root (always ends with `/`).
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        Ok(validate_api_url(&self.api_base_url)?)
    }

    /// Validated public API root (always ends with `/`).
    pub fn public_url(&self) -> Result<Url, ConfigError> {
        match &self.public_api_url {
            Some(url) => Ok(validate_api_url(url)?),
            None => Ok(self.api_url()?.join("public/").map_err(UrlValidationError::from)?),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_hours.max(1))
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
