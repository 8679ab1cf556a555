//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub identity_store_path: PathBuf,
    pub media_root: PathBuf,
    pub default_location: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Remote Service ---
        let api_base_url = std::env::var("STYLESENSE_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let api_base_url = normalize_base_url(&api_base_url).ok_or_else(|| {
            ConfigError::InvalidValue(
                "STYLESENSE_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_base_url),
            )
        })?;

        // --- Local State ---
        let identity_store_path = std::env::var("IDENTITY_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./.stylesense/identity.json"));
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let default_location =
            std::env::var("DEFAULT_LOCATION").unwrap_or_else(|_| "Vellore, India".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            identity_store_path,
            media_root,
            default_location,
            log_level,
        })
    }
}

/// Strips trailing slashes and rejects anything that is not an http(s) URL.
fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        None
    }
}
