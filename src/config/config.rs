//! Configuration file handling
//!
//! Looks for `d365-metadata.toml` in the working directory unless
//! `D365_METADATA_CONFIG` points elsewhere. A missing file means defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "d365-metadata.toml";
pub const CONFIG_PATH_ENV: &str = "D365_METADATA_CONFIG";
pub const DEFAULT_OUTPUT: &str = "metadata/metadata.json";
pub const DEFAULT_TOKEN_ENV: &str = "D365_TOKEN";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Raw configuration as written in the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Service root or full `$metadata` URL
    pub endpoint: Option<String>,
    /// JSON artifact path; the raw XML lands next to it
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub insecure_ssl: Option<bool>,
    /// Environment variable holding the bearer token
    pub token_env: Option<String>,
}

/// Resolved settings used by the commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub endpoint: Option<String>,
    pub output: PathBuf,
    pub timeout: Duration,
    pub insecure_ssl: bool,
    pub token_env: String,
}

impl Config {
    /// Load from `D365_METADATA_CONFIG` or `./d365-metadata.toml`, falling
    /// back to defaults when neither exists
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load(Path::new(&path));
        }

        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!("Loading config from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply defaults and validate
    pub fn to_runtime(&self) -> Result<RuntimeConfig, ConfigError> {
        let timeout_secs = self.timeout_secs.unwrap_or(120);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let endpoint = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from);
        if let Some(ref endpoint) = endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        Ok(RuntimeConfig {
            endpoint,
            output: self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            timeout: Duration::from_secs(timeout_secs),
            insecure_ssl: self.insecure_ssl.unwrap_or(false),
            token_env: self
                .token_env
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
        })
    }
}

impl RuntimeConfig {
    /// Bearer token from the configured environment variable
    pub fn token_from_env(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}
