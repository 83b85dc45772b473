//! Configuration loading and management
//!
//! Session settings can come from environment variables or a TOML/JSON
//! file. Credentials are never read from these sources.

pub mod loader;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::RetryConfig;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

/// Session settings that can be loaded from the environment or a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub base_url: String,
    pub user_agent: Option<String>,
    /// Requests per second; `0` disables the cap
    pub request_limit: u32,
    pub http_tracing: bool,
    pub timeout_secs: Option<u64>,
    /// Retries stay disabled unless present
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("no config file found in any of the standard locations")]
    NoConfigFile,

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML format: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON format: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
