//! Configuration loader
//!
//! Loads session configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `PROPGRID_BASE_URL` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PROPGRID_BASE_URL`: API base URL (required)
//! - `PROPGRID_USER_AGENT`: User-Agent override
//! - `PROPGRID_REQUEST_LIMIT`: Requests per second, `0` for no cap
//! - `PROPGRID_HTTP_TRACING`: Log full requests and responses (true/false)
//! - `PROPGRID_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `PROPGRID_RETRY_MAX`: Enables retries with this maximum
//! - `PROPGRID_RETRY_WAIT_MIN_MS`: Minimum retry wait in milliseconds
//! - `PROPGRID_RETRY_WAIT_MAX_MS`: Maximum retry wait in milliseconds
//! - `PROPGRID_RETRY_EXCLUDED`: Comma-separated excluded path patterns
//!
//! Any retry variable enables retries, with defaults for the others.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./propgrid.toml` or `./propgrid.json` (current working directory)
//! 2. `../propgrid.toml` or `../propgrid.json` (parent directory)
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::TimeDelta;

use super::{ConfigError, ConfigResult, SessionConfig};
use crate::session::RetryConfig;

const FILE_NAMES: [&str; 2] = ["propgrid.toml", "propgrid.json"];

/// Load configuration with automatic fallback strategy
///
/// The config file is only consulted when `PROPGRID_BASE_URL` is unset.
///
/// # Errors
/// Returns `ConfigError::InvalidValue` for a malformed environment variable,
/// or the file error when neither source is usable.
pub fn load() -> ConfigResult<SessionConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(ConfigError::MissingVar(key)) => {
            tracing::debug!(missing = %key, "Environment not configured, trying file");
            load_from_file(None)
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `ConfigError::MissingVar` when `PROPGRID_BASE_URL` is not set and
/// `ConfigError::InvalidValue` when a variable cannot be parsed.
pub fn load_from_env() -> ConfigResult<SessionConfig> {
    let base_url = env_var("PROPGRID_BASE_URL")?;
    let user_agent = std::env::var("PROPGRID_USER_AGENT").ok();
    let request_limit = env_parse::<u32>("PROPGRID_REQUEST_LIMIT")?.unwrap_or(0);
    let http_tracing = env_bool("PROPGRID_HTTP_TRACING", false);
    let timeout_secs = env_parse::<u64>("PROPGRID_TIMEOUT_SECS")?;

    Ok(SessionConfig {
        base_url,
        user_agent,
        request_limit,
        http_tracing,
        timeout_secs,
        retry: retry_from_env()?,
    })
}

fn retry_from_env() -> ConfigResult<Option<RetryConfig>> {
    let max_retries = env_parse::<i32>("PROPGRID_RETRY_MAX")?;
    let min_wait = env_parse::<i64>("PROPGRID_RETRY_WAIT_MIN_MS")?;
    let max_wait = env_parse::<i64>("PROPGRID_RETRY_WAIT_MAX_MS")?;
    let excluded = std::env::var("PROPGRID_RETRY_EXCLUDED").ok();

    if max_retries.is_none() && min_wait.is_none() && max_wait.is_none() && excluded.is_none() {
        return Ok(None);
    }

    let mut config = RetryConfig::default();
    if let Some(max_retries) = max_retries {
        config.max_retries = max_retries;
    }
    if let Some(millis) = min_wait {
        config.min_wait = millis_to_delta("PROPGRID_RETRY_WAIT_MIN_MS", millis)?;
    }
    if let Some(millis) = max_wait {
        config.max_wait = millis_to_delta("PROPGRID_RETRY_WAIT_MAX_MS", millis)?;
    }
    if let Some(excluded) = excluded {
        config.excluded_endpoints = excluded
            .split(',')
            .map(str::trim)
            .filter(|pattern| !pattern.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(Some(config))
}

fn millis_to_delta(key: &str, millis: i64) -> ConfigResult<TimeDelta> {
    TimeDelta::try_milliseconds(millis).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{millis}ms is out of range"),
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ConfigError` if the file is missing, unreadable or malformed.
pub fn load_from_file(path: Option<PathBuf>) -> ConfigResult<SessionConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.display().to_string()));
            }
            p
        }
        None => probe_config_paths().ok_or(ConfigError::NoConfigFile)?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)?;
    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, by file extension
fn parse_config(contents: &str, path: &Path) -> ConfigResult<SessionConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => Ok(toml::from_str(contents)?),
        "json" => Ok(serde_json::from_str(contents)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
            dirs.push(exe_dir.join(".."));
        }
    }

    dirs.iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> ConfigResult<String> {
    std::env::var(key).map_err(|_| ConfigError::MissingVar(key.to_string()))
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue { key: key.to_string(), message: e.to_string() }),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 9] = [
        "PROPGRID_BASE_URL",
        "PROPGRID_USER_AGENT",
        "PROPGRID_REQUEST_LIMIT",
        "PROPGRID_HTTP_TRACING",
        "PROPGRID_TIMEOUT_SECS",
        "PROPGRID_RETRY_MAX",
        "PROPGRID_RETRY_WAIT_MIN_MS",
        "PROPGRID_RETRY_WAIT_MAX_MS",
        "PROPGRID_RETRY_EXCLUDED",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_PROPGRID_BOOL_YES", "yes");
        std::env::set_var("TEST_PROPGRID_BOOL_UPPER", "TRUE");
        std::env::set_var("TEST_PROPGRID_BOOL_OFF", "off");

        assert!(env_bool("TEST_PROPGRID_BOOL_YES", false));
        assert!(env_bool("TEST_PROPGRID_BOOL_UPPER", false));
        assert!(!env_bool("TEST_PROPGRID_BOOL_OFF", true));

        std::env::remove_var("TEST_PROPGRID_BOOL_MISSING");
        assert!(env_bool("TEST_PROPGRID_BOOL_MISSING", true));

        std::env::remove_var("TEST_PROPGRID_BOOL_YES");
        std::env::remove_var("TEST_PROPGRID_BOOL_UPPER");
        std::env::remove_var("TEST_PROPGRID_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PROPGRID_BASE_URL", "akab-host.luna.akamaiapis.net");
        std::env::set_var("PROPGRID_USER_AGENT", "deployer/2.1");
        std::env::set_var("PROPGRID_REQUEST_LIMIT", "20");
        std::env::set_var("PROPGRID_HTTP_TRACING", "true");
        std::env::set_var("PROPGRID_TIMEOUT_SECS", "45");
        std::env::set_var("PROPGRID_RETRY_MAX", "3");
        std::env::set_var("PROPGRID_RETRY_WAIT_MIN_MS", "500");
        std::env::set_var("PROPGRID_RETRY_WAIT_MAX_MS", "4000");
        std::env::set_var("PROPGRID_RETRY_EXCLUDED", "/papi/v1/search/*, /siteshield/*");

        let config = load_from_env().expect("config from env");
        clear_env();

        assert_eq!(config.base_url, "akab-host.luna.akamaiapis.net");
        assert_eq!(config.user_agent.as_deref(), Some("deployer/2.1"));
        assert_eq!(config.request_limit, 20);
        assert!(config.http_tracing);
        assert_eq!(config.timeout_secs, Some(45));

        let retry = config.retry.expect("retry configured");
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.min_wait, TimeDelta::milliseconds(500));
        assert_eq!(retry.max_wait, TimeDelta::milliseconds(4000));
        assert_eq!(retry.excluded_endpoints, vec!["/papi/v1/search/*", "/siteshield/*"]);
    }

    #[test]
    fn test_retries_disabled_without_retry_vars() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PROPGRID_BASE_URL", "https://api.example.net");
        let config = load_from_env().expect("config from env");
        clear_env();

        assert!(config.retry.is_none());
        assert_eq!(config.request_limit, 0);
        assert!(!config.http_tracing);
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "PROPGRID_BASE_URL"));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PROPGRID_BASE_URL", "https://api.example.net");
        std::env::set_var("PROPGRID_RETRY_MAX", "many");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "PROPGRID_RETRY_MAX"));
    }

    #[test]
    fn test_load_reports_invalid_env_instead_of_reading_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("PROPGRID_BASE_URL", "https://api.example.net");
        std::env::set_var("PROPGRID_RETRY_MAX", "abc");
        let result = load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "PROPGRID_RETRY_MAX"));
    }

    #[test]
    fn test_parse_toml_with_retry_section() {
        let contents = r#"
base_url = "https://api.example.net"
request_limit = 5

[retry]
max_retries = 2
min_wait_ms = 100
max_wait_ms = 800
excluded_endpoints = ["/papi/v1/properties/*/versions/*/rules"]
"#;
        let config = parse_config(contents, Path::new("propgrid.toml")).expect("valid toml");
        let retry = config.retry.expect("retry section");
        assert_eq!(config.request_limit, 5);
        assert_eq!(retry.max_retries, 2);
        assert_eq!(retry.max_wait, TimeDelta::milliseconds(800));
    }

    #[test]
    fn test_load_from_file_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().expect("temp file");
        file.write_all(br#"{"base_url": "api.example.net", "http_tracing": true}"#)
            .expect("write config");

        let config = load_from_file(Some(file.path().to_path_buf())).expect("valid json");
        assert_eq!(config.base_url, "api.example.net");
        assert!(config.http_tracing);
        assert!(config.retry.is_none());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = NamedTempFile::new().expect("temp file");
        let path = file.path().with_extension("yaml");
        std::fs::write(&path, "base_url: x").expect("write config");

        let err = load_from_file(Some(path.clone())).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "yaml"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/propgrid.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
