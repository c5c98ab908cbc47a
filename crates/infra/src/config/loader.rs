//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the base URL is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `MERIDIAN_API_BASE_URL`: API base URL (required)
//! - `MERIDIAN_API_TIMEOUT_SECS`: Request timeout in seconds
//! - `MERIDIAN_API_MAX_ATTEMPTS`: Transport attempts per request
//! - `MERIDIAN_API_USER_AGENT`: User agent sent with every request
//! - `MERIDIAN_MOCK_ENABLED`: Answer requests from the mock backend (true/false)
//! - `MERIDIAN_MOCK_LATENCY_MS`: Simulated mock latency in milliseconds
//! - `MERIDIAN_TOKEN_STORE`: `memory` or `keyring`
//! - `MERIDIAN_KEYRING_SERVICE`: Keychain service name
//! - `MERIDIAN_LOG_LEVEL`: Default tracing level
//! - `MERIDIAN_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./meridian.toml`, `./meridian.json`, `./config.toml`, `./config.json`
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use meridian_domain::{
    ApiConfig, Config, LoggingConfig, MeridianError, MockConfig, Result, StorageConfig,
    TokenStoreBackend,
};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["meridian.toml", "meridian.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to a config file.
///
/// # Errors
/// Returns `MeridianError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `MERIDIAN_API_BASE_URL` is required; every other value falls back to
/// its default.
///
/// # Errors
/// Returns `MeridianError::Config` if the base URL is missing or a value is
/// malformed.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let config = Config {
        api: ApiConfig {
            base_url: env_var("MERIDIAN_API_BASE_URL")?,
            timeout_seconds: env_parse("MERIDIAN_API_TIMEOUT_SECS", defaults.api.timeout_seconds)?,
            max_attempts: env_parse("MERIDIAN_API_MAX_ATTEMPTS", defaults.api.max_attempts)?,
            user_agent: env_optional("MERIDIAN_API_USER_AGENT"),
        },
        mock: MockConfig {
            enabled: env_bool("MERIDIAN_MOCK_ENABLED", defaults.mock.enabled),
            latency_ms: env_parse("MERIDIAN_MOCK_LATENCY_MS", defaults.mock.latency_ms)?,
        },
        storage: StorageConfig {
            backend: match env_optional("MERIDIAN_TOKEN_STORE") {
                Some(value) => parse_backend(&value)?,
                None => defaults.storage.backend,
            },
            service_name: env_optional("MERIDIAN_KEYRING_SERVICE")
                .unwrap_or(defaults.storage.service_name),
        },
        logging: LoggingConfig {
            level: env_optional("MERIDIAN_LOG_LEVEL").unwrap_or(defaults.logging.level),
            json: env_bool("MERIDIAN_LOG_JSON", defaults.logging.json),
        },
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MeridianError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MeridianError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MeridianError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MeridianError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| MeridianError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MeridianError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(MeridianError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.is_file())
}

/// Config file names in `dir`, its parent and its grandparent.
fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    dir.ancestors()
        .take(3)
        .flat_map(|base| CONFIG_FILE_NAMES.iter().map(move |name| base.join(name)))
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `MeridianError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| {
        MeridianError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Non-blank environment variable, trimmed
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse an optional environment variable, falling back to `default`
///
/// # Errors
/// Returns `MeridianError::Config` if the variable is set but malformed.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| MeridianError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn parse_backend(value: &str) -> Result<TokenStoreBackend> {
    match value.to_ascii_lowercase().as_str() {
        "memory" => Ok(TokenStoreBackend::Memory),
        "keyring" | "keychain" => Ok(TokenStoreBackend::Keyring),
        other => Err(MeridianError::Config(format!("Unsupported token store backend: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    const ENV_KEYS: [&str; 10] = [
        "MERIDIAN_API_BASE_URL",
        "MERIDIAN_API_TIMEOUT_SECS",
        "MERIDIAN_API_MAX_ATTEMPTS",
        "MERIDIAN_API_USER_AGENT",
        "MERIDIAN_MOCK_ENABLED",
        "MERIDIAN_MOCK_LATENCY_MS",
        "MERIDIAN_TOKEN_STORE",
        "MERIDIAN_KEYRING_SERVICE",
        "MERIDIAN_LOG_LEVEL",
        "MERIDIAN_LOG_JSON",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn write_temp(contents: &str, extension: &str) -> (NamedTempFile, PathBuf) {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        (temp_file, path)
    }

    #[test]
    #[serial]
    fn test_env_bool_parsing() {
        std::env::set_var("TEST_BOOL_TRUE_YES", "yes");
        std::env::set_var("TEST_BOOL_TRUE_UPPER", "TRUE");
        std::env::set_var("TEST_BOOL_FALSE_OFF", "off");

        assert!(env_bool("TEST_BOOL_TRUE_YES", false));
        assert!(env_bool("TEST_BOOL_TRUE_UPPER", false));
        assert!(!env_bool("TEST_BOOL_FALSE_OFF", true));

        std::env::remove_var("TEST_BOOL_MISSING");
        assert!(env_bool("TEST_BOOL_MISSING", true));

        std::env::remove_var("TEST_BOOL_TRUE_YES");
        std::env::remove_var("TEST_BOOL_TRUE_UPPER");
        std::env::remove_var("TEST_BOOL_FALSE_OFF");
    }

    #[test]
    #[serial]
    fn test_load_from_env_all_vars_set() {
        clear_env();
        std::env::set_var("MERIDIAN_API_BASE_URL", "https://api.meridian.test/v1");
        std::env::set_var("MERIDIAN_API_TIMEOUT_SECS", "10");
        std::env::set_var("MERIDIAN_API_MAX_ATTEMPTS", "3");
        std::env::set_var("MERIDIAN_MOCK_ENABLED", "true");
        std::env::set_var("MERIDIAN_MOCK_LATENCY_MS", "0");
        std::env::set_var("MERIDIAN_TOKEN_STORE", "keyring");
        std::env::set_var("MERIDIAN_KEYRING_SERVICE", "com.meridian.test");
        std::env::set_var("MERIDIAN_LOG_LEVEL", "debug");
        std::env::set_var("MERIDIAN_LOG_JSON", "1");

        let config = load_from_env().unwrap();

        assert_eq!(config.api.base_url, "https://api.meridian.test/v1");
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.api.max_attempts, 3);
        assert!(config.mock.enabled);
        assert_eq!(config.mock.latency_ms, 0);
        assert_eq!(config.storage.backend, TokenStoreBackend::Keyring);
        assert_eq!(config.storage.service_name, "com.meridian.test");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_uses_defaults() {
        clear_env();
        std::env::set_var("MERIDIAN_API_BASE_URL", "http://localhost:3000/api");

        let config = load_from_env().unwrap();

        assert_eq!(config, Config::default());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_missing_base_url() {
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, MeridianError::Config(msg) if msg.contains("MERIDIAN_API_BASE_URL")));
    }

    #[test]
    #[serial]
    fn test_load_from_env_invalid_number() {
        clear_env();
        std::env::set_var("MERIDIAN_API_BASE_URL", "http://localhost:3000/api");
        std::env::set_var("MERIDIAN_API_TIMEOUT_SECS", "soon");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, MeridianError::Config(msg) if msg.contains("MERIDIAN_API_TIMEOUT_SECS")));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_from_env_rejects_invalid_values() {
        clear_env();
        std::env::set_var("MERIDIAN_API_BASE_URL", "localhost:3000");
        assert!(load_from_env().is_err());

        std::env::set_var("MERIDIAN_API_BASE_URL", "http://localhost:3000/api");
        std::env::set_var("MERIDIAN_API_MAX_ATTEMPTS", "0");
        assert!(load_from_env().is_err());

        std::env::set_var("MERIDIAN_API_MAX_ATTEMPTS", "1");
        std::env::set_var("MERIDIAN_TOKEN_STORE", "sqlite");
        assert!(load_from_env().is_err());

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let (_temp, path) = write_temp(
            r#"
[api]
base_url = "https://api.meridian.test"
timeout_seconds = 5

[mock]
enabled = true
latency_ms = 0
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.api.base_url, "https://api.meridian.test");
        assert_eq!(config.api.timeout_seconds, 5);
        assert!(config.mock.enabled);
        assert_eq!(config.storage.backend, TokenStoreBackend::Memory);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_json() {
        let (_temp, path) = write_temp(
            r#"{
                "api": { "base_url": "http://localhost:4000/api" },
                "storage": { "backend": "keyring" },
                "logging": { "level": "warn", "json": true }
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:4000/api");
        assert_eq!(config.storage.backend, TokenStoreBackend::Keyring);
        assert_eq!(config.logging.level, "warn");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_validates() {
        let (_temp, path) = write_temp("[api]\nbase_url = \"\"\n", "toml");

        let err = load_from_file(Some(path.clone())).unwrap_err();
        assert!(matches!(err, MeridianError::Config(_)));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/meridian.toml")));
        assert!(matches!(result, Err(MeridianError::Config(_))));
    }

    #[test]
    fn test_parse_config_invalid_formats() {
        let err = parse_config("[api", Path::new("meridian.toml")).unwrap_err();
        assert!(matches!(err, MeridianError::Config(msg) if msg.starts_with("Invalid TOML")));

        let err = parse_config(r#"{ "api": "#, Path::new("meridian.json")).unwrap_err();
        assert!(matches!(err, MeridianError::Config(msg) if msg.starts_with("Invalid JSON")));

        assert!(parse_config("api: {}", Path::new("meridian.yaml")).is_err());
    }

    #[test]
    fn test_candidates_cover_parents() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        let candidates = candidates_in(&nested);

        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], nested.join("meridian.toml"));
        assert!(candidates.contains(&dir.path().join("config.json")));
    }
}
