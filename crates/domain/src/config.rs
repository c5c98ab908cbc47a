//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_KEYRING_SERVICE, DEFAULT_MAX_ATTEMPTS, DEFAULT_MOCK_LATENCY_MS,
    DEFAULT_TIMEOUT_SECS,
};
use crate::errors::{MeridianError, Result};

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Total transport attempts (initial try + retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Offline mock backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

/// Where credentials are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStoreBackend {
    #[default]
    Memory,
    Keyring,
}

/// Token store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: TokenStoreBackend,
    #[serde(default = "default_keyring_service")]
    pub service_name: String,
}

/// Tracing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_latency_ms() -> u64 {
    DEFAULT_MOCK_LATENCY_MS
}

fn default_keyring_service() -> String {
    DEFAULT_KEYRING_SERVICE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            user_agent: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self { enabled: false, latency_ms: DEFAULT_MOCK_LATENCY_MS }
    }
}

impl MockConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: TokenStoreBackend::Memory, service_name: default_keyring_service() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

impl Config {
    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    /// Returns `MeridianError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(MeridianError::Config("api.base_url must not be empty".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(MeridianError::Config(format!(
                "api.base_url must be an http(s) URL, got '{base_url}'"
            )));
        }
        if self.api.timeout_seconds == 0 {
            return Err(MeridianError::Config("api.timeout_seconds must be > 0".to_string()));
        }
        if self.api.max_attempts == 0 {
            return Err(MeridianError::Config("api.max_attempts must be > 0".to_string()));
        }
        if self.storage.backend == TokenStoreBackend::Keyring
            && self.storage.service_name.trim().is_empty()
        {
            return Err(MeridianError::Config(
                "storage.service_name is required for the keyring backend".to_string(),
            ));
        }
        Ok(())
    }
}
