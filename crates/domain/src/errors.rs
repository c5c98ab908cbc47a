//! Error types used throughout the client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::constants::NETWORK_ERROR_MESSAGE;

/// Main error type for non-request operations (config, storage, wiring)
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MeridianError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Meridian operations
pub type Result<T> = std::result::Result<T, MeridianError>;

/// Categories of request failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCategory {
    /// Rejected locally, never reached the transport
    LocalPrecondition,
    /// Transport unreachable or timed out (status 0)
    Connectivity,
    /// Server answered 401
    Authentication,
    /// Server answered >= 400 (other than 401)
    Server,
    /// A mock route handler failed
    MockHandler,
}

impl ApiErrorCategory {
    /// Stable label suitable for logs
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalPrecondition => "local_precondition",
            Self::Connectivity => "connectivity",
            Self::Authentication => "authentication",
            Self::Server => "server",
            Self::MockHandler => "mock_handler",
        }
    }
}

/// Outcome error of a single request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{message}")]
    Mock { status: u16, message: String },

    #[error("Failed to parse response: {message}")]
    Decode { status: u16, message: String },
}

impl ApiError {
    /// Build the error for a server (or simulated server) status >= 400.
    ///
    /// 401 always becomes [`ApiError::Unauthorized`] so the auth layer sees
    /// it regardless of where it came from.
    pub fn from_status(status: u16, body: &Value) -> Self {
        let message = extract_server_message(body)
            .unwrap_or_else(|| format!("Request failed with status code {status}"));

        if status == 401 {
            Self::Unauthorized { message }
        } else {
            Self::Server { status, message }
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::InvalidRequest(_) => ApiErrorCategory::LocalPrecondition,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Connectivity,
            Self::Unauthorized { .. } => ApiErrorCategory::Authentication,
            Self::Server { .. } | Self::Decode { .. } => ApiErrorCategory::Server,
            Self::Mock { .. } => ApiErrorCategory::MockHandler,
        }
    }

    /// Transport status code; `0` for connectivity failures, `None` when the
    /// request never left the client.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidRequest(_) => None,
            Self::Network(_) | Self::Timeout(_) => Some(0),
            Self::Unauthorized { .. } => Some(401),
            Self::Server { status, .. }
            | Self::Mock { status, .. }
            | Self::Decode { status, .. } => Some(*status),
        }
    }

    /// Whether this outcome should invalidate local credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The string callers see in `ResponseEnvelope::error`. Never empty.
    pub fn envelope_message(&self) -> String {
        match self {
            Self::Network(_) | Self::Timeout(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Self::InvalidRequest(message) if message.is_empty() => "Invalid request".to_string(),
            Self::Unauthorized { message }
            | Self::Server { message, .. }
            | Self::Mock { message, .. }
                if message.is_empty() =>
            {
                format!("Request failed with status code {}", self.status().unwrap_or_default())
            }
            Self::InvalidRequest(message)
            | Self::Unauthorized { message }
            | Self::Server { message, .. }
            | Self::Mock { message, .. } => message.clone(),
            Self::Decode { .. } => self.to_string(),
        }
    }
}

/// Pull a human readable message out of a server error payload.
///
/// Recognised shapes: `{"error": "..."}`, `{"message": "..."}`,
/// `{"error": {"message": "..."}}` and a bare string body.
pub fn extract_server_message(body: &Value) -> Option<String> {
    let candidate = match body {
        Value::String(text) => Some(text.as_str()),
        Value::Object(map) => map
            .get("error")
            .and_then(Value::as_str)
            .or_else(|| map.get("message").and_then(Value::as_str))
            .or_else(|| {
                map.get("error").and_then(|inner| inner.get("message")).and_then(Value::as_str)
            }),
        _ => None,
    };

    candidate.map(str::trim).filter(|text| !text.is_empty()).map(ToString::to_string)
}
