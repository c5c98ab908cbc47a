//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! client.

// Transport defaults
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;
pub const DEFAULT_MOCK_LATENCY_MS: u64 = 500;
pub const DEFAULT_KEYRING_SERVICE: &str = "com.meridian.app";

// Headers
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";
pub const HEADER_ACCEPT: &str = "Accept";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const BEARER_PREFIX: &str = "Bearer ";

// Envelope messages
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

// Remote endpoints
pub const AUTH_LOGIN_PATH: &str = "/auth/login";
pub const AUTH_REGISTER_PATH: &str = "/auth/register";
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh";
pub const AUTH_LOGOUT_PATH: &str = "/auth/logout";
pub const USER_PROFILE_PATH: &str = "/users/profile";
pub const INVESTMENTS_PATH: &str = "/investments";
pub const NOTIFICATIONS_PATH: &str = "/notifications";
pub const UPLOADS_PATH: &str = "/uploads";
