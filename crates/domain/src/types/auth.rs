//! Credential types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access/refresh credentials treated as one atomic unit.
///
/// Either both tokens are present and non-empty or the pair does not exist.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into(), expires_at: None }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Both tokens carry a non-blank value.
    pub fn is_complete(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.refresh_token.trim().is_empty()
    }

    /// `true` if the access token is expired or will expire within the
    /// threshold. A pair without a known expiry never reports expired.
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at
        })
    }
}

// Tokens never reach logs through Debug.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authentication lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_requires_both_tokens() {
        assert!(TokenPair::new("a", "r").is_complete());
        assert!(!TokenPair::new("", "r").is_complete());
        assert!(!TokenPair::new("a", "   ").is_complete());
    }

    #[test]
    fn expiry_threshold() {
        let soon = TokenPair::new("a", "r").with_expiry(Utc::now() + chrono::Duration::seconds(60));
        assert!(soon.is_expired(300));
        assert!(!soon.is_expired(0));
        assert!(!TokenPair::new("a", "r").is_expired(300));
    }

    #[test]
    fn debug_redacts_tokens() {
        let rendered = format!("{:?}", TokenPair::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn deserializes_camel_case_payload() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"accessToken": "a", "refreshToken": "r"}"#).unwrap();
        assert_eq!(pair, TokenPair::new("a", "r"));
    }
}
