//! Completed call representation

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

/// Successful transport answer (status < 400) before it is typed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, headers: BTreeMap::new(), body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }
}

/// Transport (or mock) outcome flowing through the response interceptors
pub type Outcome = Result<RawResponse, ApiError>;

/// Normalized outcome of a call, success or failure.
///
/// Exactly one of `data` / `error` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(data: T, status: u16, message: Option<String>) -> Self {
        Self { data: Some(data), error: None, message, status: Some(status) }
    }

    pub fn failure(error: &ApiError) -> Self {
        Self { data: None, error: Some(error.envelope_message()), message: None, status: error.status() }
    }

    /// Failure produced outside the pipeline (e.g. by a service layered on
    /// top of the client).
    pub fn rejected(error: impl Into<String>, status: Option<u16>) -> Self {
        Self { data: None, error: Some(error.into()), message: None, status }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    /// Convert into a plain `Result`, keeping the status on both sides.
    ///
    /// # Errors
    /// Returns `(status, error)` for failed calls.
    pub fn into_result(self) -> Result<T, (Option<u16>, String)> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err((self.status, error)),
            (None, None) => Err((self.status, "Empty response".to_string())),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            data: self.data.map(f),
            error: self.error,
            message: self.message,
            status: self.status,
        }
    }
}

impl<T: DeserializeOwned> ResponseEnvelope<T> {
    /// Type the final pipeline outcome.
    ///
    /// The server payload is deserialized into `T` as a whole; a top-level
    /// string `message` field is lifted into the envelope.
    pub fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Ok(raw) => {
                let message = raw.body.get("message").and_then(Value::as_str).map(String::from);
                match serde_json::from_value::<T>(raw.body) {
                    Ok(data) => Self::success(data, raw.status, message),
                    Err(err) => Self::failure(&ApiError::Decode {
                        status: raw.status,
                        message: err.to_string(),
                    }),
                }
            }
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::constants::NETWORK_ERROR_MESSAGE;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Profile {
        id: String,
    }

    #[test]
    fn success_populates_data_only() {
        let envelope: ResponseEnvelope<Profile> =
            ResponseEnvelope::from_outcome(Ok(RawResponse::ok(json!({"id": "u1"}))));

        assert!(envelope.is_success());
        assert_eq!(envelope.data, Some(Profile { id: "u1".into() }));
        assert_eq!(envelope.error, None);
        assert_eq!(envelope.status, Some(200));
    }

    #[test]
    fn network_failure_populates_error_with_status_zero() {
        let envelope: ResponseEnvelope<Profile> =
            ResponseEnvelope::from_outcome(Err(ApiError::Network("refused".into())));

        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some(NETWORK_ERROR_MESSAGE));
        assert_eq!(envelope.status, Some(0));
    }

    #[test]
    fn shape_mismatch_becomes_decode_error() {
        let envelope: ResponseEnvelope<Profile> =
            ResponseEnvelope::from_outcome(Ok(RawResponse::ok(json!([1, 2, 3]))));

        assert!(envelope.data.is_none());
        assert!(envelope.error.unwrap().starts_with("Failed to parse response"));
        assert_eq!(envelope.status, Some(200));
    }

    #[test]
    fn unit_accepts_empty_body() {
        let envelope: ResponseEnvelope<()> =
            ResponseEnvelope::from_outcome(Ok(RawResponse::new(204, Value::Null)));
        assert!(envelope.is_success());
        assert_eq!(envelope.status, Some(204));
    }

    #[test]
    fn message_is_lifted_from_payload() {
        let envelope: ResponseEnvelope<Value> = ResponseEnvelope::from_outcome(Ok(
            RawResponse::ok(json!({"message": "Logged out"})),
        ));
        assert_eq!(envelope.message.as_deref(), Some("Logged out"));
    }

    #[test]
    fn into_result_keeps_status() {
        let envelope: ResponseEnvelope<Value> =
            ResponseEnvelope::failure(&ApiError::Server { status: 409, message: "taken".into() });
        assert_eq!(envelope.into_result(), Err((Some(409), "taken".to_string())));
    }
}
