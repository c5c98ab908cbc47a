//! Outgoing request representation

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ApiError;

/// HTTP verb of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    /// Case-insensitive: `"get"`, `"Get"` and `"GET"` are the same verb.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(ApiError::InvalidRequest(format!("unsupported HTTP method '{other}'"))),
        }
    }
}

/// Correlation data stamped on a descriptor by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub request_id: String,
    pub start_time_millis: i64,
}

impl RequestMetadata {
    /// Fresh metadata for a request starting now.
    pub fn now() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            start_time_millis: Utc::now().timestamp_millis(),
        }
    }

    /// Milliseconds since the request was stamped.
    pub fn elapsed_millis(&self) -> i64 {
        (Utc::now().timestamp_millis() - self.start_time_millis).max(0)
    }
}

/// One part of a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartPart {
    Text { name: String, value: String },
    File { name: String, file_name: String, content_type: Option<String>, bytes: Vec<u8> },
}

impl MultipartPart {
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Multipart form body used by uploads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text { name: name.into(), value: value.into() });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(MultipartPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            bytes,
        });
        self
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Request payload
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartBody),
}

impl RequestBody {
    /// JSON payload, if any.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Per-call options supplied by callers of the client surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, Value>,
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Normalized representation of an outgoing request.
///
/// Created per call and dropped once the call resolves. `metadata` is
/// stamped by the pipeline, never by callers, and cannot be replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
    pub params: BTreeMap<String, Value>,
    pub timeout: Option<Duration>,
    metadata: Option<RequestMetadata>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: RequestBody::Empty,
            params: BTreeMap::new(),
            timeout: None,
            metadata: None,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Merge caller supplied options into the descriptor.
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        for (name, value) in config.headers {
            self.set_header(&name, value);
        }
        self.params.extend(config.params);
        if config.timeout.is_some() {
            self.timeout = config.timeout;
        }
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Insert or replace a header, keeping a single entry per name
    /// regardless of case.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    }

    pub fn metadata(&self) -> Option<&RequestMetadata> {
        self.metadata.as_ref()
    }

    /// Attach correlation metadata. Returns `false` (and keeps the existing
    /// value) if the descriptor was already stamped.
    pub fn stamp(&mut self, metadata: RequestMetadata) -> bool {
        if self.metadata.is_some() {
            return false;
        }
        self.metadata = Some(metadata);
        true
    }

    /// Request id from the metadata, or `"-"` before stamping.
    pub fn request_id(&self) -> &str {
        self.metadata.as_ref().map_or("-", |meta| meta.request_id.as_str())
    }

    /// Local precondition check run before anything else.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidRequest` for an empty URL or a multipart
    /// body without parts.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.url.trim().is_empty() {
            return Err(ApiError::InvalidRequest("url must not be empty".to_string()));
        }
        if let RequestBody::Multipart(form) = &self.body {
            if form.is_empty() {
                return Err(ApiError::InvalidRequest(
                    "multipart body must contain at least one part".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Post".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!(" DELETE ".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("TRACE".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn metadata_is_set_once() {
        let mut descriptor = RequestDescriptor::new(HttpMethod::Get, "/users/profile");
        let first = RequestMetadata { request_id: "a".into(), start_time_millis: 1 };
        let second = RequestMetadata { request_id: "b".into(), start_time_millis: 2 };

        assert!(descriptor.stamp(first.clone()));
        assert!(!descriptor.stamp(second));
        assert_eq!(descriptor.metadata(), Some(&first));
        assert_eq!(descriptor.request_id(), "a");
    }

    #[test]
    fn headers_are_case_insensitive() {
        let mut descriptor = RequestDescriptor::new(HttpMethod::Get, "/x");
        descriptor.set_header("authorization", "Bearer one");
        descriptor.set_header("Authorization", "Bearer two");

        assert_eq!(descriptor.headers.len(), 1);
        assert_eq!(descriptor.header("AUTHORIZATION"), Some("Bearer two"));

        descriptor.remove_header("AuThOrIzAtIoN");
        assert!(descriptor.header("authorization").is_none());
    }

    #[test]
    fn config_merges_into_descriptor() {
        let config = RequestConfig::default()
            .header("X-Trace", "1")
            .param("page", 2)
            .timeout(Duration::from_secs(5));
        let descriptor = RequestDescriptor::new(HttpMethod::Get, "/investments")
            .with_body(RequestBody::Json(json!({"a": 1})))
            .with_config(config);

        assert_eq!(descriptor.header("x-trace"), Some("1"));
        assert_eq!(descriptor.params.get("page"), Some(&json!(2)));
        assert_eq!(descriptor.timeout, Some(Duration::from_secs(5)));
        assert_eq!(descriptor.body.as_json(), Some(&json!({"a": 1})));
    }

    #[test]
    fn validate_rejects_empty_url_and_empty_upload() {
        assert!(RequestDescriptor::new(HttpMethod::Get, "  ").validate().is_err());

        let upload = RequestDescriptor::new(HttpMethod::Post, "/uploads")
            .with_body(RequestBody::Multipart(MultipartBody::new()));
        assert!(upload.validate().is_err());

        let upload = RequestDescriptor::new(HttpMethod::Post, "/uploads").with_body(
            RequestBody::Multipart(MultipartBody::new().text("kind", "avatar")),
        );
        assert!(upload.validate().is_ok());
    }
}
