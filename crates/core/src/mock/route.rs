//! Route table primitives
//!
//! A rule pairs an HTTP method and a typed [`UrlPattern`] with a
//! [`RouteHandler`]. Patterns are matched against a normalized path:
//! absolute URLs are reduced to their path, query string and fragment are
//! dropped, and a trailing slash is ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use meridian_domain::constants::{BEARER_PREFIX, HEADER_AUTHORIZATION};
use meridian_domain::{ApiError, HttpMethod, RequestBody, RequestDescriptor};
use serde_json::Value;
use url::Url;

/// Structured URL matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// Path equals the template
    Exact(String),
    /// `{prefix}{id}` where `id` is a single non-empty segment
    Param { prefix: String },
    /// `{prefix}{id}{boundary}`, e.g. `/investments/{id}/register`
    Scoped { prefix: String, boundary: String },
    /// Any path starting with the template
    Prefix(String),
}

impl UrlPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    pub fn param(prefix: impl Into<String>) -> Self {
        Self::Param { prefix: prefix.into() }
    }

    pub fn scoped(prefix: impl Into<String>, boundary: impl Into<String>) -> Self {
        Self::Scoped { prefix: prefix.into(), boundary: boundary.into() }
    }

    pub fn prefix(path: impl Into<String>) -> Self {
        Self::Prefix(path.into())
    }

    /// Whether a normalized path matches.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(template) => path == template,
            Self::Prefix(template) => path.starts_with(template.as_str()),
            Self::Param { .. } | Self::Scoped { .. } => self.capture(path).is_some(),
        }
    }

    /// The path parameter captured by `Param` and `Scoped` patterns.
    pub fn capture<'a>(&self, path: &'a str) -> Option<&'a str> {
        let segment = match self {
            Self::Param { prefix } => path.strip_prefix(prefix.as_str())?,
            Self::Scoped { prefix, boundary } => {
                path.strip_prefix(prefix.as_str())?.strip_suffix(boundary.as_str())?
            }
            Self::Exact(_) | Self::Prefix(_) => return None,
        };

        (!segment.is_empty() && !segment.contains('/')).then_some(segment)
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(path) => f.write_str(path),
            Self::Param { prefix } => write!(f, "{prefix}{{id}}"),
            Self::Scoped { prefix, boundary } => write!(f, "{prefix}{{id}}{boundary}"),
            Self::Prefix(path) => write!(f, "{path}*"),
        }
    }
}

/// Reduce a request URL to the path the route table matches against.
pub fn normalize_path(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Query pairs written into the URL itself, e.g. `/investments?category=energy`.
///
/// A key repeated in the query string collects its values into an array.
pub fn inline_query(url: &str) -> BTreeMap<String, Value> {
    let query = match Url::parse(url) {
        Ok(parsed) if parsed.has_host() => parsed.query().map(str::to_string),
        _ => url
            .split('#')
            .next()
            .and_then(|rest| rest.split_once('?'))
            .map(|(_, query)| query.to_string()),
    };

    let mut pairs = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        let value = Value::String(value.into_owned());
        match pairs.remove(key.as_ref()) {
            None => {
                pairs.insert(key.into_owned(), value);
            }
            Some(Value::Array(mut values)) => {
                values.push(value);
                pairs.insert(key.into_owned(), Value::Array(values));
            }
            Some(first) => {
                pairs.insert(key.into_owned(), Value::Array(vec![first, value]));
            }
        }
    }
    pairs
}

/// Request as seen by a mock handler
#[derive(Debug, Clone, Copy)]
pub struct MockRequest<'a> {
    pub descriptor: &'a RequestDescriptor,
    /// Normalized path the rule matched
    pub path: &'a str,
    /// Segment captured by a `Param`/`Scoped` pattern
    pub param: Option<&'a str>,
    /// Query pairs parsed from the request URL
    pub inline_query: &'a BTreeMap<String, Value>,
}

impl<'a> MockRequest<'a> {
    pub fn json(&self) -> Option<&'a Value> {
        self.descriptor.body.as_json()
    }

    /// String field of the JSON body; blank values read as absent.
    pub fn field(&self, name: &str) -> Option<&'a str> {
        self.json()
            .and_then(|body| body.get(name))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn bearer_token(&self) -> Option<&'a str> {
        self.descriptor
            .header(HEADER_AUTHORIZATION)
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Query parameter by name. Explicit `params` take precedence over pairs
    /// written into the URL, matching what the transport sends.
    pub fn query(&self, name: &str) -> Option<&'a Value> {
        self.descriptor.params.get(name).or_else(|| self.inline_query.get(name))
    }

    pub fn body(&self) -> &'a RequestBody {
        &self.descriptor.body
    }
}

/// Fabricated success payload
#[derive(Debug, Clone, PartialEq)]
pub struct MockReply {
    pub status: u16,
    pub body: Value,
}

impl MockReply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }
}

/// Handler failure, surfaced like a server error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFailure {
    pub status: u16,
    pub message: String,
}

impl MockFailure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl From<MockFailure> for ApiError {
    /// 401 keeps its meaning so the auth layer reacts to mocked failures
    /// exactly as to real ones.
    fn from(failure: MockFailure) -> Self {
        if failure.status == 401 {
            Self::Unauthorized { message: failure.message }
        } else {
            Self::Mock { status: failure.status, message: failure.message }
        }
    }
}

/// Produces the fabricated response for a matched rule
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: MockRequest<'_>) -> Result<MockReply, MockFailure>;
}

/// Adapter turning a plain closure into a [`RouteHandler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> RouteHandler for FnHandler<F>
where
    F: Fn(MockRequest<'_>) -> Result<MockReply, MockFailure> + Send + Sync,
{
    async fn handle(&self, request: MockRequest<'_>) -> Result<MockReply, MockFailure> {
        (self.0)(request)
    }
}

/// Wrap a synchronous closure as a shareable handler.
pub fn handler_fn<F>(handler: F) -> Arc<dyn RouteHandler>
where
    F: Fn(MockRequest<'_>) -> Result<MockReply, MockFailure> + Send + Sync + 'static,
{
    Arc::new(FnHandler(handler))
}

/// One entry of the route table
#[derive(Clone)]
pub struct RouteRule {
    pub method: HttpMethod,
    pub pattern: UrlPattern,
    pub handler: Arc<dyn RouteHandler>,
}

impl RouteRule {
    pub fn new(method: HttpMethod, pattern: UrlPattern, handler: Arc<dyn RouteHandler>) -> Self {
        Self { method, pattern, handler }
    }

    pub fn matches(&self, method: HttpMethod, path: &str) -> bool {
        self.method == method && self.pattern.matches(path)
    }
}

impl fmt::Debug for RouteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}
