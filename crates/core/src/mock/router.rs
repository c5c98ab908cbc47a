//! Mock router
//!
//! Evaluates the route table in registration order. The first matching rule
//! answers the request after the simulated latency; unmatched requests fall
//! through to the real transport.

use std::sync::Arc;
use std::time::Duration;

use meridian_domain::constants::DEFAULT_MOCK_LATENCY_MS;
use meridian_domain::{ApiError, HttpMethod, Outcome, RawResponse, RequestDescriptor};
use tracing::{debug, warn};
use url::Url;

use super::route::{inline_query, normalize_path, MockRequest, RouteHandler, RouteRule, UrlPattern};

/// Local route table standing in for the remote API
#[derive(Debug)]
pub struct MockRouter {
    enabled: bool,
    latency: Duration,
    base_path: Option<String>,
    rules: Vec<RouteRule>,
}

impl MockRouter {
    pub fn builder() -> MockRouterBuilder {
        MockRouterBuilder::default()
    }

    /// A router with no rules or a disabled router never matches.
    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.rules.is_empty()
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Index of the rule that would answer `method` + `url`.
    pub fn find(&self, method: HttpMethod, url: &str) -> Option<usize> {
        let path = self.path_of(url);
        self.rules.iter().position(|rule| rule.matches(method, &path))
    }

    /// Answer the request locally if a rule matches.
    ///
    /// Returns `None` when mocking is disabled or no rule matches; the
    /// request then goes to the transport unchanged.
    pub async fn route(&self, request: &RequestDescriptor) -> Option<Outcome> {
        if !self.is_enabled() {
            return None;
        }

        let path = self.path_of(&request.url);
        let Some((index, rule)) =
            self.rules.iter().enumerate().find(|(_, rule)| rule.matches(request.method, &path))
        else {
            debug!(request_id = request.request_id(), path = %path, "no mock route matched, using transport");
            return None;
        };

        debug!(
            request_id = request.request_id(),
            rule_index = index,
            rule = ?rule,
            latency_ms = u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX),
            "mock route matched"
        );

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let query = inline_query(&request.url);
        let mock_request = MockRequest {
            descriptor: request,
            path: &path,
            param: rule.pattern.capture(&path),
            inline_query: &query,
        };

        let outcome = match rule.handler.handle(mock_request).await {
            Ok(reply) if reply.status >= 400 => {
                Err(ApiError::from_status(reply.status, &reply.body))
            }
            Ok(reply) => Ok(RawResponse::new(reply.status, reply.body)),
            Err(failure) => {
                warn!(
                    request_id = request.request_id(),
                    status = failure.status,
                    message = %failure.message,
                    "mock handler failed"
                );
                Err(failure.into())
            }
        };

        Some(outcome)
    }

    /// Path relative to the API base, e.g. `/users/profile` for
    /// `http://localhost:3000/api/users/profile`.
    fn path_of(&self, url: &str) -> String {
        let path = normalize_path(url);
        match &self.base_path {
            Some(base) => match path.strip_prefix(base.as_str()) {
                Some(rest) if rest.is_empty() => "/".to_string(),
                Some(rest) if rest.starts_with('/') => rest.to_string(),
                _ => path,
            },
            None => path,
        }
    }
}

/// Builder for [`MockRouter`]
#[derive(Debug)]
pub struct MockRouterBuilder {
    enabled: bool,
    latency: Duration,
    base_path: Option<String>,
    rules: Vec<RouteRule>,
}

impl Default for MockRouterBuilder {
    fn default() -> Self {
        Self {
            enabled: true,
            latency: Duration::from_millis(DEFAULT_MOCK_LATENCY_MS),
            base_path: None,
            rules: Vec::new(),
        }
    }
}

impl MockRouterBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Strip the path of the API base URL before matching, so absolute
    /// request URLs hit the same rules as relative ones.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_path = Url::parse(base_url)
            .ok()
            .map(|url| url.path().trim_end_matches('/').to_string())
            .filter(|path| !path.is_empty());
        self
    }

    pub fn route(
        mut self,
        method: HttpMethod,
        pattern: UrlPattern,
        handler: Arc<dyn RouteHandler>,
    ) -> Self {
        self.rules.push(RouteRule::new(method, pattern, handler));
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = RouteRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> MockRouter {
        MockRouter {
            enabled: self.enabled,
            latency: self.latency,
            base_path: self.base_path,
            rules: self.rules,
        }
    }
}
