//! Correlation and latency interceptors

use async_trait::async_trait;
use meridian_domain::constants::HEADER_REQUEST_ID;
use meridian_domain::{ApiError, Outcome, RequestDescriptor};
use tracing::{debug, warn};

use super::ports::{RequestInterceptor, ResponseInterceptor};

/// Copies the pipeline-assigned request id into the `X-Request-Id` header.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestTagger;

#[async_trait]
impl RequestInterceptor for RequestTagger {
    fn name(&self) -> &'static str {
        "request_tagger"
    }

    async fn on_request(&self, request: &mut RequestDescriptor) -> Result<(), ApiError> {
        if let Some(request_id) = request.metadata().map(|meta| meta.request_id.clone()) {
            request.set_header(HEADER_REQUEST_ID, request_id);
        }
        Ok(())
    }
}

/// Stable label for an outcome error, suitable for logs and metrics.
pub fn error_label(error: &ApiError) -> &'static str {
    match error {
        ApiError::InvalidRequest(_) => "invalid_request",
        ApiError::Network(_) => "network",
        ApiError::Timeout(_) => "timeout",
        ApiError::Unauthorized { .. } => "unauthorized",
        ApiError::Server { .. } => "server",
        ApiError::Mock { .. } => "mock_handler",
        ApiError::Decode { .. } => "decode",
    }
}

/// Logs every completed call with its latency. Never alters the outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatencyLogger;

#[async_trait]
impl ResponseInterceptor for LatencyLogger {
    fn name(&self) -> &'static str {
        "latency_logger"
    }

    async fn on_response(
        &self,
        request: &RequestDescriptor,
        outcome: Outcome,
    ) -> Result<Outcome, ApiError> {
        let elapsed_ms = request.metadata().map_or(0, |meta| meta.elapsed_millis());
        let request_id = request.request_id();
        let method = request.method.as_str();
        let url = request.url.as_str();

        match &outcome {
            Ok(response) => {
                debug!(request_id, method, url, status = response.status, elapsed_ms, "request completed");
            }
            Err(err) => {
                warn!(
                    request_id,
                    method,
                    url,
                    status = err.status().unwrap_or_default(),
                    elapsed_ms,
                    error_type = error_label(err),
                    error = %err,
                    "request failed"
                );
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use meridian_domain::{HttpMethod, RawResponse, RequestMetadata};
    use serde_json::Value;

    use super::*;

    #[tokio::test]
    async fn tagger_copies_request_id_header() {
        let mut request = RequestDescriptor::new(HttpMethod::Get, "/users/profile");
        request.stamp(RequestMetadata { request_id: "req-1".into(), start_time_millis: 0 });

        RequestTagger.on_request(&mut request).await.unwrap();

        assert_eq!(request.header("x-request-id"), Some("req-1"));
    }

    #[tokio::test]
    async fn tagger_leaves_unstamped_requests_alone() {
        let mut request = RequestDescriptor::new(HttpMethod::Get, "/users/profile");
        RequestTagger.on_request(&mut request).await.unwrap();
        assert!(request.header(HEADER_REQUEST_ID).is_none());
    }

    #[tokio::test]
    async fn latency_logger_passes_outcomes_through() {
        let request = RequestDescriptor::new(HttpMethod::Get, "/users/profile");

        let ok = LatencyLogger.on_response(&request, Ok(RawResponse::ok(Value::Null))).await;
        assert_eq!(ok, Ok(Ok(RawResponse::ok(Value::Null))));

        let failure = ApiError::Network("refused".into());
        let err = LatencyLogger.on_response(&request, Err(failure.clone())).await;
        assert_eq!(err, Ok(Err(failure)));
    }

    #[test]
    fn error_labels_are_stable() {
        assert_eq!(error_label(&ApiError::Timeout(std::time::Duration::from_secs(1))), "timeout");
        assert_eq!(error_label(&ApiError::Unauthorized { message: String::new() }), "unauthorized");
        assert_eq!(error_label(&ApiError::Mock { status: 404, message: "x".into() }), "mock_handler");
    }
}
