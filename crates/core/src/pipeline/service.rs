//! Request pipeline - ordered interceptor chains around a transport

use std::sync::Arc;

use meridian_domain::{ApiError, Outcome, RequestDescriptor, RequestMetadata, ResponseEnvelope};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::ports::{RequestInterceptor, ResponseInterceptor, Transport};
use crate::mock::MockRouter;

/// Runs every call through request interceptors, the mock router or the
/// transport, then response interceptors.
///
/// The chains are fixed at construction; use [`RequestPipeline::builder`].
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    mock_router: Option<Arc<MockRouter>>,
}

impl RequestPipeline {
    /// Create a builder for fluent configuration
    pub fn builder(transport: Arc<dyn Transport>) -> RequestPipelineBuilder {
        RequestPipelineBuilder {
            transport,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            mock_router: None,
        }
    }

    /// Dispatch a request and type the outcome.
    ///
    /// Never fails: every outcome is folded into the envelope.
    pub async fn dispatch<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> ResponseEnvelope<T> {
        ResponseEnvelope::from_outcome(self.execute(request).await)
    }

    /// Dispatch a request and return the untyped outcome.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn execute(&self, mut request: RequestDescriptor) -> Outcome {
        request.stamp(RequestMetadata::now());

        let outcome = match self.prepare(&mut request).await {
            Ok(()) => self.send(&request).await,
            Err(err) => {
                warn!(request_id = request.request_id(), error = %err, "request rejected before transport");
                Err(err)
            }
        };

        self.finish(&request, outcome).await
    }

    /// Surface a failure detected while the caller's request was being
    /// built. The transport is never called; response interceptors still
    /// see the error.
    pub async fn reject(&self, mut request: RequestDescriptor, error: ApiError) -> Outcome {
        request.stamp(RequestMetadata::now());
        warn!(request_id = request.request_id(), error = %error, "request rejected before transport");
        self.finish(&request, Err(error)).await
    }

    /// Whether calls may be answered by the mock router
    pub fn is_mocked(&self) -> bool {
        self.mock_router.as_ref().is_some_and(|router| router.is_enabled())
    }

    async fn prepare(&self, request: &mut RequestDescriptor) -> Result<(), ApiError> {
        request.validate()?;

        for interceptor in &self.request_interceptors {
            if let Err(err) = interceptor.on_request(request).await {
                debug!(
                    request_id = request.request_id(),
                    interceptor = interceptor.name(),
                    error = %err,
                    "request interceptor failed"
                );
                return Err(err);
            }
        }

        Ok(())
    }

    async fn send(&self, request: &RequestDescriptor) -> Outcome {
        if let Some(router) = &self.mock_router {
            if let Some(outcome) = router.route(request).await {
                return outcome;
            }
        }

        self.transport.send(request).await
    }

    async fn finish(&self, request: &RequestDescriptor, mut outcome: Outcome) -> Outcome {
        for interceptor in &self.response_interceptors {
            match interceptor.on_response(request, outcome).await {
                Ok(next) => outcome = next,
                Err(err) => {
                    debug!(
                        request_id = request.request_id(),
                        interceptor = interceptor.name(),
                        error = %err,
                        "response interceptor failed"
                    );
                    return Err(err);
                }
            }
        }

        outcome
    }
}

/// Builder for [`RequestPipeline`]
pub struct RequestPipelineBuilder {
    transport: Arc<dyn Transport>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    mock_router: Option<Arc<MockRouter>>,
}

impl RequestPipelineBuilder {
    /// Append a request interceptor; runs after those already registered.
    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Append a response interceptor; runs after those already registered.
    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Answer matching requests locally instead of using the transport
    pub fn mock_router(mut self, router: Arc<MockRouter>) -> Self {
        self.mock_router = Some(router);
        self
    }

    pub fn build(self) -> RequestPipeline {
        let request_chain: Vec<&str> =
            self.request_interceptors.iter().map(|interceptor| interceptor.name()).collect();
        let response_chain: Vec<&str> =
            self.response_interceptors.iter().map(|interceptor| interceptor.name()).collect();
        let mocked = self.mock_router.as_ref().is_some_and(|router| router.is_enabled());

        info!(?request_chain, ?response_chain, mocked, "request pipeline assembled");

        RequestPipeline {
            transport: self.transport,
            request_interceptors: self.request_interceptors,
            response_interceptors: self.response_interceptors,
            mock_router: self.mock_router,
        }
    }
}
