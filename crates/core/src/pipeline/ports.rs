//! Port interfaces for the request pipeline
//!
//! These traits define the boundaries between the pipeline and the pieces
//! plugged into it: the network transport and the interceptors.

use async_trait::async_trait;
use meridian_domain::{ApiError, Outcome, RawResponse, RequestDescriptor};

/// Underlying network transport.
///
/// Implementations resolve any HTTP answer with status < 400 to `Ok`, map
/// status >= 400 to [`ApiError::from_status`] and report failures where no
/// response was received as [`ApiError::Network`] or [`ApiError::Timeout`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, ApiError>;
}

/// Transform applied to every outgoing request, in registration order.
///
/// The descriptor is mutated in place. Returning `Err` stops the chain: no
/// transport call is made and the error becomes the outcome handed to the
/// response interceptors.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Stable name used in diagnostics
    fn name(&self) -> &'static str;

    async fn on_request(&self, request: &mut RequestDescriptor) -> Result<(), ApiError>;
}

/// Transform applied to every outcome, in registration order.
///
/// The returned `Outcome` (success or error) is passed to the next
/// interceptor. Returning `Err` from the interceptor itself stops the chain
/// and that error becomes the final outcome.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Stable name used in diagnostics
    fn name(&self) -> &'static str;

    async fn on_response(
        &self,
        request: &RequestDescriptor,
        outcome: Outcome,
    ) -> Result<Outcome, ApiError>;
}
