//! # Meridian Core
//!
//! Request pipeline, auth lifecycle and mock routing. No infrastructure
//! dependencies.
//!
//! This crate contains:
//! - Port interfaces (`Transport`, `TokenStore`, interceptors)
//! - The request pipeline and the typed client façade
//! - The auth lifecycle manager and session service
//! - The mock routing engine and its simulated backend
//!
//! ## Architecture Principles
//! - Only depends on `meridian-domain`
//! - No HTTP client or keychain code; adapters live in `meridian-infra`
//! - All external dependencies via traits

pub mod auth;
pub mod client;
pub mod mock;
pub mod pipeline;

pub use auth::{
    AuthError, AuthManager, AuthPayload, Credentials, Registration, SessionService, TokenStore,
};
pub use client::ApiClient;
pub use mock::{default_routes, Endpoint, MockDataset, MockRouter, RouteRule, UrlPattern};
pub use pipeline::{
    error_label, LatencyLogger, RequestInterceptor, RequestPipeline, RequestPipelineBuilder, RequestTagger,
    ResponseInterceptor, Transport,
};
