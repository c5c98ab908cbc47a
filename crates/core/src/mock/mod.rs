//! Mock routing engine
//!
//! When enabled, requests matching the route table are answered locally
//! after a simulated delay and never reach the transport. The default table
//! serves a small simulated backend over an injected [`MockDataset`].

pub mod dataset;
pub mod handlers;
pub mod route;
pub mod router;

pub use dataset::{Arena, MockDataset, Record, SharedDataset};
pub use handlers::{default_routes, BackendHandler, Endpoint};
pub use route::{
    handler_fn, normalize_path, MockFailure, MockReply, MockRequest, RouteHandler, RouteRule,
    UrlPattern,
};
pub use router::{MockRouter, MockRouterBuilder};
