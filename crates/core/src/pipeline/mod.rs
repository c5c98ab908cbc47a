//! Request pipeline
//!
//! Every call goes through the same ordered stages:
//!
//! ```text
//! stamp metadata -> validate -> request interceptors
//!     -> mock router (if enabled and matching) | transport
//!     -> response interceptors -> envelope
//! ```

pub mod diagnostics;
pub mod ports;
pub mod service;

pub use diagnostics::{error_label, LatencyLogger, RequestTagger};
pub use ports::{RequestInterceptor, ResponseInterceptor, Transport};
pub use service::{RequestPipeline, RequestPipelineBuilder};
