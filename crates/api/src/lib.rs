//! # Meridian App
//!
//! Composition root and binary for the Meridian client network layer.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Tracing initialisation and operation logging
//! - The offline demo session run by the `meridian` binary
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod demo;
pub mod utils;

// Re-export for convenience
pub use context::*;
pub use demo::{run_demo_session, DemoReport};
