//! Shared test helpers for `meridian-core` integration tests.
//!
//! In-memory stand-ins for the transport and token store ports that record
//! how they were used.

#![allow(dead_code)]

pub mod store;
pub mod transport;

pub use store::RecordingTokenStore;
pub use transport::RecordingTransport;
