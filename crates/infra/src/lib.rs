//! # Meridian Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP client and [`ReqwestTransport`]
//! - Token stores (in-memory and OS keychain)
//! - Configuration loading (environment, TOML, JSON)
//!
//! ## Architecture
//! - Implements traits defined in `meridian-core`
//! - Depends on `meridian-domain` and `meridian-core`
//! - Contains all "impure" code (network, keychain, filesystem)

pub mod config;
pub mod errors;
pub mod http;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, ReqwestTransport};
pub use storage::{token_store_for, KeyringTokenStore, MemoryTokenStore};
