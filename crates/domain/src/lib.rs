//! # Meridian Domain
//!
//! Plain types shared by every Meridian crate.
//!
//! This crate contains:
//! - Request/response representations (descriptor, envelope)
//! - Credential types (`TokenPair`, `AuthState`)
//! - Error taxonomy and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other Meridian crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
