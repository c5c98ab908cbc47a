//! Authentication lifecycle
//!
//! - [`ports::TokenStore`]: credential persistence port
//! - [`manager::AuthManager`]: token attachment and 401 invalidation
//! - [`session::SessionService`]: remote login/registration/logout/refresh

pub mod manager;
pub mod ports;
pub mod session;

pub use manager::{AuthError, AuthManager};
pub use ports::TokenStore;
pub use session::{AuthPayload, Credentials, Registration, SessionService};
