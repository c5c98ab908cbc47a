//! Port interfaces for credential persistence
//!
//! The token store is an external capability; the auth layer only relies on
//! these operations. Every call may suspend and may fail.

use async_trait::async_trait;
use meridian_domain::Result;
use serde_json::Value;

/// Durable key-value persistence for the access token, the refresh token and
/// the cached user payload.
///
/// Reads and writes are not transactional. A failed read must be treated as
/// "value absent" by callers.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get_token(&self) -> Result<Option<String>>;

    async fn set_token(&self, token: &str) -> Result<()>;

    async fn remove_token(&self) -> Result<()>;

    async fn get_refresh_token(&self) -> Result<Option<String>>;

    async fn set_refresh_token(&self, token: &str) -> Result<()>;

    async fn remove_refresh_token(&self) -> Result<()>;

    async fn get_user(&self) -> Result<Option<Value>>;

    async fn set_user(&self, user: &Value) -> Result<()>;

    async fn remove_user(&self) -> Result<()>;
}
