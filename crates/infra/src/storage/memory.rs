//! Process-local token store

use async_trait::async_trait;
use meridian_core::TokenStore;
use meridian_domain::Result;
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Slots {
    token: Option<String>,
    refresh_token: Option<String>,
    user: Option<Value>,
}

/// Keeps credentials in memory; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slots: RwLock<Slots>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_token(&self) -> Result<Option<String>> {
        Ok(self.slots.read().await.token.clone())
    }

    async fn set_token(&self, token: &str) -> Result<()> {
        self.slots.write().await.token = Some(token.to_string());
        Ok(())
    }

    async fn remove_token(&self) -> Result<()> {
        self.slots.write().await.token = None;
        Ok(())
    }

    async fn get_refresh_token(&self) -> Result<Option<String>> {
        Ok(self.slots.read().await.refresh_token.clone())
    }

    async fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.slots.write().await.refresh_token = Some(token.to_string());
        Ok(())
    }

    async fn remove_refresh_token(&self) -> Result<()> {
        self.slots.write().await.refresh_token = None;
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<Value>> {
        Ok(self.slots.read().await.user.clone())
    }

    async fn set_user(&self, user: &Value) -> Result<()> {
        self.slots.write().await.user = Some(user.clone());
        Ok(())
    }

    async fn remove_user(&self) -> Result<()> {
        self.slots.write().await.user = None;
        Ok(())
    }
}
