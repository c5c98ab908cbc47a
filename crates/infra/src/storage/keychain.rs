//! OS keychain token store
//!
//! One keychain entry per slot under the configured service name. Keychain
//! calls block, so each one runs on the blocking pool.

use async_trait::async_trait;
use keyring::Entry;
use meridian_core::TokenStore;
use meridian_domain::{MeridianError, Result};
use serde_json::Value;
use tracing::debug;

use crate::errors::InfraError;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const USER_KEY: &str = "user";

/// Credentials persisted in the platform keychain
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service_name: String,
}

impl KeyringTokenStore {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    async fn read(&self, key: &'static str) -> Result<Option<String>> {
        let service = self.service_name.clone();
        run_blocking(move || {
            debug!(service = %service, key, "Reading keychain entry");
            let entry = Entry::new(&service, key)?;
            match entry.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }

    async fn write(&self, key: &'static str, value: String) -> Result<()> {
        let service = self.service_name.clone();
        run_blocking(move || {
            debug!(service = %service, key, "Storing keychain entry");
            Entry::new(&service, key)?.set_password(&value)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &'static str) -> Result<()> {
        let service = self.service_name.clone();
        run_blocking(move || {
            debug!(service = %service, key, "Deleting keychain entry");
            match Entry::new(&service, key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(err) => Err(err.into()),
            }
        })
        .await
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, InfraError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| MeridianError::Internal(format!("keychain task failed: {err}")))?
        .map_err(MeridianError::from)
}

#[async_trait]
impl TokenStore for KeyringTokenStore {
    async fn get_token(&self) -> Result<Option<String>> {
        self.read(ACCESS_TOKEN_KEY).await
    }

    async fn set_token(&self, token: &str) -> Result<()> {
        self.write(ACCESS_TOKEN_KEY, token.to_string()).await
    }

    async fn remove_token(&self) -> Result<()> {
        self.delete(ACCESS_TOKEN_KEY).await
    }

    async fn get_refresh_token(&self) -> Result<Option<String>> {
        self.read(REFRESH_TOKEN_KEY).await
    }

    async fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.write(REFRESH_TOKEN_KEY, token.to_string()).await
    }

    async fn remove_refresh_token(&self) -> Result<()> {
        self.delete(REFRESH_TOKEN_KEY).await
    }

    async fn get_user(&self) -> Result<Option<Value>> {
        match self.read(USER_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| MeridianError::from(InfraError::from(err))),
            None => Ok(None),
        }
    }

    async fn set_user(&self, user: &Value) -> Result<()> {
        let raw = serde_json::to_string(user)
            .map_err(|err| MeridianError::from(InfraError::from(err)))?;
        self.write(USER_KEY, raw).await
    }

    async fn remove_user(&self) -> Result<()> {
        self.delete(USER_KEY).await
    }
}
