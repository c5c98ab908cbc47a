//! Auth lifecycle manager
//!
//! Owns the two credential rules of the pipeline:
//! - attach the bearer token to every outgoing request while authenticated
//! - invalidate local credentials when a call reports 401
//!
//! State machine: `Unauthenticated -> Authenticated` on login, registration
//! or refresh; back to `Unauthenticated` on logout or on a 401. A 401 is
//! terminal for the triggering request; no refresh-and-retry happens here.

use std::sync::Arc;

use async_trait::async_trait;
use meridian_domain::constants::{BEARER_PREFIX, HEADER_AUTHORIZATION};
use meridian_domain::{ApiError, AuthState, Outcome, RequestDescriptor, TokenPair};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::ports::TokenStore;
use crate::pipeline::{RequestInterceptor, ResponseInterceptor};

/// Error type for auth manager operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Access or refresh token missing/blank; nothing was persisted
    #[error("Invalid credentials payload: access and refresh tokens are both required")]
    InvalidCredentialsPayload,

    /// The token store rejected a write; the pair was rolled back
    #[error("Credential storage failed: {0}")]
    Storage(String),
}

/// Auth lifecycle manager
///
/// The in-memory pair mirrors what was last persisted; the token store
/// stays the source of truth for the access token itself.
pub struct AuthManager {
    store: Arc<dyn TokenStore>,
    current: RwLock<Option<TokenPair>>,
}

impl AuthManager {
    /// Create a manager in the `Unauthenticated` state.
    ///
    /// Call [`AuthManager::initialize`] to pick up persisted credentials.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store, current: RwLock::new(None) }
    }

    /// Load persisted credentials.
    ///
    /// A broken pair (only one of the two tokens present) is purged.
    pub async fn initialize(&self) -> AuthState {
        let access = absent_on_error(self.store.get_token().await, "access_token");
        let refresh = absent_on_error(self.store.get_refresh_token().await, "refresh_token");

        let mut current = self.current.write().await;
        match (access, refresh) {
            (Some(access), Some(refresh)) => {
                let tokens = TokenPair::new(access, refresh);
                if tokens.is_complete() {
                    *current = Some(tokens);
                    info!("auth manager initialized with existing credentials");
                    return AuthState::Authenticated;
                }
                warn!("blank token found in store, purging credentials");
                self.clear_store().await;
            }
            (None, None) => debug!("no persisted credentials"),
            _ => {
                warn!("incomplete token pair found in store, purging credentials");
                self.clear_store().await;
            }
        }

        *current = None;
        AuthState::Unauthenticated
    }

    pub async fn state(&self) -> AuthState {
        if self.current.read().await.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state().await == AuthState::Authenticated
    }

    /// Persist credentials returned by a successful login.
    ///
    /// # Errors
    /// - [`AuthError::InvalidCredentialsPayload`] if either token is blank
    /// - [`AuthError::Storage`] if the store rejected a write
    pub async fn login(&self, tokens: TokenPair, user: Option<&Value>) -> Result<(), AuthError> {
        self.establish(tokens, user, "login").await
    }

    /// Persist credentials returned by a successful registration.
    ///
    /// # Errors
    /// Same as [`AuthManager::login`].
    pub async fn register(&self, tokens: TokenPair, user: Option<&Value>) -> Result<(), AuthError> {
        self.establish(tokens, user, "register").await
    }

    /// Replace the persisted pair after a token refresh. The cached user is
    /// kept.
    ///
    /// # Errors
    /// Same as [`AuthManager::login`].
    pub async fn refresh(&self, tokens: TokenPair) -> Result<(), AuthError> {
        self.establish(tokens, None, "refresh").await
    }

    /// Clear all credentials. Never fails; storage errors are logged.
    pub async fn logout(&self) {
        let mut current = self.current.write().await;
        self.clear_store().await;
        *current = None;
        info!("logged out, credentials cleared");
    }

    /// Access token from the store; storage failures read as absent.
    pub async fn access_token(&self) -> Option<String> {
        absent_on_error(self.store.get_token().await, "access_token")
    }

    /// Refresh token from the store; storage failures read as absent.
    pub async fn refresh_token(&self) -> Option<String> {
        absent_on_error(self.store.get_refresh_token().await, "refresh_token")
    }

    /// User payload cached at login/registration.
    pub async fn cached_user(&self) -> Option<Value> {
        absent_on_error(self.store.get_user().await, "user")
    }

    /// Overwrite the cached user payload (e.g. after a profile update).
    ///
    /// # Errors
    /// Returns [`AuthError::Storage`] if the store rejected the write.
    pub async fn cache_user(&self, user: &Value) -> Result<(), AuthError> {
        self.store.set_user(user).await.map_err(|err| AuthError::Storage(err.to_string()))
    }

    async fn establish(
        &self,
        tokens: TokenPair,
        user: Option<&Value>,
        reason: &'static str,
    ) -> Result<(), AuthError> {
        if !tokens.is_complete() {
            warn!(reason, "rejected incomplete credentials payload");
            return Err(AuthError::InvalidCredentialsPayload);
        }

        let mut current = self.current.write().await;

        if let Err(err) = self.persist(&tokens, user).await {
            error!(reason, error = %err, "failed to persist credentials, rolling back");
            self.clear_store().await;
            *current = None;
            return Err(AuthError::Storage(err.to_string()));
        }

        *current = Some(tokens);
        info!(reason, "credentials stored");
        Ok(())
    }

    /// Refresh token first so an access token is never stored without its
    /// pair.
    async fn persist(&self, tokens: &TokenPair, user: Option<&Value>) -> meridian_domain::Result<()> {
        self.store.set_refresh_token(&tokens.refresh_token).await?;
        self.store.set_token(&tokens.access_token).await?;
        if let Some(user) = user {
            self.store.set_user(user).await?;
        }
        Ok(())
    }

    async fn invalidate(&self, request_id: &str) {
        let mut current = self.current.write().await;
        self.clear_store().await;
        *current = None;
        warn!(request_id, "authentication failure, credentials invalidated");
    }

    /// Access token first; its refresh token is only removed once the access
    /// token is gone, so a lone access token never stays behind.
    async fn clear_store(&self) {
        match self.store.remove_token().await {
            Ok(()) => {
                if let Err(err) = self.store.remove_refresh_token().await {
                    error!(error = %err, "failed to remove refresh token");
                }
            }
            Err(err) => {
                error!(error = %err, "failed to remove access token, keeping its refresh token");
            }
        }
        if let Err(err) = self.store.remove_user().await {
            error!(error = %err, "failed to remove cached user");
        }
    }
}

fn absent_on_error<T>(result: meridian_domain::Result<Option<T>>, key: &'static str) -> Option<T> {
    result.unwrap_or_else(|err| {
        warn!(key, error = %err, "token store read failed, treating as absent");
        None
    })
}

#[async_trait]
impl RequestInterceptor for AuthManager {
    fn name(&self) -> &'static str {
        "bearer_token"
    }

    async fn on_request(&self, request: &mut RequestDescriptor) -> Result<(), ApiError> {
        if !self.is_authenticated().await {
            return Ok(());
        }

        match self.access_token().await {
            Some(token) => {
                request.set_header(HEADER_AUTHORIZATION, format!("{BEARER_PREFIX}{token}"));
            }
            None => {
                debug!(request_id = request.request_id(), "no access token available, sending without credentials");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseInterceptor for AuthManager {
    fn name(&self) -> &'static str {
        "unauthorized_guard"
    }

    async fn on_response(
        &self,
        request: &RequestDescriptor,
        outcome: Outcome,
    ) -> Result<Outcome, ApiError> {
        let unauthorized = match &outcome {
            Ok(response) => response.status == 401,
            Err(err) => err.is_unauthorized(),
        };

        if unauthorized {
            self.invalidate(request.request_id()).await;
        }

        Ok(outcome)
    }
}
