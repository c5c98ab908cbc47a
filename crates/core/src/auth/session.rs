//! Session service
//!
//! Remote auth calls layered over the [`ApiClient`]; credentials returned by
//! the server are handed to the [`AuthManager`].

use std::fmt;
use std::sync::Arc;

use meridian_domain::constants::{
    AUTH_LOGIN_PATH, AUTH_LOGOUT_PATH, AUTH_REFRESH_PATH, AUTH_REGISTER_PATH, USER_PROFILE_PATH,
};
use meridian_domain::{AuthState, ResponseEnvelope, TokenPair};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::manager::{AuthError, AuthManager};
use crate::client::ApiClient;

/// Login request body
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("email", &self.email).field("password", &"<redacted>").finish()
    }
}

/// Registration request body
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Payload returned by `/auth/login` and `/auth/register`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: Value,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Clone, Copy)]
enum Establish {
    Login,
    Register,
}

/// Login, registration, logout and token refresh
pub struct SessionService {
    client: Arc<ApiClient>,
    auth: Arc<AuthManager>,
}

impl SessionService {
    pub fn new(client: Arc<ApiClient>, auth: Arc<AuthManager>) -> Self {
        Self { client, auth }
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Authenticate and persist the returned credentials.
    ///
    /// On success the envelope carries the user payload.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> ResponseEnvelope<Value> {
        let envelope: ResponseEnvelope<AuthPayload> =
            self.client.post(AUTH_LOGIN_PATH, Some(credentials), None).await;
        self.establish(envelope, Establish::Login).await
    }

    /// Create an account and persist the returned credentials.
    #[instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> ResponseEnvelope<Value> {
        let envelope: ResponseEnvelope<AuthPayload> =
            self.client.post(AUTH_REGISTER_PATH, Some(registration), None).await;
        self.establish(envelope, Establish::Register).await
    }

    /// Best-effort remote logout followed by an unconditional local clear.
    #[instrument(skip_all)]
    pub async fn logout(&self) {
        let refresh_token = self.auth.refresh_token().await;
        let body = json!({ "refreshToken": refresh_token });
        let envelope: ResponseEnvelope<Value> =
            self.client.post(AUTH_LOGOUT_PATH, Some(&body), None).await;

        if let Some(error) = envelope.error {
            warn!(status = ?envelope.status, error = %error, "remote logout failed, clearing local credentials anyway");
        }

        self.auth.logout().await;
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Not triggered automatically; a 401 still invalidates credentials.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> ResponseEnvelope<AuthState> {
        let Some(refresh_token) = self.auth.refresh_token().await else {
            return ResponseEnvelope::rejected("No refresh token available", None);
        };

        let body = json!({ "refreshToken": refresh_token });
        let envelope: ResponseEnvelope<RefreshPayload> =
            self.client.post(AUTH_REFRESH_PATH, Some(&body), None).await;
        let status = envelope.status;

        match envelope.into_result() {
            Ok(payload) => {
                let tokens = TokenPair::new(payload.access_token, payload.refresh_token);
                match self.auth.refresh(tokens).await {
                    Ok(()) => {
                        info!("session refreshed");
                        ResponseEnvelope::success(AuthState::Authenticated, status.unwrap_or(200), None)
                    }
                    Err(err) => auth_failure(&err, status),
                }
            }
            Err((status, error)) => ResponseEnvelope::rejected(error, status),
        }
    }

    /// Fetch the profile and refresh the cached user payload.
    #[instrument(skip_all)]
    pub async fn current_user(&self) -> ResponseEnvelope<Value> {
        let envelope: ResponseEnvelope<Value> = self.client.get(USER_PROFILE_PATH, None).await;
        self.cache_profile(&envelope).await;
        envelope
    }

    /// Update profile fields and refresh the cached user payload.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, changes: &Value) -> ResponseEnvelope<Value> {
        let envelope: ResponseEnvelope<Value> =
            self.client.put(USER_PROFILE_PATH, Some(changes), None).await;
        self.cache_profile(&envelope).await;
        envelope
    }

    async fn cache_profile(&self, envelope: &ResponseEnvelope<Value>) {
        if let Some(user) = &envelope.data {
            if let Err(err) = self.auth.cache_user(user).await {
                warn!(error = %err, "failed to cache user profile");
            }
        }
    }

    async fn establish(
        &self,
        envelope: ResponseEnvelope<AuthPayload>,
        kind: Establish,
    ) -> ResponseEnvelope<Value> {
        let status = envelope.status;
        let message = envelope.message.clone();

        let payload = match envelope.into_result() {
            Ok(payload) => payload,
            Err((status, error)) => return ResponseEnvelope::rejected(error, status),
        };

        let tokens = TokenPair::new(payload.access_token, payload.refresh_token);
        let stored = match kind {
            Establish::Login => self.auth.login(tokens, Some(&payload.user)).await,
            Establish::Register => self.auth.register(tokens, Some(&payload.user)).await,
        };

        match stored {
            Ok(()) => {
                info!(?kind, "session established");
                ResponseEnvelope::success(payload.user, status.unwrap_or(200), message)
            }
            Err(err) => auth_failure(&err, status),
        }
    }
}

fn auth_failure<T>(err: &AuthError, status: Option<u16>) -> ResponseEnvelope<T> {
    warn!(error = %err, "server accepted credentials but they could not be stored");
    ResponseEnvelope::rejected(err.to_string(), status)
}
