//! Conversions from external infrastructure errors into domain errors.

use std::time::Duration;

use keyring::Error as KeyringError;
use meridian_domain::{ApiError, MeridianError};
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MeridianError);

impl From<InfraError> for MeridianError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MeridianError> for InfraError {
    fn from(value: MeridianError) -> Self {
        InfraError(value)
    }
}

trait IntoMeridianError {
    fn into_meridian(self) -> MeridianError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → MeridianError */
/* -------------------------------------------------------------------------- */

impl IntoMeridianError for KeyringError {
    fn into_meridian(self) -> MeridianError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => MeridianError::Storage("keychain entry not found".into()),
            BadEncoding(_) => {
                MeridianError::Storage("credential in keychain is not valid UTF-8".into())
            }
            TooLong(name, limit) => MeridianError::Storage(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                MeridianError::Storage(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            PlatformFailure(err) => {
                MeridianError::Storage(format!("keychain platform error: {err}"))
            }
            NoStorageAccess(err) => {
                MeridianError::Storage(format!("unable to access secure storage: {err}"))
            }
            _ => MeridianError::Storage(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_meridian())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MeridianError (client construction) */
/* -------------------------------------------------------------------------- */

impl IntoMeridianError for HttpError {
    fn into_meridian(self) -> MeridianError {
        if self.is_builder() {
            return MeridianError::Config(format!("failed to build HTTP client: {self}"));
        }
        MeridianError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_meridian())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → MeridianError */
/* -------------------------------------------------------------------------- */

impl IntoMeridianError for TomlError {
    fn into_meridian(self) -> MeridianError {
        MeridianError::Config(format!("Invalid TOML format: {}", self.message()))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_meridian())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → MeridianError (persisted payloads) */
/* -------------------------------------------------------------------------- */

impl IntoMeridianError for JsonError {
    fn into_meridian(self) -> MeridianError {
        MeridianError::Storage(format!("stored payload is not valid JSON: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_meridian())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ApiError (request outcomes) */
/* -------------------------------------------------------------------------- */

/// Classify a failed HTTP exchange for the request pipeline.
///
/// Failures where no response arrived report status 0 downstream; a request
/// that could not be built never left the client.
pub trait IntoApiError {
    fn into_api_error(self, timeout: Duration) -> ApiError;
}

impl IntoApiError for HttpError {
    fn into_api_error(self, timeout: Duration) -> ApiError {
        if self.is_timeout() {
            return ApiError::Timeout(timeout);
        }

        if self.is_builder() {
            return ApiError::InvalidRequest(format!("failed to build HTTP request: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ApiError::Network(format!("HTTP connection failure: {self}"));
        }

        ApiError::Network(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn keyring_no_entry_maps_to_storage_error() {
        let mapped: MeridianError = InfraError::from(KeyringError::NoEntry).into();
        match mapped {
            MeridianError::Storage(msg) => assert!(msg.contains("keychain")),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[test]
    fn toml_errors_map_to_config_error() {
        let err = toml::from_str::<toml::Value>("api = [").unwrap_err();
        let mapped: MeridianError = InfraError::from(err).into();
        assert!(matches!(mapped, MeridianError::Config(msg) if msg.starts_with("Invalid TOML")));
    }

    #[test]
    fn corrupt_json_payload_maps_to_storage_error() {
        let err = serde_json::from_str::<serde_json::Value>("{user").unwrap_err();
        let mapped: MeridianError = InfraError::from(err).into();
        assert!(matches!(mapped, MeridianError::Storage(_)));
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped = error.into_api_error(Duration::from_secs(1));
        assert!(matches!(mapped, ApiError::Network(_)));
        assert_eq!(mapped.status(), Some(0));
    }

    #[tokio::test]
    async fn elapsed_timeout_maps_to_timeout_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let timeout = Duration::from_millis(50);
        let error = client.get(server.uri()).timeout(timeout).send().await.unwrap_err();

        assert_eq!(error.into_api_error(timeout), ApiError::Timeout(timeout));
    }
}
