//! Application context - dependency injection container

use std::sync::Arc;

use meridian_core::mock::SharedDataset;
use meridian_core::{
    default_routes, ApiClient, AuthManager, LatencyLogger, MockDataset, MockRouter,
    RequestPipeline, RequestTagger, SessionService, TokenStore, Transport,
};
use meridian_domain::{AuthState, Config, Result};
use meridian_infra::{token_store_for, ReqwestTransport};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub token_store: Arc<dyn TokenStore>,
    pub auth: Arc<AuthManager>,
    pub pipeline: Arc<RequestPipeline>,
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionService>,
    /// Backing data of the mock routes, present when mocking is enabled
    pub mock_dataset: Option<SharedDataset>,
}

impl AppContext {
    /// Build the context with the configured token store and the reqwest
    /// transport.
    ///
    /// # Errors
    /// Returns `MeridianError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let token_store = token_store_for(&config.storage);
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::from_config(&config.api)?);
        Self::with_components(config, token_store, transport).await
    }

    /// Build the context around caller-supplied adapters.
    ///
    /// Request chain: request tagging, then bearer credentials. Response
    /// chain: 401 handling, then latency logging. Restores the persisted
    /// session before returning.
    pub async fn with_components(
        config: Config,
        token_store: Arc<dyn TokenStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        let auth = Arc::new(AuthManager::new(Arc::clone(&token_store)));
        let mock_dataset = config.mock.enabled.then(|| MockDataset::seeded().into_shared());

        let mut builder = RequestPipeline::builder(transport)
            .request_interceptor(Arc::new(RequestTagger))
            .request_interceptor(auth.clone())
            .response_interceptor(auth.clone())
            .response_interceptor(Arc::new(LatencyLogger));

        if let Some(dataset) = &mock_dataset {
            let router = MockRouter::builder()
                .latency(config.mock.latency())
                .base_url(&config.api.base_url)
                .rules(default_routes(dataset))
                .build();
            info!(routes = router.rules().len(), latency_ms = config.mock.latency_ms, "mock backend enabled");
            builder = builder.mock_router(Arc::new(router));
        }

        let pipeline = Arc::new(builder.build());
        let client = Arc::new(ApiClient::new(Arc::clone(&pipeline)));
        let session = Arc::new(SessionService::new(Arc::clone(&client), Arc::clone(&auth)));

        let state = auth.initialize().await;
        info!(
            base_url = %config.api.base_url,
            backend = ?config.storage.backend,
            mocked = pipeline.is_mocked(),
            restored = state == AuthState::Authenticated,
            "application context ready"
        );

        Ok(Self { config, token_store, auth, pipeline, client, session, mock_dataset })
    }

    pub async fn auth_state(&self) -> AuthState {
        self.auth.state().await
    }
}
