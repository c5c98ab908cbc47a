use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use meridian_core::{TokenStore, Transport};
use meridian_domain::{ApiError, Config, RawResponse, RequestDescriptor};
use meridian_infra::MemoryTokenStore;

/// Transport that must never be reached; counts the calls that do.
#[derive(Default)]
pub struct UnreachableTransport {
    calls: AtomicUsize,
}

impl UnreachableTransport {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for UnreachableTransport {
    async fn send(&self, _request: &RequestDescriptor) -> Result<RawResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Network("transport should not be used".into()))
    }
}

/// Configuration with the mock backend on and no simulated latency.
pub fn mock_config() -> Config {
    let mut config = Config::default();
    config.mock.enabled = true;
    config.mock.latency_ms = 0;
    config
}

/// Configuration pointing at `base_url` with mocking off.
pub fn remote_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.api.timeout_seconds = 2;
    config
}

/// Memory store already holding a complete session.
pub async fn signed_in_store() -> Arc<MemoryTokenStore> {
    let store = Arc::new(MemoryTokenStore::new());
    store.set_refresh_token("refresh-1").await.expect("memory store write");
    store.set_token("access-1").await.expect("memory store write");
    store
}
