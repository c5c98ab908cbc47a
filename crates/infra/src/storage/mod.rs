//! Token store adapters

pub mod keychain;
pub mod memory;

use std::sync::Arc;

use meridian_core::TokenStore;
use meridian_domain::{StorageConfig, TokenStoreBackend};

pub use keychain::KeyringTokenStore;
pub use memory::MemoryTokenStore;

/// Token store for the configured backend.
pub fn token_store_for(config: &StorageConfig) -> Arc<dyn TokenStore> {
    match config.backend {
        TokenStoreBackend::Memory => Arc::new(MemoryTokenStore::new()),
        TokenStoreBackend::Keyring => Arc::new(KeyringTokenStore::new(config.service_name.clone())),
    }
}
