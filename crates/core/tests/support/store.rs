//! In-memory token store with call counters and failure switches.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use meridian_core::TokenStore;
use meridian_domain::{MeridianError, Result as DomainResult};
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Default)]
struct Slots {
    access: Option<String>,
    refresh: Option<String>,
    user: Option<Value>,
}

/// Token store recording how often tokens were removed.
#[derive(Default)]
pub struct RecordingTokenStore {
    slots: Mutex<Slots>,
    token_removals: AtomicUsize,
    fail_reads: AtomicBool,
    fail_access_writes: AtomicBool,
}

impl RecordingTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a complete pair.
    pub fn with_pair(access: &str, refresh: &str) -> Self {
        let store = Self::default();
        {
            let mut slots = store.slots.lock();
            slots.access = Some(access.to_string());
            slots.refresh = Some(refresh.to_string());
        }
        store
    }

    pub fn token_removals(&self) -> usize {
        self.token_removals.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_access_writes(&self, fail: bool) {
        self.fail_access_writes.store(fail, Ordering::SeqCst);
    }

    pub fn access(&self) -> Option<String> {
        self.slots.lock().access.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.slots.lock().refresh.clone()
    }

    pub fn user(&self) -> Option<Value> {
        self.slots.lock().user.clone()
    }

    fn check_read(&self) -> DomainResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(MeridianError::Storage("read failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for RecordingTokenStore {
    async fn get_token(&self) -> DomainResult<Option<String>> {
        self.check_read()?;
        Ok(self.access())
    }

    async fn set_token(&self, token: &str) -> DomainResult<()> {
        if self.fail_access_writes.load(Ordering::SeqCst) {
            return Err(MeridianError::Storage("keychain locked".into()));
        }
        self.slots.lock().access = Some(token.to_string());
        Ok(())
    }

    async fn remove_token(&self) -> DomainResult<()> {
        self.token_removals.fetch_add(1, Ordering::SeqCst);
        self.slots.lock().access = None;
        Ok(())
    }

    async fn get_refresh_token(&self) -> DomainResult<Option<String>> {
        self.check_read()?;
        Ok(self.refresh())
    }

    async fn set_refresh_token(&self, token: &str) -> DomainResult<()> {
        self.slots.lock().refresh = Some(token.to_string());
        Ok(())
    }

    async fn remove_refresh_token(&self) -> DomainResult<()> {
        self.slots.lock().refresh = None;
        Ok(())
    }

    async fn get_user(&self) -> DomainResult<Option<Value>> {
        self.check_read()?;
        Ok(self.user())
    }

    async fn set_user(&self, user: &Value) -> DomainResult<()> {
        self.slots.lock().user = Some(user.clone());
        Ok(())
    }

    async fn remove_user(&self) -> DomainResult<()> {
        self.slots.lock().user = None;
        Ok(())
    }
}
