//! Scripted transport that counts calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use meridian_core::Transport;
use meridian_domain::{ApiError, Outcome, RawResponse, RequestDescriptor};
use parking_lot::Mutex;
use serde_json::Value;

/// Transport answering from a queue of scripted outcomes.
///
/// Once the queue is drained every call gets the fallback outcome.
pub struct RecordingTransport {
    calls: AtomicUsize,
    scripted: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    seen: Mutex<Vec<RequestDescriptor>>,
}

impl RecordingTransport {
    /// Transport answering `200 null` to everything.
    pub fn ok() -> Self {
        Self::answering(Ok(RawResponse::ok(Value::Null)))
    }

    pub fn answering(fallback: Outcome) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            scripted: Mutex::new(VecDeque::new()),
            fallback,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Transport whose every call fails with a connectivity error.
    pub fn unreachable() -> Self {
        Self::answering(Err(ApiError::Network("connection refused".into())))
    }

    /// Queue an outcome for the next unanswered call.
    pub fn then(self, outcome: Outcome) -> Self {
        self.scripted.lock().push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(request.clone());
        let next = self.scripted.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
