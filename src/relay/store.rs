//! Correlation store — in-memory pending requests keyed by forward message id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

use super::model::{Decision, DecisionState, PendingRequest};

struct PendingEntry {
    request: PendingRequest,
    /// Fired once when a decision consumes the entry.
    waiter: oneshot::Sender<Decision>,
}

/// Process-wide map of outstanding requests.
///
/// Every lookup-and-mutate runs under one lock, so inserting a request and
/// consuming its decision never interleave.
pub struct CorrelationStore {
    entries: Mutex<HashMap<String, PendingEntry>>,
}

impl CorrelationStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Register a pending request and return the receiver its decision will
    /// arrive on. Returns `None` if the key is already pending.
    pub async fn insert(&self, request: PendingRequest) -> Option<oneshot::Receiver<Decision>> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&request.correlation_key) {
            warn!(
                correlation_key = %request.correlation_key,
                "Correlation key already pending"
            );
            return None;
        }

        let (waiter, rx) = oneshot::channel();
        info!(
            correlation_key = %request.correlation_key,
            requester = %request.requester_number,
            "Pending request stored"
        );
        entries.insert(
            request.correlation_key.clone(),
            PendingEntry { request, waiter },
        );
        Some(rx)
    }

    /// Consume the entry for `key` with `decision` and wake its waiter.
    ///
    /// Returns the decided request, or `None` if nothing was pending.
    pub async fn resolve(&self, key: &str, decision: Decision) -> Option<PendingRequest> {
        let mut entries = self.entries.lock().await;
        let PendingEntry {
            mut request,
            waiter,
        } = entries.remove(key)?;

        request.decision = DecisionState::Decided(decision);
        if waiter.send(decision).is_err() {
            debug!(correlation_key = %key, "Decision applied with no waiter listening");
        }
        Some(request)
    }

    /// Drop the entry for `key` without a decision.
    pub async fn remove(&self, key: &str) -> Option<PendingRequest> {
        self.entries.lock().await.remove(key).map(|e| e.request)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    /// Snapshot of all pending requests, oldest first.
    pub async fn pending(&self) -> Vec<PendingRequest> {
        let entries = self.entries.lock().await;
        let mut requests: Vec<PendingRequest> =
            entries.values().map(|e| e.request.clone()).collect();
        requests.sort_by_key(|r| r.created_at);
        requests
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
