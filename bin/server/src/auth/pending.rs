//! Authorization requests awaiting their callback.

use chrono::Duration;
use claims_portal_identity::AuthorizationRequest;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// How long a login attempt may take before its state is discarded.
pub const AUTHORIZATION_TTL_MINUTES: i64 = 10;

/// Most login attempts held at once. The oldest is dropped past this.
pub const MAX_PENDING_AUTHORIZATIONS: usize = 4096;

/// In-flight authorization requests keyed by their `state` value.
///
/// Each request can be taken once; a replayed callback finds nothing.
/// The set is bounded: stale attempts are dropped first, then the oldest.
#[derive(Clone)]
pub struct AuthorizationRequests {
    inner: Arc<RwLock<Pending>>,
    ttl: Duration,
    capacity: usize,
}

#[derive(Default)]
struct Pending {
    requests: HashMap<String, AuthorizationRequest>,
    // States in insertion order; may name requests already taken.
    order: VecDeque<String>,
}

impl Default for AuthorizationRequests {
    fn default() -> Self {
        Self::new(Duration::minutes(AUTHORIZATION_TTL_MINUTES))
    }
}

impl AuthorizationRequests {
    /// Creates an empty set whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, MAX_PENDING_AUTHORIZATIONS)
    }

    /// Creates an empty set holding at most `capacity` requests.
    #[must_use]
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Pending::default())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Records a request issued to the identity provider.
    pub async fn insert(&self, request: AuthorizationRequest) {
        let mut pending = self.inner.write().await;

        // Oldest entries sit at the front, so pruning stops at the first live one.
        while let Some(state) = pending.order.front() {
            let evict = match pending.requests.get(state) {
                None => true,
                Some(oldest) => {
                    oldest.is_stale(self.ttl) || pending.order.len() >= self.capacity
                }
            };
            if !evict {
                break;
            }
            if let Some(state) = pending.order.pop_front() {
                if let Some(dropped) = pending.requests.remove(&state) {
                    if !dropped.is_stale(self.ttl) {
                        tracing::warn!("Dropped oldest pending login attempt");
                    }
                }
            }
        }

        let state = request.csrf_state().to_string();
        if pending.requests.insert(state.clone(), request).is_none() {
            pending.order.push_back(state);
        }
    }

    /// Removes and returns the request issued with `state`.
    ///
    /// Returns `None` for unknown, already used, or stale states.
    pub async fn take(&self, state: &str) -> Option<AuthorizationRequest> {
        let request = self.inner.write().await.requests.remove(state)?;
        if request.is_stale(self.ttl) {
            tracing::debug!("Discarded stale authorization request");
            return None;
        }
        Some(request)
    }

    /// Number of requests currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.requests.len()
    }

    /// Returns true if no requests are held.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.requests.is_empty()
    }
}
