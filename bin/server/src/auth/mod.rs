//! Authentication module for the claims-portal server.
//!
//! This module provides:
//! - OIDC authentication against an external identity provider
//! - Server-side sessions behind a signed cookie
//! - The gate and extractor that protect routes
//!
//! # Login flow
//!
//! `/login` records an [`AuthorizationRequest`](claims_portal_identity::AuthorizationRequest)
//! keyed by its `state` and remembers that `state` in a signed cookie.
//! `/callback` takes the request back out (once), hands it to the
//! [`OidcClient`] to verify the response, and only then creates a session.

pub mod middleware;
pub mod oidc;
pub mod pending;
pub mod routes;
pub mod store;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

use crate::pages::ViewRenderer;

pub use middleware::{AuthGate, AuthRejection, GateDecision, RequireSession};
pub use oidc::{OidcClient, OidcError};
pub use pending::AuthorizationRequests;
pub use routes::{callback, login, logout};
pub use store::{MemoryBackend, SessionBackend, SessionStore};

/// Shared application state.
///
/// Cheap to clone; everything mutable sits behind its own lock.
#[derive(Clone)]
pub struct AppState {
    /// OIDC client for authentication.
    pub oidc_client: Arc<OidcClient>,
    /// Session storage and cookie signing.
    pub sessions: SessionStore,
    /// Logins waiting for their callback.
    pub authorizations: AuthorizationRequests,
    /// Gate for protected routes.
    pub gate: AuthGate,
    /// Page renderer.
    pub renderer: Arc<dyn ViewRenderer>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        oidc_client: OidcClient,
        sessions: SessionStore,
        renderer: Arc<dyn ViewRenderer>,
    ) -> Self {
        Self {
            oidc_client: Arc::new(oidc_client),
            gate: AuthGate::new(sessions.clone()),
            sessions,
            authorizations: AuthorizationRequests::default(),
            renderer,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.key().clone()
    }
}
