//! State carried across the OIDC authorization-code round trip.

use chrono::{DateTime, Duration, Utc};

/// Correlates an outbound authorization redirect with its callback.
///
/// Created when the user is sent to the identity provider and consumed
/// exactly once when the provider redirects back. Holds the anti-CSRF
/// `state`, the PKCE verifier, the ID-token nonce, and where to send the
/// user after login.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    csrf_state: String,
    pkce_verifier: String,
    nonce: String,
    return_to: String,
    created_at: DateTime<Utc>,
}

impl AuthorizationRequest {
    /// Creates the state for a freshly issued authorization redirect.
    #[must_use]
    pub fn new(csrf_state: String, pkce_verifier: String, nonce: String, return_to: String) -> Self {
        Self {
            csrf_state,
            pkce_verifier,
            nonce,
            return_to,
            created_at: Utc::now(),
        }
    }

    /// The `state` value sent to the provider.
    #[must_use]
    pub fn csrf_state(&self) -> &str {
        &self.csrf_state
    }

    /// The PKCE code verifier matching the challenge sent to the provider.
    #[must_use]
    pub fn pkce_verifier(&self) -> &str {
        &self.pkce_verifier
    }

    /// The nonce the identity token must echo.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Local path to land on after a successful login.
    #[must_use]
    pub fn return_to(&self) -> &str {
        &self.return_to
    }

    /// When the redirect was issued.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true once the request is older than `ttl`.
    #[must_use]
    pub fn is_stale(&self, ttl: Duration) -> bool {
        Utc::now() >= self.created_at + ttl
    }
}
