//! Settings for the relying-party side of OpenID Connect.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scopes requested on every authorization, whatever is configured.
pub const REQUIRED_SCOPES: &[&str] = &["openid", "profile"];

/// How claims-portal talks to its identity provider.
///
/// Immutable once the server has started. Fields with defaults can be
/// omitted when deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OIDC issuer URL (e.g., "https://tenant.us.auth0.com/").
    /// Used for discovery and to verify the `iss` claim.
    issuer_url: String,
    /// Client ID issued at registration.
    client_id: String,
    /// The OAuth2 client secret. Absent for public clients.
    #[serde(default)]
    client_secret: Option<String>,
    /// The redirect URI for the OAuth2 callback (e.g., "https://portal.example.com/callback").
    redirect_uri: String,
    /// Comma-separated scopes.
    /// Default: "openid,profile,email"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Timeout for requests to the issuer, in seconds.
    /// Default: 20
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
    /// Where the issuer should send the user after federated logout.
    #[serde(default)]
    post_logout_redirect_uri: Option<String>,
}

fn default_scopes() -> String {
    "openid,profile,email".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    20
}

impl OidcConfig {
    /// Creates a configuration; optional settings take their defaults.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes(),
            request_timeout_seconds: default_request_timeout_seconds(),
            post_logout_redirect_uri: None,
        }
    }

    /// Starts a builder for the optional settings.
    #[must_use]
    pub fn builder(
        issuer_url: String,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: String,
    ) -> OidcConfigBuilder {
        OidcConfigBuilder::new(issuer_url, client_id, client_secret, redirect_uri)
    }

    /// Issuer URL used for discovery and `iss` checks.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Client ID sent on every request.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret, if any.
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// Where the provider sends the browser back to.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the scopes to request.
    ///
    /// [`REQUIRED_SCOPES`] come first and are always present; configured
    /// scopes follow, without duplicates or empty entries.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        let mut scopes: Vec<&str> = REQUIRED_SCOPES.to_vec();
        for scope in self.scopes.split(',').map(str::trim) {
            if !scope.is_empty() && !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes
    }

    /// Returns the timeout applied to every request to the issuer.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Returns the post-logout redirect URI, if federated logout is wanted.
    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> Option<&str> {
        self.post_logout_redirect_uri.as_deref()
    }
}

/// Incremental construction of an [`OidcConfig`].
#[derive(Debug)]
pub struct OidcConfigBuilder {
    issuer_url: String,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
    scopes: Vec<String>,
    request_timeout: Duration,
    post_logout_redirect_uri: Option<String>,
}

impl OidcConfigBuilder {
    /// Starts from the mandatory settings.
    #[must_use]
    pub fn new(
        issuer_url: String,
        client_id: String,
        client_secret: Option<String>,
        redirect_uri: String,
    ) -> Self {
        Self {
            issuer_url,
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes().split(',').map(str::to_string).collect(),
            request_timeout: Duration::from_secs(default_request_timeout_seconds()),
            post_logout_redirect_uri: None,
        }
    }

    /// Replaces the configured scopes.
    #[must_use]
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Appends one scope unless already present.
    #[must_use]
    pub fn add_scope(mut self, scope: String) -> Self {
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Sets the issuer request timeout. Sub-second precision is dropped.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the post-logout redirect URI.
    #[must_use]
    pub fn post_logout_redirect_uri(mut self, uri: Option<String>) -> Self {
        self.post_logout_redirect_uri = uri;
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> OidcConfig {
        OidcConfig {
            issuer_url: self.issuer_url,
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            scopes: self.scopes.join(","),
            request_timeout_seconds: self.request_timeout.as_secs(),
            post_logout_redirect_uri: self.post_logout_redirect_uri,
        }
    }
}
