//! OIDC client implementation using the openidconnect crate.

use claims_portal_identity::{AuthenticationError, AuthorizationRequest, IdentityClaims, OidcConfig};
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreIdTokenClaims};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, PkceCodeChallenge, PkceCodeVerifier,
    ProviderMetadataWithLogout, RedirectUrl, Scope, TokenResponse,
};
use url::Url;

/// Client built from discovered metadata: authorization endpoint known,
/// token and userinfo endpoints as advertised.
type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// OIDC client for authenticating users.
///
/// Holds the provider metadata fetched at startup. Nothing else survives
/// between calls.
pub struct OidcClient {
    provider_metadata: ProviderMetadataWithLogout,
    http_client: reqwest::Client,
    client_id: ClientId,
    client_secret: Option<ClientSecret>,
    redirect_url: RedirectUrl,
    config: OidcConfig,
}

impl OidcClient {
    /// Creates a new OIDC client by discovering the provider metadata.
    pub async fn discover(config: OidcConfig) -> Result<Self, OidcError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid issuer URL: {}", e)))?;

        let http_client = build_http_client(&config)?;

        let provider_metadata =
            ProviderMetadataWithLogout::discover_async(issuer_url, &http_client)
                .await
                .map_err(|e| OidcError::Discovery(format!("failed to discover provider: {}", e)))?;

        tracing::info!(
            issuer = config.issuer_url(),
            federated_logout = provider_metadata
                .additional_metadata()
                .end_session_endpoint
                .is_some(),
            "Discovered OIDC provider"
        );

        Self::assemble(config, provider_metadata, http_client)
    }

    fn assemble(
        config: OidcConfig,
        provider_metadata: ProviderMetadataWithLogout,
        http_client: reqwest::Client,
    ) -> Result<Self, OidcError> {
        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string())
            .map_err(|e| OidcError::Configuration(format!("invalid redirect URI: {}", e)))?;

        let client_id = ClientId::new(config.client_id().to_string());
        let client_secret = config
            .client_secret()
            .map(|secret| ClientSecret::new(secret.to_string()));

        Ok(Self {
            provider_metadata,
            http_client,
            client_id,
            client_secret,
            redirect_url,
            config,
        })
    }

    fn client(&self) -> DiscoveredClient {
        CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }

    /// Generates the authorization URL for redirecting the user.
    ///
    /// The returned request must be kept until the callback arrives; it
    /// carries the PKCE verifier and nonce needed to finish the login.
    pub fn authorization_url(&self, return_to: String) -> (Url, AuthorizationRequest) {
        let client = self.client();

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // "openid" is always sent by the authentication flow itself
        for scope in self.config.scopes() {
            if scope != "openid" {
                auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
            }
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let request = AuthorizationRequest::new(
            csrf_token.secret().clone(),
            pkce_verifier.secret().clone(),
            nonce.secret().clone(),
            return_to,
        );

        (auth_url, request)
    }

    /// Completes a login: checks `state`, redeems `code` and verifies the
    /// identity token.
    ///
    /// Verification covers the signature against the issuer's keys, `iss`,
    /// `aud`, `exp` and the nonce.
    pub async fn handle_callback(
        &self,
        code: &str,
        state: &str,
        request: &AuthorizationRequest,
    ) -> Result<IdentityClaims, AuthenticationError> {
        if state != request.csrf_state() {
            return Err(AuthenticationError::StateMismatch);
        }

        let client = self.client();

        let token_request = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| AuthenticationError::TokenExchange {
                reason: format!("token endpoint error: {}", e),
            })?;

        let token_response = token_request
            .set_pkce_verifier(PkceCodeVerifier::new(request.pkce_verifier().to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthenticationError::TokenExchange {
                reason: format!("token exchange failed: {}", e),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| AuthenticationError::TokenExchange {
                reason: "no ID token in response".to_string(),
            })?;

        let nonce = Nonce::new(request.nonce().to_string());
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| AuthenticationError::TokenValidation {
                reason: format!("ID token validation failed: {}", e),
            })?;

        Ok(identity_claims(claims))
    }

    /// Builds the issuer's federated logout URL, if it advertises one.
    pub fn logout_url(&self) -> Option<Url> {
        let endpoint = self
            .provider_metadata
            .additional_metadata()
            .end_session_endpoint
            .as_ref()?;

        let mut url = endpoint.url().clone();
        let query: Vec<(String, String)> = url
            .query_pairs()
            .into_owned()
            .filter(|(k, _)| k != "client_id" && k != "post_logout_redirect_uri")
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &query {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("client_id", self.config.client_id());
            if let Some(post_logout) = self.config.post_logout_redirect_uri() {
                pairs.append_pair("post_logout_redirect_uri", post_logout);
            }
        }
        Some(url)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OidcConfig {
        &self.config
    }
}

fn build_http_client(config: &OidcConfig) -> Result<reqwest::Client, OidcError> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| OidcError::Configuration(format!("failed to create HTTP client: {}", e)))
}

/// Copies the subject and profile claims out of a verified token.
///
/// Protocol claims (`iss`, `aud`, `exp`, `iat`, `nonce`) are kept on the
/// struct but not in the claims map shown to the user.
fn identity_claims(claims: &CoreIdTokenClaims) -> IdentityClaims {
    IdentityClaims::new(
        claims.subject().as_str().to_string(),
        claims.issuer().as_str().to_string(),
        claims
            .audiences()
            .iter()
            .map(|a| a.as_str().to_string())
            .collect(),
        claims.expiration(),
        claims.issue_time(),
    )
    .with_optional_claim(
        "name",
        claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string()),
    )
    .with_optional_claim(
        "given_name",
        claims
            .given_name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string()),
    )
    .with_optional_claim(
        "family_name",
        claims
            .family_name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string()),
    )
    .with_optional_claim(
        "nickname",
        claims
            .nickname()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string()),
    )
    .with_optional_claim(
        "preferred_username",
        claims.preferred_username().map(|u| u.as_str().to_string()),
    )
    .with_optional_claim("email", claims.email().map(|e| e.as_str().to_string()))
    .with_optional_claim("email_verified", claims.email_verified())
    .with_optional_claim(
        "picture",
        claims
            .picture()
            .and_then(|p| p.get(None))
            .map(|p| p.as_str().to_string()),
    )
    .with_optional_claim("locale", claims.locale().map(|l| l.as_str().to_string()))
}

/// OIDC setup errors. Fatal at startup.
#[derive(Debug)]
pub enum OidcError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
}

impl std::fmt::Display for OidcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
        }
    }
}

impl std::error::Error for OidcError {}
