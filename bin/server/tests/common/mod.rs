//! Shared helpers: a mock identity provider and request utilities.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use chrono::Utc;
use claims_portal_identity::{OidcConfig, RuntimeMode, SessionSecret};
use claims_portal_server::{
    app,
    auth::{AppState, OidcClient, SessionStore},
    config::SessionConfig,
    pages::LeptosRenderer,
};
use openidconnect::core::{
    CoreIdToken, CoreIdTokenClaims, CoreJwsSigningAlgorithm, CoreRsaPrivateSigningKey,
};
use openidconnect::{
    Audience, EmptyAdditionalClaims, EndUserName, IssuerUrl, JsonWebKeyId, LocalizedClaim, Nonce,
    PrivateSigningKey, StandardClaims, SubjectIdentifier,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "portal-client";
pub const CLIENT_SECRET: &str = "portal-client-secret";
pub const BASE_URL: &str = "http://localhost:3000/";
pub const REDIRECT_URI: &str = "http://localhost:3000/callback";
pub const SESSION_SECRET: &str = "k9Jx2mQv8RtL4wNp7ZsB3cYh6FdG1aEu";

const SIGNING_KEY_PEM: &str = include_str!("../fixtures/issuer_key.pem");

/// An identity provider served by wiremock.
///
/// Discovery and JWKS are mounted on start; the token endpoint is mounted
/// per test.
pub struct MockIssuer {
    pub server: MockServer,
    key: CoreRsaPrivateSigningKey,
}

impl MockIssuer {
    /// Starts an issuer that advertises an end-session endpoint.
    pub async fn start() -> Self {
        Self::start_with_logout(true).await
    }

    /// Starts an issuer with or without an end-session endpoint.
    pub async fn start_with_logout(federated_logout: bool) -> Self {
        let server = MockServer::start().await;
        let issuer = server.uri();
        let key = CoreRsaPrivateSigningKey::from_pem(
            SIGNING_KEY_PEM,
            Some(JsonWebKeyId::new("test-key".to_string())),
        )
        .expect("load signing key");

        let mut discovery = json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}/authorize"),
            "token_endpoint": format!("{issuer}/oauth/token"),
            "jwks_uri": format!("{issuer}/.well-known/jwks.json"),
            "response_types_supported": ["code"],
            "subject_types_supported": ["public"],
            "id_token_signing_alg_values_supported": ["RS256"],
        });
        if federated_logout {
            discovery["end_session_endpoint"] = json!(format!("{issuer}/v2/logout"));
        }

        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(discovery))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "keys": [key.as_verification_key()] })),
            )
            .mount(&server)
            .await;

        Self { server, key }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn oidc_config(&self) -> OidcConfig {
        self.oidc_config_with_timeout(Duration::from_secs(20))
    }

    pub fn oidc_config_with_timeout(&self, timeout: Duration) -> OidcConfig {
        OidcConfig::builder(
            self.uri(),
            CLIENT_ID.to_string(),
            Some(CLIENT_SECRET.to_string()),
            REDIRECT_URI.to_string(),
        )
        .request_timeout(timeout)
        .post_logout_redirect_uri(Some(BASE_URL.to_string()))
        .build()
    }

    pub async fn client(&self) -> OidcClient {
        OidcClient::discover(self.oidc_config())
            .await
            .expect("discover mock issuer")
    }

    /// Builds the full application against this issuer.
    pub async fn app(&self) -> Router {
        self.app_with_static(Path::new("static")).await
    }

    pub async fn app_with_static(&self, static_dir: &Path) -> Router {
        let secret = SessionSecret::new(SESSION_SECRET.to_string(), RuntimeMode::Development)
            .expect("valid secret");
        let sessions = SessionStore::new(
            &secret,
            SessionConfig {
                duration_minutes: 60,
                secure_cookies: false,
            },
        );
        let state = AppState::new(self.client().await, sessions, Arc::new(LeptosRenderer));
        app::router(state, static_dir)
    }

    /// Signs an identity token for `subject` named `name`.
    pub fn id_token(
        &self,
        subject: &str,
        name: &str,
        nonce: &str,
        lifetime: chrono::Duration,
    ) -> CoreIdToken {
        let issued_at = Utc::now() - chrono::Duration::minutes(10);
        let mut localized_name = LocalizedClaim::new();
        localized_name.insert(None, EndUserName::new(name.to_string()));

        let claims = CoreIdTokenClaims::new(
            IssuerUrl::new(self.uri()).expect("issuer url"),
            vec![Audience::new(CLIENT_ID.to_string())],
            Utc::now() + lifetime,
            issued_at,
            StandardClaims::new(SubjectIdentifier::new(subject.to_string()))
                .set_name(Some(localized_name)),
            EmptyAdditionalClaims {},
        )
        .set_nonce(Some(Nonce::new(nonce.to_string())));

        CoreIdToken::new(
            claims,
            &self.key,
            CoreJwsSigningAlgorithm::RsaSsaPkcs1V15Sha256,
            None,
            None,
        )
        .expect("sign id token")
    }

    /// Mounts a token endpoint that returns `id_token`.
    pub async fn respond_with_token(&self, id_token: CoreIdToken) {
        self.respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-token",
            "token_type": "Bearer",
            "expires_in": 3600,
            "id_token": id_token,
        })))
        .await;
    }

    /// Mounts a token endpoint with an arbitrary response.
    pub async fn respond_with(&self, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// Number of requests the issuer has seen so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn location<B>(response: &Response<B>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Returns `name=value` for the cookie `name` set by `response`.
pub fn set_cookie<B>(response: &Response<B>, name: &str) -> Option<String> {
    set_cookie_header(response, name)
        .and_then(|header| header.split(';').next().map(str::to_string))
}

/// Returns the full `Set-Cookie` header for `name`.
pub fn set_cookie_header<B>(response: &Response<B>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(str::to_string)
}

pub fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
