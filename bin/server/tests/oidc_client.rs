//! `OidcClient` against a mock identity provider.

mod common;

use claims_portal_identity::AuthenticationError;
use claims_portal_server::auth::OidcClient;
use common::*;
use serde_json::json;
use std::time::Duration;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn callback_returns_verified_subject_and_profile_claims() {
    let issuer = MockIssuer::start().await;
    let client = issuer.client().await;
    let (_, request) = client.authorization_url("/dashboard".to_string());
    issuer
        .respond_with_token(issuer.id_token("u1", "Alice", request.nonce(), chrono::Duration::minutes(5)))
        .await;

    let identity = client
        .handle_callback("abc", request.csrf_state(), &request)
        .await
        .expect("login succeeds");

    assert_eq!(identity.subject(), "u1");
    assert_eq!(identity.issuer(), issuer.uri());
    assert_eq!(identity.audiences(), [CLIENT_ID.to_string()]);

    let claims = identity.into_claims();
    assert_eq!(claims.len(), 2);
    assert_eq!(claims.get("sub"), Some(&json!("u1")));
    assert_eq!(claims.get("name"), Some(&json!("Alice")));
}

#[tokio::test]
async fn state_mismatch_is_rejected_before_token_exchange() {
    let issuer = MockIssuer::start().await;
    let client = issuer.client().await;
    let (_, request) = client.authorization_url("/dashboard".to_string());
    let before = issuer.request_count().await;

    let result = client.handle_callback("abc", "other-state", &request).await;

    assert_eq!(result, Err(AuthenticationError::StateMismatch));
    assert_eq!(issuer.request_count().await, before);
}

#[tokio::test]
async fn expired_identity_token_is_rejected() {
    let issuer = MockIssuer::start().await;
    let client = issuer.client().await;
    let (_, request) = client.authorization_url("/dashboard".to_string());
    issuer
        .respond_with_token(issuer.id_token("u1", "Alice", request.nonce(), chrono::Duration::minutes(-5)))
        .await;

    let result = client
        .handle_callback("abc", request.csrf_state(), &request)
        .await;

    assert!(
        matches!(result, Err(AuthenticationError::TokenValidation { .. })),
        "unexpected result: {result:?}"
    );
}

#[tokio::test]
async fn wrong_nonce_is_rejected() {
    let issuer = MockIssuer::start().await;
    let client = issuer.client().await;
    let (_, request) = client.authorization_url("/dashboard".to_string());
    issuer
        .respond_with_token(issuer.id_token("u1", "Alice", "some-other-nonce", chrono::Duration::minutes(5)))
        .await;

    let result = client
        .handle_callback("abc", request.csrf_state(), &request)
        .await;

    assert!(matches!(result, Err(AuthenticationError::TokenValidation { .. })));
}

#[tokio::test]
async fn token_endpoint_failure_is_a_token_exchange_error() {
    let issuer = MockIssuer::start().await;
    let client = issuer.client().await;
    let (_, request) = client.authorization_url("/dashboard".to_string());
    issuer
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .await;

    let result = client
        .handle_callback("abc", request.csrf_state(), &request)
        .await;

    assert!(matches!(result, Err(AuthenticationError::TokenExchange { .. })));
}

#[tokio::test]
async fn slow_token_endpoint_times_out() {
    let issuer = MockIssuer::start().await;
    let client = OidcClient::discover(issuer.oidc_config_with_timeout(Duration::from_secs(1)))
        .await
        .expect("discover mock issuer");
    let (_, request) = client.authorization_url("/dashboard".to_string());
    let token = issuer.id_token("u1", "Alice", request.nonce(), chrono::Duration::minutes(5));
    issuer
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": "access-token",
                    "token_type": "Bearer",
                    "id_token": token,
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .await;

    let result = client
        .handle_callback("abc", request.csrf_state(), &request)
        .await;

    assert!(matches!(result, Err(AuthenticationError::TokenExchange { .. })));
}

#[tokio::test]
async fn discovery_failure_is_reported() {
    let server = wiremock::MockServer::start().await;
    let config = claims_portal_identity::OidcConfig::new(
        server.uri(),
        CLIENT_ID.to_string(),
        None,
        REDIRECT_URI.to_string(),
    );

    let result = OidcClient::discover(config).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn logout_url_carries_client_and_return_address() {
    let issuer = MockIssuer::start().await;
    let client = issuer.client().await;

    let url = client.logout_url().expect("issuer advertises logout");

    assert_eq!(url.path(), "/v2/logout");
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("client_id".to_string(), CLIENT_ID.to_string())));
    assert!(pairs.contains(&(
        "post_logout_redirect_uri".to_string(),
        BASE_URL.to_string()
    )));
}

#[tokio::test]
async fn no_logout_url_without_end_session_endpoint() {
    let issuer = MockIssuer::start_with_logout(false).await;
    let client = issuer.client().await;

    assert!(client.logout_url().is_none());
}
