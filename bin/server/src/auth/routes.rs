//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use claims_portal_identity::AuthenticationError;
use serde::Deserialize;
use time::Duration as TimeDuration;

use super::{
    AppState,
    middleware::sanitize_return_to,
    pending::AUTHORIZATION_TTL_MINUTES,
    store::{SessionStore, session_id_from_jar},
};
use crate::pages::LandingView;

/// Auth state cookie name (binds the callback to the browser that started login).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// Error code put on `/login` after a failed callback.
pub const LOGIN_FAILED: &str = "authentication_failed";

/// Query parameters for the login route.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    return_to: Option<String>,
    error: Option<String>,
}

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
///
/// After a failed callback the landing page is shown with a notice instead,
/// so a broken issuer cannot cause a redirect loop.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: SignedCookieJar,
) -> Response {
    if query.error.as_deref() == Some(LOGIN_FAILED) {
        let html = state.renderer.landing(&LandingView { login_failed: true });
        return Html(html).into_response();
    }

    let return_to = sanitize_return_to(query.return_to.as_deref());
    let (auth_url, request) = state.oidc_client.authorization_url(return_to);

    let cookie = Cookie::build((AUTH_STATE_COOKIE, request.csrf_state().to_string()))
        .path("/")
        .http_only(true)
        .secure(state.sessions.config().secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(AUTHORIZATION_TTL_MINUTES));

    state.authorizations.insert(request).await;
    tracing::debug!("Redirecting to identity provider");

    (jar.add(cookie), Redirect::to(auth_url.as_str())).into_response()
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
///
/// Any failure lands on `/login?error=authentication_failed` without a
/// session; the cause is only logged.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: SignedCookieJar,
) -> Response {
    let expected_state = jar
        .get(AUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string());
    let jar = jar.remove(Cookie::build(AUTH_STATE_COOKIE).path("/"));

    match complete_login(&state, query, expected_state).await {
        Ok((session_cookie, return_to)) => {
            (jar.add(session_cookie), Redirect::to(&return_to)).into_response()
        }
        Err(error) => {
            error.log();
            let target = format!("/login?error={LOGIN_FAILED}");
            (jar, Redirect::to(&target)).into_response()
        }
    }
}

async fn complete_login(
    state: &AppState,
    query: CallbackQuery,
    expected_state: Option<String>,
) -> Result<(Cookie<'static>, String), CallbackError> {
    // Consumed up front: a failed callback still uses up its attempt.
    let request = match &expected_state {
        Some(expected) => state.authorizations.take(expected).await,
        None => None,
    };

    if let Some(error) = query.error {
        return Err(CallbackError::Provider {
            error,
            description: query.error_description,
        });
    }

    let code = query.code.ok_or(CallbackError::MissingParameter("code"))?;
    let returned_state = query.state.ok_or(CallbackError::MissingParameter("state"))?;
    expected_state.ok_or(CallbackError::MissingAuthState)?;
    let request = request.ok_or(CallbackError::UnknownAuthState)?;

    let identity = state
        .oidc_client
        .handle_callback(&code, &returned_state, &request)
        .await?;

    let session = state.sessions.create_session(identity.into_claims()).await;
    let cookie = state.sessions.session_cookie(&session);

    Ok((cookie, request.return_to().to_string()))
}

/// Logs out the user by destroying their session.
///
/// Redirects to the issuer's logout endpoint when it has one, otherwise
/// to the landing page.
pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    if let Some(session_id) = session_id_from_jar(&jar) {
        state.sessions.destroy_session(&session_id).await;
    }

    let target = state
        .oidc_client
        .logout_url()
        .map_or_else(|| "/".to_string(), |url| url.to_string());

    (
        jar.remove(SessionStore::removal_cookie()),
        Redirect::to(&target),
    )
}

/// Why a callback did not produce a session.
#[derive(Debug)]
enum CallbackError {
    Provider {
        error: String,
        description: Option<String>,
    },
    MissingParameter(&'static str),
    MissingAuthState,
    UnknownAuthState,
    Authentication(AuthenticationError),
}

impl From<AuthenticationError> for CallbackError {
    fn from(error: AuthenticationError) -> Self {
        Self::Authentication(error)
    }
}

impl CallbackError {
    fn log(&self) {
        match self {
            Self::Provider { error, description } => {
                tracing::warn!(
                    error = error.as_str(),
                    description = description.as_deref().unwrap_or_default(),
                    "Identity provider returned an error"
                );
            }
            Self::MissingParameter(name) => {
                tracing::warn!(parameter = *name, "Callback is missing a parameter");
            }
            Self::MissingAuthState => {
                tracing::warn!("Callback without auth state cookie");
            }
            Self::UnknownAuthState => {
                tracing::warn!("Callback for an unknown, used, or expired login attempt");
            }
            Self::Authentication(AuthenticationError::StateMismatch) => {
                tracing::warn!("Callback state does not match the login attempt");
            }
            Self::Authentication(e) => {
                tracing::error!(error = %e, "Login failed");
            }
        }
    }
}
