//! Authentication gate and extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use claims_portal_identity::{AuthenticationError, Session};
use url::form_urlencoded;

use super::{AppState, store::SessionStore};

/// Where users land after login when no usable return target is given.
pub const DEFAULT_RETURN_TO: &str = "/dashboard";

/// Outcome of checking a request against the gate.
#[derive(Debug)]
pub enum GateDecision {
    /// The request carries a valid session.
    Allow(Session),
    /// The request must go through login first.
    Deny { redirect_to: String },
}

/// Decides whether a request may reach a protected route.
///
/// Absent, tampered and expired sessions are indistinguishable to the
/// caller: all of them produce the same redirect.
#[derive(Clone)]
pub struct AuthGate {
    sessions: SessionStore,
}

impl AuthGate {
    /// Creates a gate backed by `sessions`.
    #[must_use]
    pub fn new(sessions: SessionStore) -> Self {
        Self { sessions }
    }

    /// Checks the session cookie in `headers` for a request to `requested_path`.
    pub async fn authorize(&self, headers: &HeaderMap, requested_path: &str) -> GateDecision {
        match self.sessions.load_session(headers).await {
            Some(session) => GateDecision::Allow(session),
            None => {
                tracing::debug!(
                    path = requested_path,
                    error = %AuthenticationError::SessionInvalid,
                    "Denied request without a valid session"
                );
                GateDecision::Deny {
                    redirect_to: login_redirect(requested_path),
                }
            }
        }
    }
}

/// Builds `/login?return_to=<path>` for a denied request.
#[must_use]
pub fn login_redirect(requested_path: &str) -> String {
    let target = sanitize_return_to(Some(requested_path));
    let encoded: String = form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("/login?return_to={encoded}")
}

/// Restricts a post-login target to a local absolute path.
///
/// Anything that could leave the site (scheme, `//host`, backslashes) is
/// replaced by [`DEFAULT_RETURN_TO`].
#[must_use]
pub fn sanitize_return_to(target: Option<&str>) -> String {
    match target {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => DEFAULT_RETURN_TO.to_string(),
    }
}

/// Extractor for requiring a valid session.
///
/// If there is none, the user is redirected to the login page.
pub struct RequireSession(pub Session);

impl<S> FromRequestParts<S> for RequireSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let path = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());

        match app_state.gate.authorize(&parts.headers, path).await {
            GateDecision::Allow(session) => Ok(RequireSession(session)),
            GateDecision::Deny { redirect_to } => Err(AuthRejection { redirect_to }),
        }
    }
}

/// Rejection for [`RequireSession`]: a redirect to login.
#[derive(Debug)]
pub struct AuthRejection {
    redirect_to: String,
}

impl AuthRejection {
    /// Where the user is being sent.
    #[must_use]
    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        Redirect::to(&self.redirect_to).into_response()
    }
}
