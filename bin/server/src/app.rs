//! Page handlers and routing.

use axum::{
    Router,
    extract::State,
    response::Html,
    routing::get,
};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::auth::{self, AppState, RequireSession};
use crate::pages::{DashboardView, LandingView};

/// Public landing page. Never touches the session or the issuer.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.renderer.landing(&LandingView::default()))
}

/// Shows the verified claims of the current session.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> Html<String> {
    let view = DashboardView {
        claims: session.claims().clone(),
    };
    Html(state.renderer.dashboard(&view))
}

/// Builds the application router.
pub fn router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/dashboard", get(dashboard))
        .route("/logout", get(auth::logout))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
