//! Page components for the application.
//!
//! Pages are Leptos components rendered to HTML on the server. Handlers
//! never call them directly; they go through a [`ViewRenderer`] so the
//! markup can be swapped without touching routing or authentication.

pub mod dashboard;
pub mod landing;

pub use dashboard::DashboardPage;
pub use landing::LandingPage;

use claims_portal_identity::ClaimsMap;
use leptos::prelude::*;

/// Data for the public landing page.
#[derive(Debug, Clone, Default)]
pub struct LandingView {
    /// Set when the previous login attempt failed.
    pub login_failed: bool,
}

/// Data for the dashboard: verified claims only, never a raw token.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub claims: ClaimsMap,
}

/// Turns view data into an HTML document.
pub trait ViewRenderer: Send + Sync {
    fn landing(&self, view: &LandingView) -> String;
    fn dashboard(&self, view: &DashboardView) -> String;
}

/// Server-side Leptos renderer. All text is HTML-escaped.
#[derive(Debug, Clone, Default)]
pub struct LeptosRenderer;

impl ViewRenderer for LeptosRenderer {
    fn landing(&self, view: &LandingView) -> String {
        let login_failed = view.login_failed;
        render_document("claims-portal", move || {
            view! { <LandingPage login_failed=login_failed/> }
        })
    }

    fn dashboard(&self, view: &DashboardView) -> String {
        let claims = view.claims.clone();
        render_document("Dashboard - claims-portal", move || {
            view! { <DashboardPage claims=claims/> }
        })
    }
}

fn render_document<F, V>(title: &'static str, body: F) -> String
where
    F: FnOnce() -> V,
    V: IntoView + 'static,
{
    Owner::new().with(|| {
        let content = body();
        view! {
            <!DOCTYPE html>
            <html lang="en">
                <head>
                    <meta charset="utf-8"/>
                    <meta name="viewport" content="width=device-width, initial-scale=1"/>
                    <title>{title}</title>
                    <link rel="stylesheet" href="/static/main.css"/>
                </head>
                <body>
                    <Header/>
                    <main class="container">{content}</main>
                </body>
            </html>
        }
        .to_html()
    })
}

/// Header component with navigation.
#[component]
fn Header() -> impl IntoView {
    view! {
        <header class="header">
            <div class="header-left">
                <a href="/" class="logo">"claims-portal"</a>
            </div>
            <nav class="header-right">
                <a href="/dashboard">"Dashboard"</a>
                <a href="/logout">"Log out"</a>
            </nav>
        </header>
    }
}
