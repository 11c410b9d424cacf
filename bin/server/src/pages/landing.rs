//! Landing page component.

use leptos::prelude::*;

/// Public landing page with a login link.
#[component]
pub fn LandingPage(login_failed: bool) -> impl IntoView {
    view! {
        <div class="landing-page">
            <h1>"claims-portal"</h1>
            <p>"Sign in with your identity provider to see the claims it shares about you."</p>
            {login_failed.then(|| view! {
                <p class="notice notice-error">"Authentication failed. Please try again."</p>
            })}
            <a href="/login" class="login-button">"Log in"</a>
        </div>
    }
}
