//! Dashboard page component.

use claims_portal_identity::ClaimsMap;
use leptos::prelude::*;
use serde_json::Value;

/// Shows the signed-in user's verified identity claims.
#[component]
pub fn DashboardPage(claims: ClaimsMap) -> impl IntoView {
    let greeting = display_name(&claims)
        .map(|n| format!("Welcome, {}!", n))
        .unwrap_or_else(|| "Welcome!".to_string());

    let rows = claims
        .into_iter()
        .map(|(name, value)| {
            view! {
                <tr>
                    <th scope="row">{name}</th>
                    <td>{claim_text(&value)}</td>
                </tr>
            }
        })
        .collect_view();

    view! {
        <div class="dashboard-page">
            <h1>{greeting}</h1>
            <table class="claims">
                <thead>
                    <tr><th>"Claim"</th><th>"Value"</th></tr>
                </thead>
                <tbody>{rows}</tbody>
            </table>
        </div>
    }
}

fn display_name(claims: &ClaimsMap) -> Option<String> {
    ["name", "preferred_username", "email"]
        .iter()
        .find_map(|key| claims.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Strings show bare; everything else as compact JSON.
fn claim_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
