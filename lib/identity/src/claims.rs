//! Verified identity-token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Claim name to claim value, ordered by name.
pub type ClaimsMap = BTreeMap<String, Value>;

/// Claims decoded from an identity token whose signature, issuer, audience,
/// expiry and nonce have already been verified.
///
/// The protocol claims (`iss`, `aud`, `exp`, `iat`) are exposed as typed
/// fields. The user-facing claims, `sub` plus any profile claims present in
/// the token, are kept in [`IdentityClaims::claims`] and are what gets copied
/// into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    subject: String,
    issuer: String,
    audiences: Vec<String>,
    expires_at: DateTime<Utc>,
    issued_at: DateTime<Utc>,
    claims: ClaimsMap,
}

impl IdentityClaims {
    /// Creates a claim set holding only the subject.
    #[must_use]
    pub fn new(
        subject: String,
        issuer: String,
        audiences: Vec<String>,
        expires_at: DateTime<Utc>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let claims = ClaimsMap::from([("sub".to_string(), Value::String(subject.clone()))]);
        Self {
            subject,
            issuer,
            audiences,
            expires_at,
            issued_at,
            claims,
        }
    }

    /// Adds a profile claim.
    #[must_use]
    pub fn with_claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    /// Adds a profile claim when the token carried it.
    #[must_use]
    pub fn with_optional_claim<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_claim(name, value),
            None => self,
        }
    }

    /// Returns the subject identifier (`sub`).
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the issuer (`iss`).
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the audiences (`aud`).
    #[must_use]
    pub fn audiences(&self) -> &[String] {
        &self.audiences
    }

    /// Returns the token expiry (`exp`).
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the token issue time (`iat`).
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the user-facing claims.
    #[must_use]
    pub fn claims(&self) -> &ClaimsMap {
        &self.claims
    }

    /// Consumes the claim set, returning the user-facing claims.
    #[must_use]
    pub fn into_claims(self) -> ClaimsMap {
        self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn alice() -> IdentityClaims {
        let now = Utc::now();
        IdentityClaims::new(
            "u1".to_string(),
            "https://issuer.example.com/".to_string(),
            vec!["portal-client".to_string()],
            now + Duration::minutes(5),
            now,
        )
    }

    #[test]
    fn subject_is_always_a_claim() {
        let claims = alice();
        assert_eq!(claims.subject(), "u1");
        assert_eq!(claims.claims().get("sub"), Some(&json!("u1")));
        assert_eq!(claims.claims().len(), 1);
    }

    #[test]
    fn claims_builder() {
        let claims = alice()
            .with_claim("name", "Alice")
            .with_optional_claim("email", Some("alice@example.com"))
            .with_optional_claim::<String>("nickname", None)
            .with_optional_claim("email_verified", Some(true));

        assert_eq!(claims.issuer(), "https://issuer.example.com/");
        assert_eq!(claims.audiences(), ["portal-client".to_string()]);
        assert_eq!(claims.claims().get("name"), Some(&json!("Alice")));
        assert_eq!(claims.claims().get("email_verified"), Some(&json!(true)));
        assert!(!claims.claims().contains_key("nickname"));
    }

    #[test]
    fn into_claims_excludes_protocol_claims() {
        let map = alice().with_claim("name", "Alice").into_claims();

        let expected = ClaimsMap::from([
            ("name".to_string(), json!("Alice")),
            ("sub".to_string(), json!("u1")),
        ]);
        assert_eq!(map, expected);
    }
}
