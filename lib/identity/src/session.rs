//! Server-side sessions for authenticated users.
//!
//! A session is created after a successful OIDC login and carries the
//! verified claims of the identity token. The browser only ever holds the
//! signed [`SessionId`]; the claims stay on the server.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::claims::ClaimsMap;

/// Number of random bytes in a generated session identifier.
const SESSION_ID_BYTES: usize = 32;

/// Unique identifier for a session.
///
/// Session IDs are opaque strings. Generated IDs carry 256 bits from the
/// operating system's CSPRNG.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a session ID from an existing string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh, unguessable session ID.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; SESSION_ID_BYTES] = rand::random();
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An authenticated session bound to the claims of a verified identity token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    id: SessionId,
    /// Claims copied from the identity token at login.
    claims: ClaimsMap,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session expires.
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session valid for `duration` from now.
    #[must_use]
    pub fn new(id: SessionId, claims: ClaimsMap, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            claims,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the claims bound to this session.
    #[must_use]
    pub fn claims(&self) -> &ClaimsMap {
        &self.claims
    }

    /// Returns a single claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.get(name)
    }

    /// Returns the subject identifier, if the session carries one.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claim("sub").and_then(serde_json::Value::as_str)
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the session is still valid (not expired).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_claims() -> ClaimsMap {
        ClaimsMap::from([
            ("sub".to_string(), json!("u1")),
            ("name".to_string(), json!("Alice")),
        ])
    }

    #[test]
    fn display_prints_raw_id() {
        let id = SessionId::new("Zk3pQ0".to_string());
        assert_eq!(id.to_string(), "Zk3pQ0");
    }

    #[test]
    fn converts_from_str() {
        let id: SessionId = "abc-123".into();
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn generated_ids_are_unique_and_url_safe() {
        let a = SessionId::generate();
        let b = SessionId::generate();

        assert_ne!(a, b);
        // 32 bytes of base64url without padding
        assert_eq!(a.as_str().len(), 43);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn new_session_carries_claims() {
        let id = SessionId::generate();
        let before = Utc::now();
        let session = Session::new(id.clone(), test_claims(), Duration::hours(1));
        let after = Utc::now();

        assert_eq!(session.id(), &id);
        assert_eq!(session.claims(), &test_claims());
        assert_eq!(session.subject(), Some("u1"));
        assert_eq!(session.claim("name"), Some(&json!("Alice")));
        assert!(session.created_at() >= before);
        assert!(session.created_at() <= after);
        assert!(session.expires_at() > session.created_at());
    }

    #[test]
    fn negative_duration_is_expired() {
        let session = Session::new(
            SessionId::generate(),
            test_claims(),
            Duration::seconds(-1), // Already expired
        );

        assert!(session.is_expired());
        assert!(!session.is_valid());
    }

    #[test]
    fn positive_duration_is_valid() {
        let session = Session::new(SessionId::generate(), test_claims(), Duration::hours(1));

        assert!(!session.is_expired());
        assert!(session.is_valid());
    }

    #[test]
    fn session_without_subject() {
        let session = Session::new(SessionId::generate(), ClaimsMap::new(), Duration::hours(1));
        assert_eq!(session.subject(), None);
    }
}
