//! Identity types for claims-portal.
//!
//! This crate provides:
//! - OIDC client configuration (`OidcConfig`)
//! - Verified identity-token claims (`IdentityClaims`)
//! - Server-side sessions (`Session`, `SessionId`)
//! - Authorization-code round-trip state (`AuthorizationRequest`)
//! - The session signing secret and its runtime-mode policy
//! - Authentication error types
//!
//! Nothing here performs I/O; the server crate owns the HTTP side.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use claims_portal_identity::{IdentityClaims, Session, SessionId};
//!
//! // Claims as they come out of a verified identity token
//! let now = Utc::now();
//! let identity = IdentityClaims::new(
//!     "u1".to_string(),
//!     "https://issuer.example.com/".to_string(),
//!     vec!["portal-client".to_string()],
//!     now + Duration::minutes(5),
//!     now,
//! )
//! .with_claim("name", "Alice");
//!
//! // Bind them to a new session
//! let session = Session::new(SessionId::generate(), identity.into_claims(), Duration::hours(1));
//!
//! assert_eq!(session.subject(), Some("u1"));
//! assert!(session.is_valid());
//! ```

pub mod auth;
pub mod claims;
pub mod error;
pub mod oidc;
pub mod secret;
pub mod session;

// Re-export main types at crate root
pub use auth::AuthorizationRequest;
pub use claims::{ClaimsMap, IdentityClaims};
pub use error::{AuthenticationError, SecretError};
pub use oidc::{OidcConfig, OidcConfigBuilder, REQUIRED_SCOPES};
pub use secret::{RuntimeMode, SessionSecret, looks_like_placeholder};
pub use session::{Session, SessionId};
