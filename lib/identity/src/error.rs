//! Error types for the identity crate.
//!
//! - `AuthenticationError`: a login or session check did not succeed
//! - `SecretError`: the session signing secret violates policy

use std::fmt;

/// Errors from authentication operations.
///
/// None of these are fatal to the server. Login failures are reported to
/// the user as a generic "authentication failed"; `SessionInvalid` is
/// treated as "not logged in".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The callback `state` did not match the one issued at login, or the
    /// authorization request was unknown, expired, or already used.
    StateMismatch,
    /// The code-for-token exchange with the issuer failed (network error,
    /// timeout, non-2xx response, or no identity token returned).
    TokenExchange { reason: String },
    /// The identity token failed signature, issuer, audience, expiry or
    /// nonce verification.
    TokenValidation { reason: String },
    /// The session cookie was missing, tampered with, unknown, or expired.
    SessionInvalid,
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateMismatch => write!(f, "authorization state mismatch"),
            Self::TokenExchange { reason } => write!(f, "token exchange failed: {reason}"),
            Self::TokenValidation { reason } => {
                write!(f, "identity token validation failed: {reason}")
            }
            Self::SessionInvalid => write!(f, "session is missing or invalid"),
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from validating the session signing secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// The secret is shorter than the required minimum.
    TooShort { length: usize, minimum: usize },
    /// A placeholder secret was supplied in production.
    Placeholder,
}

impl fmt::Display for SecretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { length, minimum } => write!(
                f,
                "session secret is {length} bytes, at least {minimum} are required"
            ),
            Self::Placeholder => write!(
                f,
                "session secret is a placeholder value and cannot be used in production"
            ),
        }
    }
}

impl std::error::Error for SecretError {}
