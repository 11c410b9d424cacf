//! Session signing secret and the runtime-mode policy around it.

use std::fmt;
use std::str::FromStr;

use crate::error::SecretError;

/// Minimum length, in bytes, of a session signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Secret used in development when none is configured.
pub const DEVELOPMENT_SECRET: &str = "a_long_default_dev_secret_change_me";

/// Substrings that mark a value as a placeholder rather than a real secret.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "changeme",
    "change_me",
    "change-me",
    "default",
    "example",
    "generate",
    "placeholder",
    "replace-with",
    "replace_with",
    "your-",
    "your_",
];

/// Returns true if `value` looks like a bundled placeholder credential.
#[must_use]
pub fn looks_like_placeholder(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    PLACEHOLDER_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Whether the process runs with production safeguards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    /// Local development: placeholders are tolerated with a warning.
    #[default]
    Development,
    /// Production: placeholders and insecure URLs are rejected.
    Production,
}

impl RuntimeMode {
    /// Returns true in production mode.
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Error returned for an unrecognized runtime mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(pub String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown runtime mode '{}'", self.0)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for RuntimeMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" | "test" | "" => Ok(Self::Development),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// The server-held secret that keys session cookie signatures.
///
/// The value never appears in `Debug` output.
#[derive(Clone)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Validates `secret` against the policy for `mode`.
    ///
    /// # Errors
    ///
    /// Returns `SecretError::TooShort` below [`MIN_SECRET_LEN`] bytes in any
    /// mode, and `SecretError::Placeholder` for placeholder values in
    /// production.
    pub fn new(secret: String, mode: RuntimeMode) -> Result<Self, SecretError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SecretError::TooShort {
                length: secret.len(),
                minimum: MIN_SECRET_LEN,
            });
        }
        if mode.is_production() && looks_like_placeholder(&secret) {
            return Err(SecretError::Placeholder);
        }
        Ok(Self(secret))
    }

    /// The bundled development secret. Never valid in production.
    #[must_use]
    pub fn development_default() -> Self {
        Self(DEVELOPMENT_SECRET.to_string())
    }

    /// Returns true if the secret looks like a placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        looks_like_placeholder(&self.0)
    }

    /// Returns the raw secret bytes for key derivation.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}
