//! Centralized server configuration.
//!
//! Configuration is read once at startup from environment variables via the
//! `config` crate (a `.env` file is loaded first by `main`). The raw values
//! are then validated into strongly-typed settings; anything that would make
//! the server insecure in production is a [`ConfigurationError`].
//!
//! See [`OidcConfig`](claims_portal_identity::OidcConfig) for the identity
//! provider settings.

use claims_portal_identity::{
    OidcConfig, RuntimeMode, SecretError, SessionSecret, looks_like_placeholder,
};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Path the identity provider redirects back to.
pub const CALLBACK_PATH: &str = "/callback";

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Development or production safeguards.
    pub mode: RuntimeMode,
    /// Address to listen on.
    pub listen_addr: SocketAddr,
    /// Public base URL of the application.
    pub base_url: Url,
    /// OIDC authentication configuration.
    pub oidc: OidcConfig,
    /// Session configuration.
    pub session: SessionConfig,
    /// Session cookie signing secret.
    pub secret: SessionSecret,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

/// Session-related configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session duration in minutes.
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    pub secure_cookies: bool,
}

fn default_session_duration_minutes() -> i64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            secure_cookies: true,
        }
    }
}

impl SessionConfig {
    /// Returns the session lifetime.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duration_minutes)
    }
}

/// Environment values as read, before validation.
///
/// Keys are the lowercased environment variable names.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_bind_address")]
    bind_address: String,
    secret: Option<String>,
    #[serde(default = "default_base_url")]
    base_url: String,
    issuer_base_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    oidc_scopes: Option<String>,
    #[serde(default = "default_oidc_timeout_seconds")]
    oidc_timeout_seconds: u64,
    #[serde(default = "default_session_duration_minutes")]
    session_duration_minutes: i64,
    secure_cookies: Option<bool>,
    app_env: Option<String>,
    node_env: Option<String>,
    #[serde(default = "default_static_dir")]
    static_dir: String,
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_oidc_timeout_seconds() -> u64 {
    20
}

fn default_static_dir() -> String {
    "static".to_string()
}

/// Fatal startup configuration problems.
#[derive(Debug)]
pub enum ConfigurationError {
    /// The configuration source could not be read or deserialized.
    Source(config::ConfigError),
    /// A required value is absent.
    Missing { name: &'static str },
    /// A value is present but unusable.
    Invalid { name: &'static str, reason: String },
    /// A URL must use HTTPS in production.
    InsecureUrl { name: &'static str },
    /// A placeholder credential was supplied in production.
    PlaceholderCredential { name: &'static str },
    /// The session secret violates policy.
    Secret(SecretError),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(err) => write!(f, "failed to read configuration: {err}"),
            Self::Missing { name } => write!(f, "{name} must be set"),
            Self::Invalid { name, reason } => write!(f, "{name} is invalid: {reason}"),
            Self::InsecureUrl { name } => write!(f, "{name} must use https in production"),
            Self::PlaceholderCredential { name } => {
                write!(f, "{name} is a placeholder and cannot be used in production")
            }
            Self::Secret(err) => write!(f, "SECRET is invalid: {err}"),
        }
    }
}

impl std::error::Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Secret(err) => Some(err),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        Self::Source(err)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_environment(config::Environment::default())
    }

    /// Loads configuration from an explicit variable map instead of the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_map(vars: config::Map<String, String>) -> Result<Self, ConfigurationError> {
        Self::from_environment(config::Environment::default().source(Some(vars)))
    }

    // Values stay strings until serde asks for a number or bool, so secrets
    // and IDs made of digits keep their exact text.
    fn from_environment(source: config::Environment) -> Result<Self, ConfigurationError> {
        let raw: RawSettings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> Result<Self, ConfigurationError> {
        let mode_name = raw.app_env.or(raw.node_env).unwrap_or_default();
        let mode = mode_name
            .parse::<RuntimeMode>()
            .map_err(|e| ConfigurationError::Invalid {
                name: "APP_ENV",
                reason: e.to_string(),
            })?;

        let bind_address: IpAddr =
            raw.bind_address
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigurationError::Invalid {
                    name: "BIND_ADDRESS",
                    reason: e.to_string(),
                })?;
        let listen_addr = SocketAddr::new(bind_address, raw.port);

        let base_url = parse_url("BASE_URL", &raw.base_url, mode)?;

        let issuer_url = raw
            .issuer_base_url
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigurationError::Missing {
                name: "ISSUER_BASE_URL",
            })?;
        parse_url("ISSUER_BASE_URL", &issuer_url, mode)?;

        let client_id = raw
            .client_id
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigurationError::Missing { name: "CLIENT_ID" })?;

        let client_secret = match raw.client_secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) if looks_like_placeholder(&secret) => {
                if mode.is_production() {
                    return Err(ConfigurationError::PlaceholderCredential {
                        name: "CLIENT_SECRET",
                    });
                }
                tracing::warn!("CLIENT_SECRET looks like a placeholder; token exchange will fail");
                Some(secret)
            }
            Some(secret) => Some(secret),
            None if mode.is_production() => {
                return Err(ConfigurationError::Missing {
                    name: "CLIENT_SECRET",
                });
            }
            None => {
                tracing::warn!("CLIENT_SECRET is not set; authenticating as a public client");
                None
            }
        };

        let redirect_uri = match raw.redirect_uri.filter(|s| !s.trim().is_empty()) {
            Some(uri) => parse_url("REDIRECT_URI", &uri, mode)?,
            None => base_url
                .join(CALLBACK_PATH.trim_start_matches('/'))
                .map_err(|e| ConfigurationError::Invalid {
                    name: "REDIRECT_URI",
                    reason: e.to_string(),
                })?,
        };
        if redirect_uri.host_str() != base_url.host_str() {
            return Err(ConfigurationError::Invalid {
                name: "REDIRECT_URI",
                reason: format!(
                    "host {:?} does not match BASE_URL host {:?}",
                    redirect_uri.host_str().unwrap_or_default(),
                    base_url.host_str().unwrap_or_default()
                ),
            });
        }
        if !redirect_uri.path().ends_with(CALLBACK_PATH) {
            return Err(ConfigurationError::Invalid {
                name: "REDIRECT_URI",
                reason: format!("path must end with {CALLBACK_PATH}"),
            });
        }

        if raw.oidc_timeout_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                name: "OIDC_TIMEOUT_SECONDS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if raw.session_duration_minutes <= 0 {
            return Err(ConfigurationError::Invalid {
                name: "SESSION_DURATION_MINUTES",
                reason: "must be greater than zero".to_string(),
            });
        }

        let secret = match raw.secret.filter(|s| !s.is_empty()) {
            Some(secret) => {
                let secret =
                    SessionSecret::new(secret, mode).map_err(ConfigurationError::Secret)?;
                if secret.is_placeholder() {
                    tracing::warn!("SECRET looks like a placeholder; never deploy this value");
                }
                secret
            }
            None if mode.is_production() => {
                return Err(ConfigurationError::Missing { name: "SECRET" });
            }
            None => {
                tracing::warn!(
                    "SECRET is not set; signing sessions with the bundled development secret"
                );
                SessionSecret::development_default()
            }
        };

        let mut oidc = OidcConfig::builder(
            issuer_url,
            client_id,
            client_secret,
            redirect_uri.to_string(),
        )
        .request_timeout(Duration::from_secs(raw.oidc_timeout_seconds))
        .post_logout_redirect_uri(Some(base_url.to_string()));
        if let Some(scopes) = raw.oidc_scopes {
            oidc = oidc.scopes(scopes.split(',').map(|s| s.trim().to_string()).collect());
        }

        let session = SessionConfig {
            duration_minutes: raw.session_duration_minutes,
            secure_cookies: raw.secure_cookies.unwrap_or(mode.is_production()),
        };

        Ok(Self {
            mode,
            listen_addr,
            base_url,
            oidc: oidc.build(),
            session,
            secret,
            static_dir: PathBuf::from(raw.static_dir),
        })
    }
}

fn parse_url(name: &'static str, value: &str, mode: RuntimeMode) -> Result<Url, ConfigurationError> {
    let url = Url::parse(value).map_err(|e| ConfigurationError::Invalid {
        name,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if !mode.is_production() => Ok(url),
        "http" => Err(ConfigurationError::InsecureUrl { name }),
        other => Err(ConfigurationError::Invalid {
            name,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
