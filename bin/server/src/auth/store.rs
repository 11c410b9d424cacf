//! Server-side session storage and signed session cookies.
//!
//! The browser holds only the session ID, in a cookie signed with a key
//! derived from the server secret. Claims live in a [`SessionBackend`].
//! Every failure to load a session (missing, tampered or malformed cookie,
//! unknown ID, expiry) reads as "no session".

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use claims_portal_identity::{ClaimsMap, Session, SessionId, SessionSecret};
use sha2::{Digest, Sha512};
use std::collections::HashMap;
use std::sync::Arc;
use time::Duration as TimeDuration;
use tokio::sync::RwLock;

use crate::config::SessionConfig;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Storage for sessions keyed by ID.
///
/// Implementations must make each operation atomic per key.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Stores a session, replacing any with the same ID.
    async fn insert(&self, session: Session);

    /// Looks up a session by ID.
    async fn get(&self, id: &SessionId) -> Option<Session>;

    /// Removes a session. Returns true if one was present.
    async fn remove(&self, id: &SessionId) -> bool;

    /// Removes every expired session, returning how many were dropped.
    async fn remove_expired(&self) -> usize;
}

/// In-process session backend.
#[derive(Default)]
pub struct MemoryBackend {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn insert(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session);
    }

    async fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn remove_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_valid());
        before - sessions.len()
    }
}

/// Issues, validates and destroys sessions.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
    key: Key,
    config: SessionConfig,
}

impl SessionStore {
    /// Creates a store backed by process memory.
    #[must_use]
    pub fn new(secret: &SessionSecret, config: SessionConfig) -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()), secret, config)
    }

    /// Creates a store over an explicit backend.
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn SessionBackend>,
        secret: &SessionSecret,
        config: SessionConfig,
    ) -> Self {
        Self {
            backend,
            key: derive_key(secret),
            config,
        }
    }

    /// Returns the cookie signing key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates and stores a session holding `claims`.
    pub async fn create_session(&self, claims: ClaimsMap) -> Session {
        self.purge_expired().await;

        let session = Session::new(SessionId::generate(), claims, self.config.duration());
        self.backend.insert(session.clone()).await;
        tracing::info!(
            subject = session.subject().unwrap_or_default(),
            expires_at = %session.expires_at(),
            "Created session"
        );
        session
    }

    /// Builds the session cookie for `session`.
    ///
    /// The value is the bare session ID; adding the cookie to a
    /// [`SignedCookieJar`] keyed with [`SessionStore::key`] signs it.
    #[must_use]
    pub fn session_cookie(&self, session: &Session) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, session.id().as_str().to_string()))
            .path("/")
            .http_only(true)
            .secure(self.config.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(TimeDuration::minutes(self.config.duration_minutes))
            .build()
    }

    /// Builds a cookie that clears the session cookie in the browser.
    #[must_use]
    pub fn removal_cookie() -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE).path("/").build()
    }

    /// Loads the session named by the signed cookie in `headers`.
    ///
    /// The raw cookie must be in the exact encoding this server emits;
    /// percent-encoding variants of a valid value are rejected.
    pub async fn load_session(&self, headers: &HeaderMap) -> Option<Session> {
        if !session_cookie_is_canonical(headers) {
            tracing::debug!("Rejected non-canonical session cookie");
            return None;
        }
        let jar = SignedCookieJar::from_headers(headers, self.key.clone());
        self.load_from_jar(&jar).await
    }

    /// Loads the session named by the signed cookie in `jar`.
    pub async fn load_from_jar(&self, jar: &SignedCookieJar) -> Option<Session> {
        let id = session_id_from_jar(jar)?;
        let session = self.backend.get(&id).await?;
        if session.is_expired() {
            self.backend.remove(&id).await;
            tracing::debug!("Evicted expired session");
            return None;
        }
        Some(session)
    }

    /// Drops every expired session, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let purged = self.backend.remove_expired().await;
        if purged > 0 {
            tracing::debug!(purged_sessions = purged, "Dropped expired sessions");
        }
        purged
    }

    /// Invalidates a session. Destroying an unknown or already destroyed
    /// session is a no-op.
    pub async fn destroy_session(&self, id: &SessionId) {
        if self.backend.remove(id).await {
            tracing::info!("Destroyed session");
        }
    }
}

/// Returns the verified session ID from a signed jar.
///
/// `None` if the cookie is absent or its signature does not verify.
#[must_use]
pub fn session_id_from_jar(jar: &SignedCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| SessionId::new(cookie.value().to_string()))
}

/// Returns false if any `session` cookie in `headers` differs from the
/// encoding of its own decoded value.
///
/// Decoding folds `%3D`, `%3d` and similar spellings together, so the
/// signature alone cannot tell them apart.
fn session_cookie_is_canonical(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .all(|pair| match Cookie::parse_encoded(pair) {
            Ok(cookie) if cookie.name() == SESSION_COOKIE => {
                cookie.stripped().encoded().to_string() == pair.trim()
            }
            _ => true,
        })
}

/// Expands the secret into the 64 bytes of key material cookie signing needs.
fn derive_key(secret: &SessionSecret) -> Key {
    let digest = Sha512::digest(secret.expose());
    Key::from(digest.as_slice())
}
