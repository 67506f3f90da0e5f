//! Session Module
//!
//! Authentication state as seen by the dispatch core. Sessions are owned and
//! refreshed elsewhere; this crate only reads them.

mod store;

pub use store::{SessionId, SessionStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SIGN_IN_PATH;

/// Who the session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An authenticated session. Anonymous callers have no `Session` at all.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(access_token: impl Into<String>, identity: Identity) -> Self {
        Self {
            access_token: access_token.into(),
            identity,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Present, non-expired, and carrying a non-empty token
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(Utc::now())
    }
}

// The bearer token must never end up in logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("identity", &self.identity)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Supplies the current authentication state
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, or `None` for anonymous callers.
    async fn session(&self) -> Option<Session>;

    /// Path unauthenticated callers are redirected to.
    fn sign_in_redirect_target(&self) -> String {
        DEFAULT_SIGN_IN_PATH.to_string()
    }

    /// The session if present and still valid.
    async fn valid_session(&self) -> Option<Session> {
        self.session().await.filter(Session::is_valid)
    }
}

/// Provider over a fixed session value
#[derive(Debug, Clone)]
pub struct StaticSessionProvider {
    session: Option<Session>,
    sign_in_path: String,
}

impl StaticSessionProvider {
    pub fn new(session: Option<Session>, sign_in_path: impl Into<String>) -> Self {
        Self {
            session,
            sign_in_path: sign_in_path.into(),
        }
    }

    pub fn authenticated(session: Session) -> Self {
        Self::new(Some(session), DEFAULT_SIGN_IN_PATH)
    }

    pub fn anonymous() -> Self {
        Self::new(None, DEFAULT_SIGN_IN_PATH)
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn session(&self) -> Option<Session> {
        self.session.clone()
    }

    fn sign_in_redirect_target(&self) -> String {
        self.sign_in_path.clone()
    }
}
