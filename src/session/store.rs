//! In-memory session store keyed by an opaque session id.
//! The relay server uses it to resolve the session behind a browser cookie.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::Session;

pub type SessionId = String;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session created at login and hand back its id.
    /// Expired sessions are swept out on every insert.
    pub async fn insert(&self, session: Session) -> SessionId {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        let swept = sweep(&mut sessions);
        if swept > 0 {
            debug!("Swept {} expired session(s)", swept);
        }
        sessions.insert(id.clone(), session);
        id
    }

    /// Look up a session. Expired entries are evicted and reported as absent.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(id).cloned()?
        };

        if session.is_expired_at(Utc::now()) {
            debug!("Evicting expired session {}", id);
            self.sessions.write().await.remove(id);
            return None;
        }
        Some(session)
    }

    /// Logout.
    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn sweep(sessions: &mut HashMap<SessionId, Session>) -> usize {
    let now = Utc::now();
    let before = sessions.len();
    sessions.retain(|_, session| !session.is_expired_at(now));
    before - sessions.len()
}
