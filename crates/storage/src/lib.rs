use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use shared::{
    domain::{SessionId, TodoList},
    protocol::Flash,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct SessionData {
    pub lists: Vec<TodoList>,
    pub flash: Flash,
    pub last_seen: DateTime<Utc>,
}

impl SessionData {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            lists: Vec::new(),
            flash: Flash::default(),
            last_seen: now,
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.flash.error = Some(message.into());
    }

    pub fn set_success(&mut self, message: impl Into<String>) {
        self.flash.success = Some(message.into());
    }

    /// Flash messages live for exactly one render.
    pub fn take_flash(&mut self) -> Flash {
        std::mem::take(&mut self.flash)
    }
}

/// In-memory session table. Cloning shares the same table.
#[derive(Clone)]
pub struct Storage {
    sessions: Arc<Mutex<HashMap<SessionId, SessionData>>>,
    ttl: Duration,
}

impl Storage {
    /// A ttl too large for `Duration` falls back to [`DEFAULT_TTL_SECONDS`].
    pub fn new(ttl_seconds: i64) -> Self {
        let ttl = Duration::try_seconds(ttl_seconds.max(1)).unwrap_or_else(|| {
            warn!(ttl_seconds, "session ttl out of range, using default");
            Duration::seconds(DEFAULT_TTL_SECONDS)
        });
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolves the id presented by a client. Unknown or expired ids get a
    /// fresh session; the flag reports whether a new id was issued.
    pub async fn open(&self, requested: Option<SessionId>) -> (SessionId, bool) {
        self.open_at(requested, Utc::now()).await
    }

    pub async fn open_at(
        &self,
        requested: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> (SessionId, bool) {
        let mut sessions = self.sessions.lock().await;

        if let Some(session_id) = requested {
            let expired = sessions
                .get(&session_id)
                .map(|data| self.is_expired(data, now));
            match expired {
                Some(false) => {
                    if let Some(data) = sessions.get_mut(&session_id) {
                        data.last_seen = now;
                    }
                    return (session_id, false);
                }
                Some(true) => {
                    sessions.remove(&session_id);
                    debug!(%session_id, "expired session discarded");
                }
                None => {}
            }
        }

        let session_id = SessionId::generate();
        sessions.insert(session_id, SessionData::new(now));
        debug!(%session_id, "session created");
        (session_id, true)
    }

    /// Runs `f` against the session's data while holding the table lock.
    pub async fn with_session<R>(
        &self,
        session_id: SessionId,
        f: impl FnOnce(&mut SessionData) -> R,
    ) -> R {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let data = sessions
            .entry(session_id)
            .or_insert_with(|| SessionData::new(now));
        data.last_seen = now;
        f(data)
    }

    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, data| !self.is_expired(data, now));
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, remaining = sessions.len(), "expired sessions purged");
        }
        purged
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn is_expired(&self, data: &SessionData, now: DateTime<Utc>) -> bool {
        now - data.last_seen > self.ttl
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
