//! Anonymous browser sessions
//!
//! Callers without an account identify themselves with an opaque
//! `X-Session-Id` header. Each id gets its own bounded history and daily
//! usage counter, so nothing written by one browser is visible to another.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::history::LocalHistory;
use crate::usage::DailyUsage;

pub const SESSION_HEADER: &str = "x-session-id";

const MAX_SESSION_ID_LEN: usize = 128;

/// Sessions untouched for this long are dropped when the table is full
const IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Opaque client-chosen id: ASCII letters, digits, `-` and `_`
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub struct AnonymousSession {
    pub history: Arc<LocalHistory>,
    pub usage: RwLock<DailyUsage>,
    last_seen_secs: AtomicU64,
}

impl AnonymousSession {
    fn new(history_capacity: usize, now_secs: u64) -> Self {
        Self {
            history: Arc::new(LocalHistory::new(history_capacity)),
            usage: RwLock::new(DailyUsage::default()),
            last_seen_secs: AtomicU64::new(now_secs),
        }
    }

    fn touch(&self, now_secs: u64) {
        self.last_seen_secs.store(now_secs, Ordering::Relaxed);
    }

    fn idle_for(&self, now_secs: u64) -> Duration {
        Duration::from_secs(now_secs.saturating_sub(self.last_seen_secs.load(Ordering::Relaxed)))
    }
}

pub struct AnonymousSessions {
    history_capacity: usize,
    max_sessions: usize,
    epoch: Instant,
    sessions: DashMap<String, Arc<AnonymousSession>>,
}

impl AnonymousSessions {
    pub fn new(history_capacity: usize, max_sessions: usize) -> Self {
        Self {
            history_capacity,
            max_sessions,
            epoch: Instant::now(),
            sessions: DashMap::new(),
        }
    }

    /// Returns the session for `id`, creating it on first use
    pub fn session(&self, id: &str) -> Arc<AnonymousSession> {
        let now = self.epoch.elapsed().as_secs();

        if let Some(existing) = self.sessions.get(id) {
            existing.touch(now);
            return existing.value().clone();
        }

        if self.sessions.len() >= self.max_sessions {
            self.evict_idle(now);
        }

        debug!(sessions = self.sessions.len(), "Opening anonymous session");
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(AnonymousSession::new(self.history_capacity, now)))
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn evict_idle(&self, now: u64) {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.idle_for(now) < IDLE_TIMEOUT);
        let evicted = before - self.sessions.len();
        if evicted == 0 {
            warn!(
                sessions = before,
                "Anonymous session table is full and nothing is idle"
            );
        } else {
            debug!(evicted, "Evicted idle anonymous sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryStore;
    use chrono::Utc;
    use mindloom_shared::TransformationResult;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_session_id_rules() {
        assert!(is_valid_session_id("3f2b9c1e-7d4a-4b8e-9a61-2f0c5d7e8b90"));
        assert!(is_valid_session_id("tab_42"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("has space"));
        assert!(!is_valid_session_id("../etc"));
        assert!(!is_valid_session_id(&"a".repeat(MAX_SESSION_ID_LEN + 1)));
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_history_or_usage() {
        let sessions = AnonymousSessions::new(10, 100);
        let alice = sessions.session("alice");
        let bob = sessions.session("bob");

        alice
            .history
            .save(TransformationResult::new("Alice", "summary", "body"))
            .await
            .unwrap();
        alice.usage.write().await.increment(Utc::now().date_naive());

        assert!(bob.history.list().await.unwrap().is_empty());
        assert_eq!(bob.usage.read().await.used(Utc::now().date_naive()), 0);

        let alice_again = sessions.session("alice");
        assert_eq!(alice_again.history.list().await.unwrap().len(), 1);
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_full_table_keeps_active_sessions() {
        let sessions = AnonymousSessions::new(10, 1);
        sessions.session("first");
        sessions.session("second");
        // Nothing is idle yet, so both survive
        assert_eq!(sessions.len(), 2);
    }
}
