use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub use admissions_core::session::SharedSession;
use admissions_core::session::WizardSession;
use admissions_core::types::DbId;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

struct LiveSession {
    session: SharedSession,
    touched_at: Instant,
}

/// Registry of live wizard sessions keyed by account id.
pub struct WizardSessions {
    sessions: RwLock<HashMap<DbId, LiveSession>>,
    idle_timeout: Duration,
}

impl WizardSessions {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Register `session` for `user_id`, replacing any previous one.
    pub async fn insert(&self, user_id: DbId, session: WizardSession) -> SharedSession {
        let shared = Arc::new(Mutex::new(session));
        let replaced = self
            .sessions
            .write()
            .await
            .insert(
                user_id,
                LiveSession {
                    session: Arc::clone(&shared),
                    touched_at: Instant::now(),
                },
            )
            .is_some();
        tracing::debug!(user_id, replaced, "Wizard session registered");
        shared
    }

    /// The live session of `user_id`, marking it as used.
    pub async fn get(&self, user_id: DbId) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let live = sessions.get_mut(&user_id)?;
        live.touched_at = Instant::now();
        Some(Arc::clone(&live.session))
    }

    pub async fn remove(&self, user_id: DbId) -> bool {
        self.sessions.write().await.remove(&user_id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for longer than the timeout. Sessions whose lock
    /// is held (a request is in flight) are kept.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, live| {
            now.duration_since(live.touched_at) < self.idle_timeout
                || live.session.try_lock().is_err()
        });
        before - sessions.len()
    }

    pub async fn clear(&self) {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        tracing::info!(count, "Dropped all wizard sessions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admissions_core::consent::ConsentPolicy;
    use assert_matches::assert_matches;
    use admissions_core::persistence::{MemoryStore, PersistenceBridge};

    async fn session() -> WizardSession {
        let bridge = PersistenceBridge::new(Arc::new(MemoryStore::new()), "test");
        WizardSession::open(bridge, ConsentPolicy::PerSession)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_replaces_previous_session() {
        let registry = WizardSessions::new(Duration::from_secs(60));
        let first = registry.insert(1, session().await).await;
        let second = registry.insert(1, session().await).await;
        let current = registry.get(1).await.unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert!(!Arc::ptr_eq(&current, &first));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let registry = WizardSessions::new(Duration::from_secs(60));
        registry.insert(7, session().await).await;
        assert!(registry.remove(7).await);
        assert!(!registry.remove(7).await);
        assert_matches!(registry.get(7).await, None);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_unless_busy() {
        let registry = WizardSessions::new(Duration::from_millis(50));
        registry.insert(1, session().await).await;
        let busy = registry.insert(2, session().await).await;
        registry.insert(3, session().await).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        registry.get(3).await;

        let _guard = busy.lock().await;
        assert_eq!(registry.evict_idle().await, 1);
        assert_matches!(registry.get(1).await, None);
        assert!(registry.get(2).await.is_some());
        assert!(registry.get(3).await.is_some());
    }
}
