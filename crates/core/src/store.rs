use crate::session::{Session, SessionSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to one session. Holding the lock is what serializes turns
/// on the same session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Where sessions live between turns.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<SessionHandle>;

    async fn put(&self, session: Session) -> SessionHandle;

    /// Removes a session, returning whether it existed.
    async fn delete(&self, session_id: &str) -> bool;

    /// Summaries of every session that has not been evicted, ended ones included.
    async fn list_active(&self) -> Vec<SessionSummary>;

    /// Evicts sessions idle for longer than `ttl` and returns their ids.
    async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<String>;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn put(&self, session: Session) -> SessionHandle {
        let id = session.session_id().to_string();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    async fn delete(&self, session_id: &str) -> bool {
        let handle = self.sessions.write().await.remove(session_id);
        match handle {
            Some(handle) => {
                // Wait out any turn still running on it.
                drop(handle.lock().await);
                true
            }
            None => false,
        }
    }

    async fn list_active(&self) -> Vec<SessionSummary> {
        let handles: Vec<SessionHandle> = self.sessions.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.lock().await.summary());
        }
        summaries.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        summaries
    }

    async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<String> {
        let candidates: Vec<(String, SessionHandle)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();

        let mut evicted = Vec::new();
        for (id, handle) in candidates {
            // Taking the session lock first means a turn in flight finishes
            // (and refreshes last activity) before expiry is judged.
            let session = handle.lock().await;
            if !session.is_expired(now, ttl) {
                continue;
            }
            let mut sessions = self.sessions.write().await;
            if sessions
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &handle))
            {
                sessions.remove(&id);
                tracing::info!("Cleaned up expired session: {}", id);
                evicted.push(id);
            }
            drop(session);
        }
        evicted
    }
}
