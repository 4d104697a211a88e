//! In-Memory Session Store Adapter
//!
//! Stores sessions in a map behind an async RwLock. The optimistic version
//! check runs under the write lock, so concurrent stale writes lose cleanly.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::session::AssessmentSession;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory session persistence.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, AssessmentSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored sessions (useful for tests).
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Number of stored sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &AssessmentSession) -> Result<u64, SessionStoreError> {
        let mut sessions = self.sessions.write().await;

        if let Some(stored) = sessions.get(session.id()) {
            if stored.version() != session.version() {
                return Err(SessionStoreError::VersionConflict {
                    session_id: *session.id(),
                    expected: session.version(),
                    actual: stored.version(),
                });
            }
        }

        let mut persisted = session.clone();
        persisted.bump_version();
        let new_version = persisted.version();
        sessions.insert(*session.id(), persisted);
        Ok(new_version)
    }

    async fn load(&self, id: &SessionId) -> Result<AssessmentSession, SessionStoreError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or(SessionStoreError::NotFound(*id))
    }

    async fn exists(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.read().await.contains_key(id))
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
