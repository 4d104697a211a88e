//! Session store port.
//!
//! Load and save are atomic per call. Saves carry an optimistic version
//! check: two concurrent submissions for the same session cannot both
//! commit, so confidence state is never double-counted or lost.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId};
use crate::domain::session::AssessmentSession;

/// Errors that can occur during session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Stale session write for {session_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        session_id: SessionId,
        expected: u64,
        actual: u64,
    },

    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<SessionStoreError> for DomainError {
    fn from(err: SessionStoreError) -> Self {
        let code = match &err {
            SessionStoreError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionStoreError::VersionConflict { .. } => ErrorCode::VersionConflict,
            SessionStoreError::SerializationFailed(_)
            | SessionStoreError::DeserializationFailed(_) => ErrorCode::SerializationFailed,
            SessionStoreError::IoError(_) => ErrorCode::StorageError,
        };
        DomainError::new(code, err.to_string())
    }
}

/// Port for persisting and loading assessment sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists the session atomically and returns the new stored version.
    ///
    /// The write succeeds only when the stored version equals the
    /// session's version (or the session is new at version 0).
    ///
    /// # Errors
    ///
    /// - `VersionConflict` on a stale write
    /// - `IoError` / `SerializationFailed` on storage failure
    async fn save(&self, session: &AssessmentSession) -> Result<u64, SessionStoreError>;

    /// Loads a session by id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no session exists for the id
    async fn load(&self, id: &SessionId) -> Result<AssessmentSession, SessionStoreError>;

    /// Checks whether a session exists.
    async fn exists(&self, id: &SessionId) -> Result<bool, SessionStoreError>;

    /// Deletes a session (primarily for tests; production sessions are
    /// retained).
    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError>;
}
