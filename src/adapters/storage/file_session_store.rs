//! File-based Session Store Adapter
//!
//! Stores each session as a JSON file named by session id. Writes go to a
//! temp file first and are renamed into place, so a crashed write never
//! leaves a torn session on disk.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::SessionId;
use crate::domain::session::AssessmentSession;
use crate::ports::{SessionStore, SessionStoreError};

/// File-backed session persistence.
#[derive(Debug)]
pub struct FileSessionStore {
    base_path: PathBuf,
    // Serializes the read-compare-write sequence in save().
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Create a new file store rooted at a base directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    fn temp_path(&self, id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{}.json.tmp", id))
    }

    async fn read_session(&self, path: &Path) -> Result<AssessmentSession, SessionStoreError> {
        let json = fs::read_to_string(path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        serde_json::from_str(&json)
            .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &AssessmentSession) -> Result<u64, SessionStoreError> {
        let _guard = self.write_lock.lock().await;

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;

        let path = self.session_path(session.id());
        if path.exists() {
            let stored = self.read_session(&path).await?;
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

        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        let tmp = self.temp_path(session.id());
        fs::write(&tmp, json)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;

        Ok(new_version)
    }

    async fn load(&self, id: &SessionId) -> Result<AssessmentSession, SessionStoreError> {
        let path = self.session_path(id);
        if !path.exists() {
            return Err(SessionStoreError::NotFound(*id));
        }
        self.read_session(&path).await
    }

    async fn exists(&self, id: &SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.session_path(id).exists())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        let path = self.session_path(id);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        }
        Ok(())
    }
}
