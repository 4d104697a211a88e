//! CreateSessionHandler - starts a fresh assessment session.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, SessionId, UserId};
use crate::domain::session::AssessmentSession;
use crate::ports::SessionStore;

/// Command to create a new assessment session.
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub user_id: UserId,
}

/// Handler for creating sessions.
pub struct CreateSessionHandler {
    sessions: Arc<dyn SessionStore>,
}

impl CreateSessionHandler {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    pub async fn handle(
        &self,
        cmd: CreateSessionCommand,
    ) -> Result<AssessmentSession, DomainError> {
        let session = AssessmentSession::new(SessionId::new(), cmd.user_id);
        self.sessions.save(&session).await?;
        // Return the persisted view so the caller holds the saved version.
        Ok(self.sessions.load(session.id()).await?)
    }
}
