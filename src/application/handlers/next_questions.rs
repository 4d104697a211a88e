//! NextQuestionsHandler - the get-next-batch entry point.
//!
//! Loads the session, rebuilds the working tracker from its snapshot,
//! delegates to the coordinator, records the presented ids, and persists.
//! A repository failure surfaces before any save, so no partial session
//! write can happen.

use std::sync::Arc;
use tracing::debug;

use crate::config::AppConfig;
use crate::domain::confidence::ConfidenceTracker;
use crate::domain::foundation::{DomainError, ErrorCode, SessionId, UserId};
use crate::domain::selection::{MultiStageCoordinator, QuestionBatch};
use crate::ports::{ItemRepository, SessionStore};

/// Command to fetch the next question batch for a session.
#[derive(Debug, Clone)]
pub struct NextQuestionsCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
}

/// Handler for batch selection requests.
pub struct NextQuestionsHandler {
    sessions: Arc<dyn SessionStore>,
    items: Arc<dyn ItemRepository>,
    coordinator: MultiStageCoordinator,
}

impl NextQuestionsHandler {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        items: Arc<dyn ItemRepository>,
        config: AppConfig,
    ) -> Self {
        Self {
            sessions,
            items,
            coordinator: MultiStageCoordinator::new(config),
        }
    }

    pub async fn handle(&self, cmd: NextQuestionsCommand) -> Result<QuestionBatch, DomainError> {
        let mut session = self.sessions.load(&cmd.session_id).await?;
        if !session.is_owner(&cmd.user_id) {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "User is not authorized to access this session",
            ));
        }

        // Snapshot to working structure; the tracker lives only for this
        // request.
        let tracker = ConfidenceTracker::from_snapshot(session.confidence_snapshot().clone());

        let batch = self
            .coordinator
            .get_next_questions(&mut session, &tracker, self.items.as_ref())
            .await?;

        // An exhausted terminal budget yields an empty batch; there is
        // nothing to mark in that case.
        if !batch.questions.is_empty() {
            session.mark_presented(batch.questions.iter().map(|q| q.id()))?;
        }
        self.sessions.save(&session).await?;

        debug!(
            session_id = %cmd.session_id,
            stage = batch.stage,
            questions = batch.questions.len(),
            "selected next question batch"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::InMemoryItemRepository;
    use crate::adapters::storage::InMemorySessionStore;
    use crate::domain::catalog::{Item, ItemCategory, ItemQuery};
    use crate::domain::dimension::BigFiveTrait;
    use crate::domain::foundation::ItemId;
    use crate::domain::session::AssessmentSession;
    use crate::ports::ItemOrdering;
    use async_trait::async_trait;

    fn bank() -> Vec<Item> {
        let mut items = Vec::new();
        for t in BigFiveTrait::all() {
            for facet in t.facets() {
                for n in 0..3 {
                    items.push(
                        Item::new(
                            ItemId::new(format!("{}_{}_{}", t.key(), facet, n)).unwrap(),
                            "text",
                            ItemCategory::Personality,
                        )
                        .with_trait(*t)
                        .with_facet(*facet),
                    );
                }
            }
        }
        items
    }

    struct FailingRepository;

    #[async_trait]
    impl ItemRepository for FailingRepository {
        async fn find_one(
            &self,
            _query: &ItemQuery,
            _ordering: ItemOrdering,
        ) -> Result<Option<Item>, DomainError> {
            Err(DomainError::new(
                ErrorCode::RepositoryUnavailable,
                "Simulated outage",
            ))
        }

        async fn find_many(
            &self,
            _query: &ItemQuery,
            _ordering: ItemOrdering,
            _limit: usize,
        ) -> Result<Vec<Item>, DomainError> {
            Err(DomainError::new(
                ErrorCode::RepositoryUnavailable,
                "Simulated outage",
            ))
        }

        async fn find_by_ids(&self, _ids: &[ItemId]) -> Result<Vec<Item>, DomainError> {
            Err(DomainError::new(
                ErrorCode::RepositoryUnavailable,
                "Simulated outage",
            ))
        }

        async fn count_active(&self) -> Result<usize, DomainError> {
            Ok(1000)
        }
    }

    async fn seeded_session(store: &Arc<InMemorySessionStore>) -> AssessmentSession {
        let session = AssessmentSession::new(SessionId::new(), UserId::new("u1").unwrap());
        store.save(&session).await.unwrap();
        store.load(session.id()).await.unwrap()
    }

    #[tokio::test]
    async fn presents_and_persists_the_batch() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = seeded_session(&store).await;
        let repo = Arc::new(InMemoryItemRepository::new(bank()));
        let handler =
            NextQuestionsHandler::new(store.clone(), repo, AppConfig::default());

        let batch = handler
            .handle(NextQuestionsCommand {
                session_id: *session.id(),
                user_id: UserId::new("u1").unwrap(),
            })
            .await
            .unwrap();

        assert!(!batch.questions.is_empty());
        let saved = store.load(session.id()).await.unwrap();
        assert_eq!(saved.presented().len(), batch.questions.len());
        assert_eq!(saved.version(), 2);
    }

    #[tokio::test]
    async fn wrong_user_is_forbidden() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = seeded_session(&store).await;
        let repo = Arc::new(InMemoryItemRepository::new(bank()));
        let handler = NextQuestionsHandler::new(store, repo, AppConfig::default());

        let result = handler
            .handle(NextQuestionsCommand {
                session_id: *session.id(),
                user_id: UserId::new("intruder").unwrap(),
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = Arc::new(InMemorySessionStore::new());
        let repo = Arc::new(InMemoryItemRepository::new(bank()));
        let handler = NextQuestionsHandler::new(store, repo, AppConfig::default());

        let result = handler
            .handle(NextQuestionsCommand {
                session_id: SessionId::new(),
                user_id: UserId::new("u1").unwrap(),
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn repository_outage_leaves_the_session_untouched() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = seeded_session(&store).await;
        let handler = NextQuestionsHandler::new(
            store.clone(),
            Arc::new(FailingRepository),
            AppConfig::default(),
        );

        let result = handler
            .handle(NextQuestionsCommand {
                session_id: *session.id(),
                user_id: UserId::new("u1").unwrap(),
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::RepositoryUnavailable);

        // no partial write: version and presented list unchanged
        let saved = store.load(session.id()).await.unwrap();
        assert_eq!(saved.version(), session.version());
        assert!(saved.presented().is_empty());
    }

    #[tokio::test]
    async fn small_pool_is_rejected_before_selection() {
        let store = Arc::new(InMemorySessionStore::new());
        let session = seeded_session(&store).await;
        let repo = Arc::new(InMemoryItemRepository::new(vec![Item::new(
            ItemId::new("one").unwrap(),
            "text",
            ItemCategory::Clinical,
        )]));
        let handler = NextQuestionsHandler::new(store, repo, AppConfig::default());

        let result = handler
            .handle(NextQuestionsCommand {
                session_id: *session.id(),
                user_id: UserId::new("u1").unwrap(),
            })
            .await;
        assert_eq!(
            result.unwrap_err().code,
            ErrorCode::QuestionPoolExhausted
        );
    }
}
