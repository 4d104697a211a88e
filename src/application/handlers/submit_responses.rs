//! SubmitResponsesHandler - the update-confidence entry point.
//!
//! Enriches submitted answers from the question bank, maps each item to
//! its dimensions exactly once, feeds the working tracker, appends the
//! responses, and persists the new snapshot. Completion is detected here:
//! once the target total is answered at the terminal stage, the session
//! closes.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::domain::confidence::{ConfidenceTracker, ScoredResponse};
use crate::domain::dimension::DimensionMapper;
use crate::domain::foundation::{
    DomainError, ErrorCode, ItemId, Score, SessionId, Timestamp, UserId,
};
use crate::domain::session::{RecordedResponse, SessionStatus};
use crate::ports::{ItemRepository, SessionStore};

/// One answered item as submitted by the caller.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub item_id: ItemId,
    /// Normalized score on the 0-100 scale.
    pub score: f64,
    pub latency_ms: Option<u64>,
}

/// Command to record a batch of answers.
#[derive(Debug, Clone)]
pub struct SubmitResponsesCommand {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub answers: Vec<AnswerSubmission>,
}

/// Result of recording answers.
#[derive(Debug, Clone)]
pub struct SubmitResponsesResult {
    pub answered_count: usize,
    pub completed: bool,
    pub ready_for_report: bool,
}

/// Handler for answer submissions.
pub struct SubmitResponsesHandler {
    sessions: Arc<dyn SessionStore>,
    items: Arc<dyn ItemRepository>,
    config: AppConfig,
}

impl SubmitResponsesHandler {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        items: Arc<dyn ItemRepository>,
        config: AppConfig,
    ) -> Self {
        Self {
            sessions,
            items,
            config,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitResponsesCommand,
    ) -> Result<SubmitResponsesResult, DomainError> {
        if cmd.answers.is_empty() {
            return Err(DomainError::validation(
                "answers",
                "At least one answer is required",
            ));
        }

        let mut session = self.sessions.load(&cmd.session_id).await?;
        if !session.is_owner(&cmd.user_id) {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "User is not authorized to access this session",
            ));
        }

        // Batch-enrich the submitted ids before touching the session.
        let ids: Vec<ItemId> = cmd.answers.iter().map(|a| a.item_id.clone()).collect();
        let enriched = self.items.find_by_ids(&ids).await?;
        let by_id: HashMap<&ItemId, _> = enriched.iter().map(|i| (i.id(), i)).collect();

        let mut tracker =
            ConfidenceTracker::from_snapshot(session.confidence_snapshot().clone());

        let mut recorded = 0;
        for answer in &cmd.answers {
            let Some(item) = by_id.get(&answer.item_id) else {
                warn!(item_id = %answer.item_id, "skipping answer for unknown item");
                continue;
            };

            // Dimensions are computed once here and stored on the response.
            let dimensions = DimensionMapper::dimensions_of(item);
            let score = Score::new(answer.score);
            let answered_at = Timestamp::now();

            let mut scored = ScoredResponse::new(answer.item_id.clone(), score, answered_at);
            if let Some(d) = item.discrimination() {
                scored = scored.with_discrimination(d);
            }
            if let Some(ms) = answer.latency_ms {
                scored = scored.with_latency_ms(ms);
            }
            for dimension in &dimensions {
                tracker.update_confidence(dimension.clone(), scored.clone());
            }

            session.record_response(RecordedResponse {
                item_id: answer.item_id.clone(),
                score,
                latency_ms: answer.latency_ms,
                answered_at,
                dimensions,
            })?;
            recorded += 1;
        }

        if recorded == 0 {
            return Err(DomainError::validation(
                "answers",
                "No submitted item id exists in the question bank",
            ));
        }

        session.set_confidence_snapshot(tracker.to_snapshot());

        let target_total = self.config.engine.target_total;
        let completed = session.is_terminal(target_total);
        if completed && session.status() == SessionStatus::Active {
            session.complete(target_total)?;
            debug!(session_id = %cmd.session_id, "assessment completed");
        }

        self.sessions.save(&session).await?;

        Ok(SubmitResponsesResult {
            answered_count: session.answered_count(),
            completed,
            ready_for_report: tracker.is_ready_for_report(),
        })
    }
}
