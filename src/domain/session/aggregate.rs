//! AssessmentSession aggregate entity.
//!
//! The session is the unit of persistence and concurrency: one respondent
//! working through one assessment. Confidence lives on it only as a
//! serialized snapshot; the working tracker is rebuilt per request.
//!
//! # Invariants
//!
//! - `stage` is monotonic non-decreasing
//! - `presented` contains no duplicate item ids
//! - a completed session cannot be mutated

use serde::{Deserialize, Serialize};

use crate::domain::confidence::ConfidenceSnapshot;
use crate::domain::dimension::DimensionKey;
use crate::domain::foundation::{
    DomainError, ErrorCode, ItemId, Score, SessionId, Timestamp, UserId,
};
use crate::domain::selection::Stage;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// One answered item with its pre-computed dimension keys.
///
/// Dimension mapping happens exactly once, at submission; the keys are
/// stored so nothing downstream re-derives them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResponse {
    pub item_id: ItemId,
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    pub answered_at: Timestamp,
    pub dimensions: Vec<DimensionKey>,
}

/// A stage boundary crossed by this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from_stage: Stage,
    pub completed_at: Timestamp,
    pub question_count: usize,
    pub confidence: ConfidenceSnapshot,
}

/// The assessment session aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    id: SessionId,
    user_id: UserId,
    stage: Stage,
    status: SessionStatus,
    responses: Vec<RecordedResponse>,
    presented: Vec<ItemId>,
    confidence: ConfidenceSnapshot,
    stage_history: Vec<StageTransition>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl AssessmentSession {
    /// Creates a fresh session at Stage 1 with empty state.
    pub fn new(id: SessionId, user_id: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            user_id,
            stage: Stage::BroadScreening,
            status: SessionStatus::Active,
            responses: Vec::new(),
            presented: Vec::new(),
            confidence: ConfidenceSnapshot::default(),
            stage_history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes a session from persistence (no validation, no events).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        user_id: UserId,
        stage: Stage,
        status: SessionStatus,
        responses: Vec<RecordedResponse>,
        presented: Vec<ItemId>,
        confidence: ConfidenceSnapshot,
        stage_history: Vec<StageTransition>,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            stage,
            status,
            responses,
            presented,
            confidence,
            stage_history,
            version,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn responses(&self) -> &[RecordedResponse] {
        &self.responses
    }

    /// Number of answered items.
    pub fn answered_count(&self) -> usize {
        self.responses.len()
    }

    /// Item ids presented so far, in presentation order.
    pub fn presented(&self) -> &[ItemId] {
        &self.presented
    }

    pub fn confidence_snapshot(&self) -> &ConfidenceSnapshot {
        &self.confidence
    }

    pub fn stage_history(&self) -> &[StageTransition] {
        &self.stage_history
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Checks if the given user owns this session.
    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Records that items were presented to the respondent.
    ///
    /// # Errors
    ///
    /// - `SessionCompleted` if the session is finished
    /// - `DuplicateItemPresented` if any id was already presented
    pub fn mark_presented<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a ItemId>,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;
        for id in ids {
            if self.presented.contains(id) {
                return Err(DomainError::new(
                    ErrorCode::DuplicateItemPresented,
                    format!("Item '{}' was already presented in this session", id),
                ));
            }
            self.presented.push(id.clone());
        }
        self.touch();
        Ok(())
    }

    /// Appends an answered response to the history.
    ///
    /// # Errors
    ///
    /// - `SessionCompleted` if the session is finished
    pub fn record_response(&mut self, response: RecordedResponse) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.responses.push(response);
        self.touch();
        Ok(())
    }

    /// Replaces the confidence snapshot after a tracker round-trip.
    pub fn set_confidence_snapshot(&mut self, snapshot: ConfidenceSnapshot) {
        self.confidence = snapshot;
        self.touch();
    }

    /// Advances to a later stage, recording the transition.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` on any backwards move
    pub fn advance_stage(&mut self, target: Stage) -> Result<(), DomainError> {
        if !self.stage.can_advance_to(target) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot move from stage {} back to stage {}",
                    self.stage.number(),
                    target.number()
                ),
            ));
        }
        if target == self.stage {
            return Ok(());
        }
        self.stage_history.push(StageTransition {
            from_stage: self.stage,
            completed_at: Timestamp::now(),
            question_count: self.responses.len(),
            confidence: self.confidence.clone(),
        });
        self.stage = target;
        self.touch();
        Ok(())
    }

    /// Marks the session completed once the target total is answered.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if not at the terminal stage or short of
    ///   the target
    pub fn complete(&mut self, target_total: usize) -> Result<(), DomainError> {
        if !self.stage.is_terminal() || self.responses.len() < target_total {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Session cannot complete at stage {} with {} of {} answers",
                    self.stage.number(),
                    self.responses.len(),
                    target_total
                ),
            ));
        }
        self.status = SessionStatus::Completed;
        self.touch();
        Ok(())
    }

    /// True once the configured total is answered at the terminal stage.
    pub fn is_terminal(&self, target_total: usize) -> bool {
        self.stage.is_terminal() && self.responses.len() >= target_total
    }

    /// Bumps the optimistic-concurrency version. Called by stores on save.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────

    fn ensure_active(&self) -> Result<(), DomainError> {
        match self.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Completed => Err(DomainError::new(
                ErrorCode::SessionCompleted,
                "Cannot modify a completed session",
            )),
        }
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
