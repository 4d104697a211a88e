//! Stage state machine and batch coordination.
//!
//! The coordinator decides whether the session advances before delegating
//! to the active stage's selector, and wraps the selected items with the
//! progress metadata callers surface to respondents.

use rand::Rng;
use tracing::debug;

use super::batch::{QuestionBatch, SkipNotification};
use super::context::SelectionContext;
use super::stage::Stage;
use super::stage1::BroadScreeningSelector;
use super::stage2::TargetedBuildingSelector;
use super::stage3::PrecisionRefinementSelector;
use super::stage4::GapFillingSelector;
use crate::config::AppConfig;
use crate::domain::confidence::ConfidenceTracker;
use crate::domain::foundation::DomainError;
use crate::domain::session::AssessmentSession;
use crate::ports::ItemRepository;

/// Owns stage transitions and delegates selection to the active stage.
#[derive(Debug, Clone)]
pub struct MultiStageCoordinator {
    config: AppConfig,
}

impl MultiStageCoordinator {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Selects the next batch, advancing the stage first when warranted.
    pub async fn get_next_questions(
        &self,
        session: &mut AssessmentSession,
        tracker: &ConfidenceTracker,
        repo: &dyn ItemRepository,
    ) -> Result<QuestionBatch, DomainError> {
        self.get_next_questions_with_rng(session, tracker, repo, &mut rand::thread_rng())
            .await
    }

    /// Like [`Self::get_next_questions`] but with a caller-supplied RNG so
    /// simulations can be reproducible.
    pub async fn get_next_questions_with_rng<R: Rng>(
        &self,
        session: &mut AssessmentSession,
        tracker: &ConfidenceTracker,
        repo: &dyn ItemRepository,
        rng: &mut R,
    ) -> Result<QuestionBatch, DomainError> {
        let target_total = self.config.engine.target_total;

        // A bank that cannot fill even one session is a configuration
        // error, not a short assessment.
        let active = repo.count_active().await?;
        if active < target_total {
            return Err(DomainError::pool_exhausted(target_total, active));
        }

        let previous_stage = session.stage();
        if let Some(next) = self.advancement_target(session, tracker) {
            session.advance_stage(next)?;
            debug!(
                from = previous_stage.number(),
                to = next.number(),
                answered = session.answered_count(),
                avg_confidence = tracker.average_big_five_confidence(),
                "stage advanced"
            );
        }
        let stage = session.stage();
        let stage_changed = stage != previous_stage;

        let ctx = SelectionContext {
            repo,
            tracker,
            session,
            config: &self.config,
        };
        let mut questions = match stage {
            Stage::BroadScreening => BroadScreeningSelector::select_questions(&ctx, rng).await?,
            Stage::TargetedBuilding => {
                TargetedBuildingSelector::select_questions(&ctx, rng).await?
            }
            Stage::PrecisionRefinement => {
                PrecisionRefinementSelector::select_questions(&ctx).await?
            }
            Stage::GapFilling => GapFillingSelector::select_questions(&ctx).await?,
        };

        // No batch may carry the session past the target total.
        let remaining = target_total.saturating_sub(session.answered_count());
        if questions.len() > remaining {
            questions.truncate(remaining);
        }

        Ok(QuestionBatch {
            questions,
            stage: stage.number(),
            stage_changed,
            stage_message: stage.message().to_string(),
            progress_message: self.progress_message(session, tracker),
            confidence_summary: QuestionBatch::summarize(tracker),
            skip_notifications: self.skip_notifications(tracker),
        })
    }

    /// The stage to advance into, or None to stay put.
    ///
    /// A stage holds until its minimum question count, then advances when
    /// the Big-Five average confidence clears the bar OR the hard ceiling
    /// forces progress.
    fn advancement_target(
        &self,
        session: &AssessmentSession,
        tracker: &ConfidenceTracker,
    ) -> Option<Stage> {
        let stage = session.stage();
        let policy = self.config.stages.advancement(stage)?;
        let answered = session.answered_count();

        if answered < policy.min_questions {
            return None;
        }
        let confident = tracker.average_big_five_confidence() >= policy.min_confidence;
        let forced = answered >= policy.next_stage_at;
        if confident || forced {
            stage.next()
        } else {
            None
        }
    }

    fn progress_message(
        &self,
        session: &AssessmentSession,
        tracker: &ConfidenceTracker,
    ) -> String {
        let remaining = self
            .config
            .engine
            .target_total
            .saturating_sub(session.answered_count());
        let weakest = tracker.weakest_big_five();
        format!(
            "Focusing on {} next; {} questions remaining.",
            weakest.label(),
            remaining
        )
    }

    fn skip_notifications(&self, tracker: &ConfidenceTracker) -> Vec<SkipNotification> {
        let threshold = self.config.engine.skip_threshold;
        tracker
            .skippable_dimensions(threshold.confidence, threshold.min_questions)
            .into_iter()
            .map(|(key, confidence)| SkipNotification {
                message: format!(
                    "No further questions needed for {} ({:.0}% confident).",
                    key,
                    confidence.value()
                ),
                dimension: key.to_string(),
                confidence,
            })
            .collect()
    }
}
