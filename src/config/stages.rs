//! Per-stage advancement thresholds and batch bounds.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use crate::domain::selection::Stage;

/// Advancement and batch policy for one non-terminal stage.
///
/// A stage advances once `min_questions` are answered AND either the
/// Big-Five average confidence reaches `min_confidence` OR the answered
/// count reaches `next_stage_at` (the hard ceiling that forces progress).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StagePolicy {
    pub min_questions: usize,
    pub min_confidence: f64,
    pub next_stage_at: usize,
    /// Intended batch size before truncation.
    pub batch_target: usize,
    /// Hard cap on one batch.
    pub batch_max: usize,
}

/// Batch policy for the terminal stage; its size is always the exact
/// remaining budget, so it has no advancement thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerminalStagePolicy {
    /// Smallest useful batch; purely informational for pacing UIs.
    pub batch_min: usize,
}

impl Default for TerminalStagePolicy {
    fn default() -> Self {
        Self { batch_min: 1 }
    }
}

/// The full stage policy table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesConfig {
    #[serde(default = "StagesConfig::default_stage1")]
    pub stage1: StagePolicy,
    #[serde(default = "StagesConfig::default_stage2")]
    pub stage2: StagePolicy,
    #[serde(default = "StagesConfig::default_stage3")]
    pub stage3: StagePolicy,
    #[serde(default)]
    pub stage4: TerminalStagePolicy,
}

impl StagesConfig {
    fn default_stage1() -> StagePolicy {
        StagePolicy {
            min_questions: 12,
            min_confidence: 30.0,
            next_stage_at: 15,
            batch_target: 14,
            batch_max: 15,
        }
    }

    fn default_stage2() -> StagePolicy {
        StagePolicy {
            min_questions: 37,
            min_confidence: 60.0,
            next_stage_at: 42,
            batch_target: 27,
            batch_max: 30,
        }
    }

    fn default_stage3() -> StagePolicy {
        StagePolicy {
            min_questions: 55,
            min_confidence: 75.0,
            next_stage_at: 60,
            batch_target: 18,
            batch_max: 20,
        }
    }

    /// The advancement policy for a stage, or None for the terminal stage.
    pub fn advancement(&self, stage: Stage) -> Option<&StagePolicy> {
        match stage {
            Stage::BroadScreening => Some(&self.stage1),
            Stage::TargetedBuilding => Some(&self.stage2),
            Stage::PrecisionRefinement => Some(&self.stage3),
            Stage::GapFilling => None,
        }
    }

    /// Validates cross-stage ordering against the target total.
    pub fn validate(&self, target_total: usize) -> Result<(), ValidationError> {
        let ceilings = [
            ("stages.stage1", &self.stage1),
            ("stages.stage2", &self.stage2),
            ("stages.stage3", &self.stage3),
        ];
        for (field, policy) in &ceilings {
            if policy.min_questions > policy.next_stage_at {
                return Err(ValidationError::invalid(
                    format!("{}.next_stage_at", field),
                    "hard ceiling cannot be below the stage minimum",
                ));
            }
            if policy.batch_target > policy.batch_max {
                return Err(ValidationError::invalid(
                    format!("{}.batch_target", field),
                    "batch target cannot exceed batch max",
                ));
            }
            if !(0.0..=100.0).contains(&policy.min_confidence) {
                return Err(ValidationError::invalid(
                    format!("{}.min_confidence", field),
                    "must be within 0-100",
                ));
            }
        }
        if self.stage1.next_stage_at >= self.stage2.next_stage_at
            || self.stage2.next_stage_at >= self.stage3.next_stage_at
        {
            return Err(ValidationError::invalid(
                "stages",
                "stage ceilings must strictly increase",
            ));
        }
        if self.stage3.next_stage_at >= target_total {
            return Err(ValidationError::invalid(
                "stages.stage3.next_stage_at",
                "must leave room for the terminal stage",
            ));
        }
        Ok(())
    }
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            stage1: Self::default_stage1(),
            stage2: Self::default_stage2(),
            stage3: Self::default_stage3(),
            stage4: TerminalStagePolicy::default(),
        }
    }
}
