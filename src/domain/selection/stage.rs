//! Assessment stages.
//!
//! Stages only ever move forward. Advancement thresholds live in
//! configuration; the per-stage priority pairs used by confidence queries
//! are part of the instrument design and fixed here.

use serde::{Deserialize, Serialize};

use crate::domain::confidence::PriorityThresholds;

/// The four phases of an assessment, in strict order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Broad screening: anchors, screeners, flags, first validity pair.
    BroadScreening,
    /// Targeted building: facets, conditional clinical/ND expansion.
    TargetedBuilding,
    /// Precision refinement: low-confidence and divergent dimensions.
    PrecisionRefinement,
    /// Gap filling: coverage gaps and archetype-themed items to the exact
    /// target total. Terminal.
    GapFilling,
}

impl Stage {
    /// All stages in order.
    pub fn all() -> &'static [Stage] {
        &[
            Stage::BroadScreening,
            Stage::TargetedBuilding,
            Stage::PrecisionRefinement,
            Stage::GapFilling,
        ]
    }

    /// Stage number (1-4) as presented to respondents and persisted.
    pub fn number(&self) -> u8 {
        match self {
            Stage::BroadScreening => 1,
            Stage::TargetedBuilding => 2,
            Stage::PrecisionRefinement => 3,
            Stage::GapFilling => 4,
        }
    }

    /// Parses a stage from its number.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Stage::BroadScreening),
            2 => Some(Stage::TargetedBuilding),
            3 => Some(Stage::PrecisionRefinement),
            4 => Some(Stage::GapFilling),
            _ => None,
        }
    }

    /// The following stage, or None from the terminal stage.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::BroadScreening => Some(Stage::TargetedBuilding),
            Stage::TargetedBuilding => Some(Stage::PrecisionRefinement),
            Stage::PrecisionRefinement => Some(Stage::GapFilling),
            Stage::GapFilling => None,
        }
    }

    /// True for the terminal stage.
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// True if `target` is reachable from this stage without going back.
    pub fn can_advance_to(&self, target: Stage) -> bool {
        target.number() >= self.number()
    }

    /// Returns the display label for this stage.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::BroadScreening => "Broad Screening",
            Stage::TargetedBuilding => "Targeted Building",
            Stage::PrecisionRefinement => "Precision Refinement",
            Stage::GapFilling => "Gap Filling",
        }
    }

    /// Respondent-facing description of what the stage is doing.
    pub fn message(&self) -> &'static str {
        match self {
            Stage::BroadScreening => {
                "Getting a first read across all areas with a broad set of questions."
            }
            Stage::TargetedBuilding => {
                "Building out the picture where it matters most for you."
            }
            Stage::PrecisionRefinement => {
                "Double-checking the places where your answers point in different directions."
            }
            Stage::GapFilling => "Filling in the last gaps to complete your profile.",
        }
    }

    /// The (minimum questions, target confidence) pair this stage uses when
    /// asking the tracker which dimensions still need attention.
    pub fn priority_thresholds(&self) -> PriorityThresholds {
        match self {
            Stage::BroadScreening => PriorityThresholds::new(1, 30.0),
            Stage::TargetedBuilding => PriorityThresholds::new(2, 75.0),
            Stage::PrecisionRefinement => PriorityThresholds::new(3, 85.0),
            Stage::GapFilling => PriorityThresholds::new(2, 90.0),
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::BroadScreening
    }
}
