//! Adaptive item selection - stages, selectors, and the coordinator.

mod archetype;
mod batch;
mod context;
mod coordinator;
mod fetch;
mod picks;
mod shuffle;
mod stage;
mod stage1;
mod stage2;
mod stage3;
mod stage4;

pub use archetype::Archetype;
pub use batch::{DimensionSummary, QuestionBatch, SkipNotification};
pub use context::SelectionContext;
pub use coordinator::MultiStageCoordinator;
pub use stage::Stage;
pub use stage1::BroadScreeningSelector;
pub use stage2::TargetedBuildingSelector;
pub use stage3::PrecisionRefinementSelector;
pub use stage4::GapFillingSelector;
