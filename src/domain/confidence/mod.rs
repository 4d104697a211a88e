//! Confidence estimation over assessment dimensions.
//!
//! The tracker holds no state across requests: it is rebuilt from a
//! serialized snapshot at the start of a request and serialized back at the
//! end (snapshot, working structure, snapshot).

mod record;
mod tracker;

pub use record::{DimensionRecord, ScoredResponse};
pub use tracker::{ConfidenceSnapshot, ConfidenceTracker, PriorityThresholds};
