//! Engine output attached to every selected batch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::catalog::Item;
use crate::domain::confidence::ConfidenceTracker;
use crate::domain::foundation::{Confidence, Score};

/// Read-model entry for one dimension in the confidence summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSummary {
    pub score: Score,
    pub confidence: Confidence,
    pub question_count: usize,
}

/// Notice that a dimension has crossed the skip bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipNotification {
    pub dimension: String,
    pub confidence: Confidence,
    pub message: String,
}

/// The coordinator's full answer to "what should we ask next".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBatch {
    pub questions: Vec<Item>,
    pub stage: u8,
    pub stage_changed: bool,
    pub stage_message: String,
    pub progress_message: String,
    pub confidence_summary: BTreeMap<String, DimensionSummary>,
    pub skip_notifications: Vec<SkipNotification>,
}

impl QuestionBatch {
    /// Builds the string-keyed confidence summary from a tracker.
    pub fn summarize(tracker: &ConfidenceTracker) -> BTreeMap<String, DimensionSummary> {
        tracker
            .iter()
            .map(|(key, record)| {
                (
                    key.to_string(),
                    DimensionSummary {
                        score: record.average(),
                        confidence: record.confidence(),
                        question_count: record.question_count(),
                    },
                )
            })
            .collect()
    }
}
