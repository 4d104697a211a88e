//! String-keyed confidence accumulator.
//!
//! The tracker is deliberately free of stage logic: selectors pass in the
//! thresholds they care about. Iteration order is deterministic (BTreeMap)
//! so selection output is reproducible given a seeded shuffle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{DimensionRecord, ScoredResponse};
use crate::domain::dimension::{BigFiveTrait, DimensionKey};
use crate::domain::foundation::{Confidence, Score};

/// Confidence required on every Big-Five trait before a report is ready.
pub const REPORT_READY_CONFIDENCE: f64 = 75.0;

/// A (minimum question count, target confidence) pair used by priority
/// queries. Each stage supplies its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityThresholds {
    pub min_questions: usize,
    pub target_confidence: f64,
}

impl PriorityThresholds {
    pub fn new(min_questions: usize, target_confidence: f64) -> Self {
        Self {
            min_questions,
            target_confidence,
        }
    }
}

/// Serialized form of the tracker: a string-keyed map of dimension records.
///
/// This is the exact shape persisted on the session; the typed working
/// structure never leaves a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceSnapshot(BTreeMap<DimensionKey, DimensionRecord>);

/// Working accumulator keyed by dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfidenceTracker {
    records: BTreeMap<DimensionKey, DimensionRecord>,
}

impl ConfidenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a tracker from a persisted snapshot.
    ///
    /// Derived fields are recomputed from the response history, so
    /// out-of-range persisted values are repaired rather than propagated.
    pub fn from_snapshot(snapshot: ConfidenceSnapshot) -> Self {
        let mut records = snapshot.0;
        for record in records.values_mut() {
            record.recompute();
        }
        Self { records }
    }

    /// Serializes the tracker back into its persisted shape.
    pub fn to_snapshot(&self) -> ConfidenceSnapshot {
        ConfidenceSnapshot(self.records.clone())
    }

    /// Appends a response to a dimension and recomputes its confidence.
    pub fn update_confidence(&mut self, dimension: DimensionKey, response: ScoredResponse) {
        self.records.entry(dimension).or_default().record(response);
    }

    pub fn record(&self, dimension: &DimensionKey) -> Option<&DimensionRecord> {
        self.records.get(dimension)
    }

    pub fn score(&self, dimension: &DimensionKey) -> Option<Score> {
        self.records.get(dimension).map(|r| r.average())
    }

    pub fn confidence(&self, dimension: &DimensionKey) -> Option<Confidence> {
        self.records.get(dimension).map(|r| r.confidence())
    }

    pub fn question_count(&self, dimension: &DimensionKey) -> usize {
        self.records
            .get(dimension)
            .map(|r| r.question_count())
            .unwrap_or(0)
    }

    /// Iterates all tracked dimensions in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&DimensionKey, &DimensionRecord)> {
        self.records.iter()
    }

    /// True when a dimension is absent, under-sampled, or under-confident.
    pub fn needs_more_questions(
        &self,
        dimension: &DimensionKey,
        min_count: usize,
        target_confidence: f64,
    ) -> bool {
        match self.records.get(dimension) {
            None => true,
            Some(record) => {
                record.question_count() < min_count
                    || record.confidence().value() < target_confidence
            }
        }
    }

    /// Tracked dimensions still needing attention for the given thresholds,
    /// sorted by confidence gap descending (ties in key order).
    pub fn priority_dimensions(
        &self,
        thresholds: PriorityThresholds,
    ) -> Vec<(DimensionKey, f64)> {
        let mut needing: Vec<(DimensionKey, f64)> = self
            .records
            .iter()
            .filter(|(_, record)| {
                record.question_count() < thresholds.min_questions
                    || record.confidence().value() < thresholds.target_confidence
            })
            .map(|(key, record)| {
                (
                    key.clone(),
                    thresholds.target_confidence - record.confidence().value(),
                )
            })
            .collect();
        needing.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        needing
    }

    /// Dimensions safe to stop probing: confident enough and sampled enough.
    pub fn skippable_dimensions(
        &self,
        threshold: f64,
        min_questions: usize,
    ) -> Vec<(DimensionKey, Confidence)> {
        self.records
            .iter()
            .filter(|(_, record)| {
                record.confidence().value() >= threshold
                    && record.question_count() >= min_questions
            })
            .map(|(key, record)| (key.clone(), record.confidence()))
            .collect()
    }

    /// Mean confidence over the Big-Five dimensions that have data.
    ///
    /// Missing traits are excluded from the average, not counted as zero.
    /// Returns 0.0 when no trait has been touched yet.
    pub fn average_big_five_confidence(&self) -> f64 {
        let values: Vec<f64> = BigFiveTrait::all()
            .iter()
            .filter_map(|t| self.confidence(&DimensionKey::BigFive(*t)))
            .map(|c| c.value())
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// True only when every Big-Five trait is confidently estimated.
    pub fn is_ready_for_report(&self) -> bool {
        BigFiveTrait::all().iter().all(|t| {
            self.confidence(&DimensionKey::BigFive(*t))
                .is_some_and(|c| c.meets(REPORT_READY_CONFIDENCE))
        })
    }

    /// The Big-Five trait currently known with the least confidence.
    ///
    /// Untouched traits count as zero confidence so they surface first.
    pub fn weakest_big_five(&self) -> BigFiveTrait {
        *BigFiveTrait::all()
            .iter()
            .min_by(|a, b| {
                let ca = self
                    .confidence(&DimensionKey::BigFive(**a))
                    .map(|c| c.value())
                    .unwrap_or(0.0);
                let cb = self
                    .confidence(&DimensionKey::BigFive(**b))
                    .map(|c| c.value())
                    .unwrap_or(0.0);
                ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(&BigFiveTrait::Openness)
    }

    /// Number of distinct facets recorded under a trait.
    pub fn facet_count_for(&self, parent: BigFiveTrait) -> usize {
        self.records
            .keys()
            .filter(|key| matches!(key, DimensionKey::Facet { parent: p, .. } if *p == parent))
            .count()
    }

    /// Facets whose running score strays from their parent trait's score by
    /// strictly more than `threshold` points.
    pub fn divergent_facets(&self, threshold: f64) -> Vec<(DimensionKey, f64)> {
        self.records
            .iter()
            .filter_map(|(key, record)| {
                let DimensionKey::Facet { parent, .. } = key else {
                    return None;
                };
                let trait_score = self.score(&DimensionKey::BigFive(*parent))?;
                let delta = record.average().distance(trait_score);
                (delta > threshold).then(|| (key.clone(), delta))
            })
            .collect()
    }
}
