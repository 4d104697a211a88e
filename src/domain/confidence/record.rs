//! Per-dimension response record and the confidence formula.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::DEFAULT_DISCRIMINATION;
use crate::domain::foundation::{Confidence, ItemId, Score, Timestamp};

/// Latency under which a response counts as suspiciously fast.
const FAST_RESPONSE_MS: u64 = 2_000;

/// Response-time variance (ms²) under which timed responses look
/// straight-lined.
const STRAIGHT_LINE_VARIANCE_MS2: f64 = 250_000.0;

/// Minimum timed responses before the straight-lining check applies.
const STRAIGHT_LINE_MIN_TIMED: usize = 3;

/// One recorded answer as seen by a single dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResponse {
    pub item_id: ItemId,
    pub score: Score,
    pub answered_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrimination: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl ScoredResponse {
    pub fn new(item_id: ItemId, score: Score, answered_at: Timestamp) -> Self {
        Self {
            item_id,
            score,
            answered_at,
            discrimination: None,
            latency_ms: None,
        }
    }

    pub fn with_discrimination(mut self, discrimination: f64) -> Self {
        self.discrimination = Some(discrimination);
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }
}

/// Accumulated evidence for one dimension.
///
/// # Invariants
///
/// - `average` is the arithmetic mean of all recorded scores
/// - `confidence` is always within [0, 100]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionRecord {
    responses: Vec<ScoredResponse>,
    average: Score,
    confidence: Confidence,
}

impl DimensionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a response and recomputes average and confidence.
    pub fn record(&mut self, response: ScoredResponse) {
        self.responses.push(response);
        self.recompute();
    }

    /// Recomputes derived values from the response history.
    ///
    /// Also used after rehydration so malformed persisted derived fields
    /// can never survive a load.
    pub fn recompute(&mut self) {
        self.average = Score::new(self.mean_score());
        self.confidence = Confidence::new(
            self.base_term() + self.consistency_term() + self.discrimination_term()
                + self.quality_term(),
        );
    }

    pub fn responses(&self) -> &[ScoredResponse] {
        &self.responses
    }

    pub fn question_count(&self) -> usize {
        self.responses.len()
    }

    pub fn average(&self) -> Score {
        self.average
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Population variance of the recorded scores.
    pub fn score_variance(&self) -> f64 {
        population_variance(self.responses.iter().map(|r| r.score.value()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Formula terms
    // ─────────────────────────────────────────────────────────────────────

    /// Ten points per answer, saturating at 50.
    fn base_term(&self) -> f64 {
        ((self.responses.len() * 10) as f64).min(50.0)
    }

    /// Up to 25 points for internally consistent answers.
    fn consistency_term(&self) -> f64 {
        (1.0 - (self.score_variance() / 6.0).min(1.0)) * 25.0
    }

    /// Up to 15 points scaled by average item discrimination.
    fn discrimination_term(&self) -> f64 {
        let n = self.responses.len();
        if n == 0 {
            return DEFAULT_DISCRIMINATION * 15.0;
        }
        let avg: f64 = self
            .responses
            .iter()
            .map(|r| r.discrimination.unwrap_or(DEFAULT_DISCRIMINATION))
            .sum::<f64>()
            / n as f64;
        avg * 15.0
    }

    /// Up to 10 points for plausible response behavior.
    ///
    /// Penalized by the fraction of fast (<2s) answers and by a flat
    /// deduction when response times barely vary (straight-lining).
    fn quality_term(&self) -> f64 {
        let n = self.responses.len();
        if n == 0 {
            return 10.0;
        }

        let fast = self
            .responses
            .iter()
            .filter(|r| r.latency_ms.is_some_and(|ms| ms < FAST_RESPONSE_MS))
            .count();
        let fast_fraction = fast as f64 / n as f64;

        let timed: Vec<f64> = self
            .responses
            .iter()
            .filter_map(|r| r.latency_ms.map(|ms| ms as f64))
            .collect();
        let straight_lining = timed.len() >= STRAIGHT_LINE_MIN_TIMED
            && population_variance(timed.iter().copied()) < STRAIGHT_LINE_VARIANCE_MS2;

        let mut quality: f64 = 1.0 - 0.3 * fast_fraction;
        if straight_lining {
            quality -= 0.2;
        }
        quality.max(0.0) * 10.0
    }

    fn mean_score(&self) -> f64 {
        if self.responses.is_empty() {
            return 0.0;
        }
        self.responses.iter().map(|r| r.score.value()).sum::<f64>() / self.responses.len() as f64
    }
}

fn population_variance(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}
