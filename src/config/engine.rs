//! Engine-wide tunables: target length, skip bar, clinical gates.

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Default assessment length.
pub const DEFAULT_TARGET_TOTAL: usize = 70;

/// Bar past which a dimension is safe to stop probing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SkipThreshold {
    /// Minimum confidence (0-100).
    pub confidence: f64,
    /// Minimum answered questions.
    pub min_questions: usize,
}

impl Default for SkipThreshold {
    fn default() -> Self {
        Self {
            confidence: 85.0,
            min_questions: 2,
        }
    }
}

/// Positive-screen gate for expanding a two-item clinical screener into its
/// full instrument.
///
/// Both conditions must hold on the raw 0-3 screener values: the pair must
/// sum to at least `min_sum` AND at least one item must score `min_item` or
/// more. Two borderline answers alone never expand.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClinicalGate {
    pub min_sum: u8,
    pub min_item: u8,
}

impl Default for ClinicalGate {
    fn default() -> Self {
        Self {
            min_sum: 3,
            min_item: 2,
        }
    }
}

impl ClinicalGate {
    /// Evaluates the gate against the two raw screener values.
    pub fn triggers(&self, first: u8, second: u8) -> bool {
        first + second >= self.min_sum && (first >= self.min_item || second >= self.min_item)
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Exact number of items every session administers.
    pub target_total: usize,
    #[serde(default)]
    pub skip_threshold: SkipThreshold,
    #[serde(default)]
    pub clinical_gate: ClinicalGate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_total: DEFAULT_TARGET_TOTAL,
            skip_threshold: SkipThreshold::default(),
            clinical_gate: ClinicalGate::default(),
        }
    }
}

impl EngineConfig {
    /// Validates semantic constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target_total == 0 {
            return Err(ValidationError::invalid(
                "engine.target_total",
                "must be at least 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.skip_threshold.confidence) {
            return Err(ValidationError::invalid(
                "engine.skip_threshold.confidence",
                "must be within 0-100",
            ));
        }
        if self.clinical_gate.min_item > 3 {
            return Err(ValidationError::invalid(
                "engine.clinical_gate.min_item",
                "screener items score 0-3",
            ));
        }
        if self.clinical_gate.min_sum > 6 {
            return Err(ValidationError::invalid(
                "engine.clinical_gate.min_sum",
                "two screener items sum to at most 6",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_instrument_design() {
        let config = EngineConfig::default();
        assert_eq!(config.target_total, 70);
        assert_eq!(config.skip_threshold.confidence, 85.0);
        assert_eq!(config.skip_threshold.min_questions, 2);
        assert_eq!(config.clinical_gate.min_sum, 3);
        assert_eq!(config.clinical_gate.min_item, 2);
    }

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_target_total_is_rejected() {
        let config = EngineConfig {
            target_total: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn gate_rejects_two_borderline_answers() {
        let gate = ClinicalGate::default();
        assert!(!gate.triggers(1, 1));
        assert!(!gate.triggers(0, 1));
        // sum 3 with an item at 2 clears both bars
        assert!(gate.triggers(1, 2));
        assert!(gate.triggers(2, 2));
    }

    #[test]
    fn gate_requires_both_conditions() {
        let gate = ClinicalGate {
            min_sum: 4,
            min_item: 2,
        };
        // item at 2 but sum only 3
        assert!(!gate.triggers(1, 2));
        // sum 4 with an item at 2
        assert!(gate.triggers(2, 2));
    }
}
