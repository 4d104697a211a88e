//! Score and confidence value objects (0-100 scale).
//!
//! Scores carry fractional precision because they are running averages of
//! normalized item responses; both types clamp rather than reject so that
//! malformed persisted state degrades safely.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A normalized score between 0.0 and 100.0 inclusive.
///
/// Deserialization clamps, so malformed persisted values cannot reintroduce
/// out-of-range state.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct Score(f64);

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl Score {
    /// Zero score.
    pub const ZERO: Self = Self(0.0);

    /// Scale midpoint.
    pub const MIDPOINT: Self = Self(50.0);

    /// Creates a new Score, clamping to the valid range.
    ///
    /// NaN is treated as malformed input and clamps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 100.0))
    }

    /// Creates a Score, returning error if out of range.
    pub fn try_new(value: f64) -> Result<Self, ValidationError> {
        if value.is_nan() || !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::out_of_range("score", 0.0, 100.0, value));
        }
        Ok(Self(value))
    }

    /// Returns the value as f64.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Absolute distance between two scores.
    pub fn distance(&self, other: Score) -> f64 {
        (self.0 - other.0).abs()
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// A confidence estimate between 0.0 and 100.0 inclusive.
///
/// Distinct from [`Score`] so that the two cannot be swapped at call sites.
/// Deserialization clamps like [`Score`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct Confidence(f64);

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

impl Confidence {
    /// Zero confidence.
    pub const ZERO: Self = Self(0.0);

    /// Creates a new Confidence, clamping to the valid range.
    ///
    /// NaN is treated as malformed input and clamps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 100.0))
    }

    /// Returns the value as f64.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Gap to a target confidence; zero when already at or past it.
    pub fn gap_to(&self, target: f64) -> f64 {
        (target - self.0).max(0.0)
    }

    /// True if this confidence meets the given threshold.
    pub fn meets(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}
