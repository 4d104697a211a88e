//! Typed dimension keys with string-keyed serialization.
//!
//! Snapshots and session state persist dimensions as plain strings
//! (`"neuroticism_anxiety"`, `"adhd"`, `"attachment_anxious"`). Internally
//! the engine works with a typed sum so match arms stay exhaustive.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::BigFiveTrait;

/// A clinical screening scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalScale {
    Depression,
    Anxiety,
    Mania,
    Psychosis,
    Borderline,
    Somatic,
    SubstanceUse,
    Ptsd,
    Ocd,
}

impl ClinicalScale {
    /// All scales in declaration order.
    pub fn all() -> &'static [ClinicalScale] {
        &[
            ClinicalScale::Depression,
            ClinicalScale::Anxiety,
            ClinicalScale::Mania,
            ClinicalScale::Psychosis,
            ClinicalScale::Borderline,
            ClinicalScale::Somatic,
            ClinicalScale::SubstanceUse,
            ClinicalScale::Ptsd,
            ClinicalScale::Ocd,
        ]
    }

    /// Stable string key.
    pub fn key(&self) -> &'static str {
        match self {
            ClinicalScale::Depression => "depression",
            ClinicalScale::Anxiety => "anxiety",
            ClinicalScale::Mania => "mania",
            ClinicalScale::Psychosis => "psychosis",
            ClinicalScale::Borderline => "borderline",
            ClinicalScale::Somatic => "somatic",
            ClinicalScale::SubstanceUse => "substance_use",
            ClinicalScale::Ptsd => "ptsd",
            ClinicalScale::Ocd => "ocd",
        }
    }

    /// Parses a scale from its string key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.key() == key)
    }
}

/// A neurodiversity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeurodiversityKind {
    Adhd,
    Autism,
    ExecutiveFunction,
    SensoryProcessing,
    Masking,
}

impl NeurodiversityKind {
    /// All kinds in declaration order.
    pub fn all() -> &'static [NeurodiversityKind] {
        &[
            NeurodiversityKind::Adhd,
            NeurodiversityKind::Autism,
            NeurodiversityKind::ExecutiveFunction,
            NeurodiversityKind::SensoryProcessing,
            NeurodiversityKind::Masking,
        ]
    }

    /// Stable string key.
    pub fn key(&self) -> &'static str {
        match self {
            NeurodiversityKind::Adhd => "adhd",
            NeurodiversityKind::Autism => "autism",
            NeurodiversityKind::ExecutiveFunction => "executive_function",
            NeurodiversityKind::SensoryProcessing => "sensory_processing",
            NeurodiversityKind::Masking => "masking",
        }
    }

    /// Parses a kind from its string key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.key() == key)
    }
}

/// A scored construct: trait, trait facet, clinical scale, neurodiversity
/// indicator, or a free-form category key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DimensionKey {
    BigFive(BigFiveTrait),
    Facet { parent: BigFiveTrait, facet: String },
    Clinical(ClinicalScale),
    Neurodiversity(NeurodiversityKind),
    Other(String),
}

impl DimensionKey {
    /// Facet key constructor.
    pub fn facet(parent: BigFiveTrait, facet: impl Into<String>) -> Self {
        DimensionKey::Facet {
            parent,
            facet: facet.into(),
        }
    }

    /// The Big-Five trait this key belongs to, if any.
    ///
    /// For facet keys this is the parent trait.
    pub fn big_five_trait(&self) -> Option<BigFiveTrait> {
        match self {
            DimensionKey::BigFive(t) => Some(*t),
            DimensionKey::Facet { parent, .. } => Some(*parent),
            _ => None,
        }
    }

    /// True for a top-level Big-Five trait key (facets excluded).
    pub fn is_big_five(&self) -> bool {
        matches!(self, DimensionKey::BigFive(_))
    }

    /// Parses the string form. Never fails; unknown keys become `Other`.
    pub fn parse(key: &str) -> Self {
        if let Some(t) = BigFiveTrait::from_key(key) {
            return DimensionKey::BigFive(t);
        }
        if let Some(s) = ClinicalScale::from_key(key) {
            return DimensionKey::Clinical(s);
        }
        if let Some(k) = NeurodiversityKind::from_key(key) {
            return DimensionKey::Neurodiversity(k);
        }
        for t in BigFiveTrait::all() {
            if let Some(facet) = key.strip_prefix(t.key()).and_then(|r| r.strip_prefix('_')) {
                if !facet.is_empty() {
                    return DimensionKey::facet(*t, facet);
                }
            }
        }
        DimensionKey::Other(key.to_string())
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionKey::BigFive(t) => write!(f, "{}", t.key()),
            DimensionKey::Facet { parent, facet } => write!(f, "{}_{}", parent.key(), facet),
            DimensionKey::Clinical(s) => write!(f, "{}", s.key()),
            DimensionKey::Neurodiversity(k) => write!(f, "{}", k.key()),
            DimensionKey::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<DimensionKey> for String {
    fn from(key: DimensionKey) -> Self {
        key.to_string()
    }
}

impl From<String> for DimensionKey {
    fn from(s: String) -> Self {
        DimensionKey::parse(&s)
    }
}
