//! Big-Five trait enum and the fixed facet structure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five personality trait domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigFiveTrait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl BigFiveTrait {
    /// All five traits in canonical OCEAN order.
    pub fn all() -> &'static [BigFiveTrait] {
        &[
            BigFiveTrait::Openness,
            BigFiveTrait::Conscientiousness,
            BigFiveTrait::Extraversion,
            BigFiveTrait::Agreeableness,
            BigFiveTrait::Neuroticism,
        ]
    }

    /// Stable string key used in dimension maps and snapshots.
    pub fn key(&self) -> &'static str {
        match self {
            BigFiveTrait::Openness => "openness",
            BigFiveTrait::Conscientiousness => "conscientiousness",
            BigFiveTrait::Extraversion => "extraversion",
            BigFiveTrait::Agreeableness => "agreeableness",
            BigFiveTrait::Neuroticism => "neuroticism",
        }
    }

    /// Parses a trait from its string key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "openness" => Some(BigFiveTrait::Openness),
            "conscientiousness" => Some(BigFiveTrait::Conscientiousness),
            "extraversion" => Some(BigFiveTrait::Extraversion),
            "agreeableness" => Some(BigFiveTrait::Agreeableness),
            "neuroticism" => Some(BigFiveTrait::Neuroticism),
            _ => None,
        }
    }

    /// Returns the display label for this trait.
    pub fn label(&self) -> &'static str {
        match self {
            BigFiveTrait::Openness => "Openness",
            BigFiveTrait::Conscientiousness => "Conscientiousness",
            BigFiveTrait::Extraversion => "Extraversion",
            BigFiveTrait::Agreeableness => "Agreeableness",
            BigFiveTrait::Neuroticism => "Neuroticism",
        }
    }

    /// The six facets of this trait, in the instrument's fixed cycle order.
    ///
    /// Selectors fall back to cycling this list when facet prioritization
    /// has nothing to say.
    pub fn facets(&self) -> &'static [&'static str] {
        match self {
            BigFiveTrait::Openness => &[
                "fantasy",
                "aesthetics",
                "feelings",
                "actions",
                "ideas",
                "values",
            ],
            BigFiveTrait::Conscientiousness => &[
                "competence",
                "order",
                "dutifulness",
                "achievement_striving",
                "self_discipline",
                "deliberation",
            ],
            BigFiveTrait::Extraversion => &[
                "warmth",
                "gregariousness",
                "assertiveness",
                "activity",
                "excitement_seeking",
                "positive_emotions",
            ],
            BigFiveTrait::Agreeableness => &[
                "trust",
                "straightforwardness",
                "altruism",
                "compliance",
                "modesty",
                "tender_mindedness",
            ],
            BigFiveTrait::Neuroticism => &[
                "anxiety",
                "angry_hostility",
                "depression",
                "self_consciousness",
                "impulsiveness",
                "vulnerability",
            ],
        }
    }
}

impl fmt::Display for BigFiveTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
