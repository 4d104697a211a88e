//! Coarse personality archetypes from final Big-Five scores.
//!
//! The six rules are evaluated in order and the first match wins, which
//! keeps them mutually exclusive without overlapping guards.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{ItemCategory, ItemQuery};
use crate::domain::confidence::ConfidenceTracker;
use crate::domain::dimension::{BigFiveTrait, DimensionKey};

/// Score assumed for a trait with no recorded answers.
const NEUTRAL_SCORE: f64 = 50.0;

/// A coarse personality-pattern label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Resilient,
    Undercontrolled,
    Overcontrolled,
    CreativeExtrovert,
    IntellectualAchiever,
    Balanced,
}

impl Archetype {
    /// Classifies from explicit Big-Five scores (0-100).
    pub fn from_scores(
        openness: f64,
        conscientiousness: f64,
        extraversion: f64,
        agreeableness: f64,
        neuroticism: f64,
    ) -> Self {
        if extraversion > 60.0 && agreeableness > 60.0 && neuroticism < 40.0 {
            Archetype::Resilient
        } else if neuroticism > 60.0 && (conscientiousness < 40.0 || extraversion < 40.0) {
            Archetype::Undercontrolled
        } else if conscientiousness > 60.0 && agreeableness > 60.0 && openness < 40.0 {
            Archetype::Overcontrolled
        } else if openness > 60.0 && extraversion > 60.0 {
            Archetype::CreativeExtrovert
        } else if openness > 60.0 && conscientiousness > 60.0 {
            Archetype::IntellectualAchiever
        } else {
            Archetype::Balanced
        }
    }

    /// Classifies from a tracker's running trait scores.
    ///
    /// Untouched traits read as the scale midpoint.
    pub fn predict(tracker: &ConfidenceTracker) -> Self {
        let score = |t: BigFiveTrait| {
            tracker
                .score(&DimensionKey::BigFive(t))
                .map(|s| s.value())
                .unwrap_or(NEUTRAL_SCORE)
        };
        Self::from_scores(
            score(BigFiveTrait::Openness),
            score(BigFiveTrait::Conscientiousness),
            score(BigFiveTrait::Extraversion),
            score(BigFiveTrait::Agreeableness),
            score(BigFiveTrait::Neuroticism),
        )
    }

    /// Returns the display label for this archetype.
    pub fn label(&self) -> &'static str {
        match self {
            Archetype::Resilient => "resilient",
            Archetype::Undercontrolled => "undercontrolled",
            Archetype::Overcontrolled => "overcontrolled",
            Archetype::CreativeExtrovert => "creative-extrovert",
            Archetype::IntellectualAchiever => "intellectual-achiever",
            Archetype::Balanced => "balanced",
        }
    }

    /// Themed item queries for the terminal stage's 40% allocation.
    ///
    /// Fixed trait/facet/instrument picks per archetype; Stage 4 walks the
    /// list in order until its budget runs out.
    pub fn themed_queries(&self) -> Vec<ItemQuery> {
        let facet = |t: BigFiveTrait, f: &str| {
            ItemQuery::new()
                .category(ItemCategory::Personality)
                .trait_key(t)
                .facet(f)
        };
        let instrument = |name: &str| ItemQuery::new().instrument(name);

        match self {
            Archetype::Resilient => vec![
                facet(BigFiveTrait::Extraversion, "positive_emotions"),
                facet(BigFiveTrait::Neuroticism, "vulnerability"),
                instrument("resilience"),
            ],
            Archetype::Undercontrolled => vec![
                facet(BigFiveTrait::Conscientiousness, "self_discipline"),
                facet(BigFiveTrait::Neuroticism, "impulsiveness"),
                instrument("interpersonal"),
            ],
            Archetype::Overcontrolled => vec![
                facet(BigFiveTrait::Openness, "actions"),
                facet(BigFiveTrait::Neuroticism, "anxiety"),
                instrument("interpersonal"),
            ],
            Archetype::CreativeExtrovert => vec![
                facet(BigFiveTrait::Openness, "fantasy"),
                facet(BigFiveTrait::Openness, "aesthetics"),
                facet(BigFiveTrait::Extraversion, "excitement_seeking"),
            ],
            Archetype::IntellectualAchiever => vec![
                facet(BigFiveTrait::Openness, "ideas"),
                facet(BigFiveTrait::Conscientiousness, "achievement_striving"),
                instrument("honesty_humility"),
            ],
            Archetype::Balanced => vec![
                facet(BigFiveTrait::Agreeableness, "altruism"),
                facet(BigFiveTrait::Conscientiousness, "competence"),
                instrument("honesty_humility"),
            ],
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_social_low_neuroticism_is_resilient() {
        // extraversion 80, agreeableness 75, neuroticism 20
        let a = Archetype::from_scores(50.0, 50.0, 80.0, 75.0, 20.0);
        assert_eq!(a, Archetype::Resilient);
    }

    #[test]
    fn high_neuroticism_low_conscientiousness_is_undercontrolled() {
        let a = Archetype::from_scores(50.0, 25.0, 50.0, 50.0, 75.0);
        assert_eq!(a, Archetype::Undercontrolled);
    }

    #[test]
    fn high_neuroticism_low_extraversion_is_also_undercontrolled() {
        let a = Archetype::from_scores(50.0, 50.0, 30.0, 50.0, 75.0);
        assert_eq!(a, Archetype::Undercontrolled);
    }

    #[test]
    fn disciplined_agreeable_closed_is_overcontrolled() {
        let a = Archetype::from_scores(30.0, 70.0, 50.0, 70.0, 50.0);
        assert_eq!(a, Archetype::Overcontrolled);
    }

    #[test]
    fn open_and_outgoing_is_creative_extrovert() {
        let a = Archetype::from_scores(70.0, 50.0, 70.0, 50.0, 50.0);
        assert_eq!(a, Archetype::CreativeExtrovert);
    }

    #[test]
    fn open_and_disciplined_is_intellectual_achiever() {
        let a = Archetype::from_scores(70.0, 70.0, 50.0, 50.0, 50.0);
        assert_eq!(a, Archetype::IntellectualAchiever);
    }

    #[test]
    fn neutral_profile_is_balanced() {
        let a = Archetype::from_scores(50.0, 50.0, 50.0, 50.0, 50.0);
        assert_eq!(a, Archetype::Balanced);
    }

    #[test]
    fn rule_order_keeps_rules_exclusive() {
        // qualifies for both resilient and creative-extrovert; the earlier
        // rule wins
        let a = Archetype::from_scores(70.0, 50.0, 80.0, 75.0, 20.0);
        assert_eq!(a, Archetype::Resilient);
    }

    #[test]
    fn predict_reads_midpoint_for_untouched_traits() {
        let tracker = ConfidenceTracker::new();
        assert_eq!(Archetype::predict(&tracker), Archetype::Balanced);
    }

    #[test]
    fn every_archetype_has_themed_queries() {
        for a in [
            Archetype::Resilient,
            Archetype::Undercontrolled,
            Archetype::Overcontrolled,
            Archetype::CreativeExtrovert,
            Archetype::IntellectualAchiever,
            Archetype::Balanced,
        ] {
            assert!(!a.themed_queries().is_empty());
        }
    }
}
