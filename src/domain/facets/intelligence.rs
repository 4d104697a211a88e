//! Correlation-driven facet prioritization.
//!
//! Each trait's six facets start at a base priority; a fixed rule table
//! boosts or suppresses individual facets from what the profile already
//! shows on other traits and neurodiversity proxies. Openness carries no
//! rules, so its callers use the fixed facet cycle instead.

use once_cell::sync::Lazy;

use crate::domain::confidence::ConfidenceTracker;
use crate::domain::dimension::{BigFiveTrait, DimensionKey, NeurodiversityKind};

/// Base priority every facet starts from.
const BASE_PRIORITY: i32 = 5;

/// A facet with its final selection priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetPriority {
    pub facet: &'static str,
    pub priority: i32,
}

/// What a correlation rule reads from the profile.
#[derive(Debug, Clone, Copy)]
enum Signal {
    Trait(BigFiveTrait),
    Proxy(NeurodiversityKind),
}

impl Signal {
    fn score(&self, profile: &ConfidenceTracker) -> Option<f64> {
        let key = match self {
            Signal::Trait(t) => DimensionKey::BigFive(*t),
            Signal::Proxy(k) => DimensionKey::Neurodiversity(*k),
        };
        profile.score(&key).map(|s| s.value())
    }
}

#[derive(Debug, Clone, Copy)]
enum Condition {
    Above(f64),
    Below(f64),
}

impl Condition {
    fn holds(&self, value: f64) -> bool {
        match self {
            Condition::Above(threshold) => value > *threshold,
            Condition::Below(threshold) => value < *threshold,
        }
    }
}

struct CorrelationRule {
    target: BigFiveTrait,
    facet: &'static str,
    signal: Signal,
    condition: Condition,
    adjustment: i32,
}

impl CorrelationRule {
    const fn new(
        target: BigFiveTrait,
        facet: &'static str,
        signal: Signal,
        condition: Condition,
        adjustment: i32,
    ) -> Self {
        Self {
            target,
            facet,
            signal,
            condition,
            adjustment,
        }
    }
}

/// The fixed correlation table, applied in declaration order.
static RULES: Lazy<Vec<CorrelationRule>> = Lazy::new(|| {
    use BigFiveTrait::*;
    use Condition::{Above, Below};
    use NeurodiversityKind::{Adhd, Autism, ExecutiveFunction};
    use Signal::{Proxy, Trait};

    vec![
        // Neuroticism: low conscientiousness and regulation trouble both
        // present as anxiety rather than anger.
        CorrelationRule::new(Neuroticism, "anxiety", Trait(Conscientiousness), Below(40.0), 2),
        CorrelationRule::new(Neuroticism, "anxiety", Proxy(ExecutiveFunction), Above(60.0), 2),
        CorrelationRule::new(Neuroticism, "angry_hostility", Trait(Agreeableness), Below(40.0), 2),
        CorrelationRule::new(Neuroticism, "angry_hostility", Trait(Agreeableness), Above(50.0), -2),
        CorrelationRule::new(
            Neuroticism,
            "angry_hostility",
            Proxy(ExecutiveFunction),
            Above(60.0),
            -1,
        ),
        CorrelationRule::new(Neuroticism, "depression", Trait(Extraversion), Below(40.0), 1),
        CorrelationRule::new(Neuroticism, "impulsiveness", Proxy(Adhd), Above(60.0), 2),
        CorrelationRule::new(Neuroticism, "vulnerability", Proxy(ExecutiveFunction), Above(60.0), 1),
        // Extraversion
        CorrelationRule::new(Extraversion, "warmth", Trait(Agreeableness), Above(60.0), 1),
        CorrelationRule::new(Extraversion, "gregariousness", Proxy(Autism), Above(60.0), -1),
        CorrelationRule::new(Extraversion, "excitement_seeking", Proxy(Adhd), Above(60.0), 2),
        CorrelationRule::new(Extraversion, "assertiveness", Trait(Conscientiousness), Above(60.0), 1),
        // Conscientiousness
        CorrelationRule::new(
            Conscientiousness,
            "self_discipline",
            Proxy(ExecutiveFunction),
            Above(60.0),
            2,
        ),
        CorrelationRule::new(Conscientiousness, "order", Proxy(ExecutiveFunction), Above(60.0), 1),
        CorrelationRule::new(
            Conscientiousness,
            "achievement_striving",
            Trait(Neuroticism),
            Below(40.0),
            1,
        ),
        CorrelationRule::new(Conscientiousness, "deliberation", Proxy(Adhd), Above(60.0), 1),
        // Agreeableness
        CorrelationRule::new(Agreeableness, "trust", Trait(Neuroticism), Above(60.0), 1),
        CorrelationRule::new(Agreeableness, "compliance", Trait(Neuroticism), Above(60.0), 1),
    ]
});

/// Pure ranking function, trait + profile to prioritized facet list.
pub struct FacetIntelligence;

impl FacetIntelligence {
    /// Ranks a trait's facets by adjusted priority, descending.
    ///
    /// Ties keep the facet-cycle declaration order (the sort is stable).
    /// Returns an empty list when the correlation table has no rules for
    /// the trait; callers then fall back to the fixed facet cycle.
    pub fn prioritize_facets(
        target: BigFiveTrait,
        profile: &ConfidenceTracker,
    ) -> Vec<FacetPriority> {
        let rules: Vec<&CorrelationRule> =
            RULES.iter().filter(|r| r.target == target).collect();
        if rules.is_empty() {
            return Vec::new();
        }

        let mut priorities: Vec<FacetPriority> = target
            .facets()
            .iter()
            .map(|facet| FacetPriority {
                facet,
                priority: BASE_PRIORITY,
            })
            .collect();

        for rule in rules {
            let Some(value) = rule.signal.score(profile) else {
                continue;
            };
            if rule.condition.holds(value) {
                if let Some(fp) = priorities.iter_mut().find(|fp| fp.facet == rule.facet) {
                    fp.priority += rule.adjustment;
                }
            }
        }

        priorities.sort_by(|a, b| b.priority.cmp(&a.priority));
        priorities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::confidence::ScoredResponse;
    use crate::domain::foundation::{ItemId, Score, Timestamp};

    fn profile_with(scores: &[(DimensionKey, f64)]) -> ConfidenceTracker {
        let mut tracker = ConfidenceTracker::new();
        for (i, (key, score)) in scores.iter().enumerate() {
            tracker.update_confidence(
                key.clone(),
                ScoredResponse::new(
                    ItemId::new(format!("p{}", i)).unwrap(),
                    Score::new(*score),
                    Timestamp::from_unix_secs(1_700_000_000),
                ),
            );
        }
        tracker
    }

    fn priority_of(list: &[FacetPriority], facet: &str) -> i32 {
        list.iter().find(|fp| fp.facet == facet).unwrap().priority
    }

    #[test]
    fn empty_profile_keeps_base_priorities_in_cycle_order() {
        let profile = ConfidenceTracker::new();
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Neuroticism, &profile);
        assert_eq!(ranked.len(), 6);
        assert!(ranked.iter().all(|fp| fp.priority == BASE_PRIORITY));
        // stable sort keeps declaration order on full tie
        let order: Vec<_> = ranked.iter().map(|fp| fp.facet).collect();
        assert_eq!(order, BigFiveTrait::Neuroticism.facets());
    }

    #[test]
    fn low_conscientiousness_boosts_anxiety_facet() {
        let profile = profile_with(&[(
            DimensionKey::BigFive(BigFiveTrait::Conscientiousness),
            30.0,
        )]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Neuroticism, &profile);
        assert_eq!(ranked[0].facet, "anxiety");
        assert_eq!(priority_of(&ranked, "anxiety"), BASE_PRIORITY + 2);
    }

    #[test]
    fn regulation_proxy_boosts_anxiety_and_suppresses_hostility() {
        let profile = profile_with(&[(
            DimensionKey::Neurodiversity(NeurodiversityKind::ExecutiveFunction),
            75.0,
        )]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Neuroticism, &profile);
        assert_eq!(priority_of(&ranked, "anxiety"), BASE_PRIORITY + 2);
        assert_eq!(priority_of(&ranked, "angry_hostility"), BASE_PRIORITY - 1);
    }

    #[test]
    fn low_agreeableness_boosts_hostility() {
        let profile = profile_with(&[(DimensionKey::BigFive(BigFiveTrait::Agreeableness), 30.0)]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Neuroticism, &profile);
        assert_eq!(priority_of(&ranked, "angry_hostility"), BASE_PRIORITY + 2);
    }

    #[test]
    fn moderate_agreeableness_suppresses_hostility() {
        let profile = profile_with(&[(DimensionKey::BigFive(BigFiveTrait::Agreeableness), 65.0)]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Neuroticism, &profile);
        assert_eq!(priority_of(&ranked, "angry_hostility"), BASE_PRIORITY - 2);
        // suppressed facet sorts last
        assert_eq!(ranked.last().unwrap().facet, "angry_hostility");
    }

    #[test]
    fn agreeableness_exactly_at_boundary_triggers_neither_rule() {
        // Below(40) and Above(50) are both strict
        let profile = profile_with(&[(DimensionKey::BigFive(BigFiveTrait::Agreeableness), 40.0)]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Neuroticism, &profile);
        assert_eq!(priority_of(&ranked, "angry_hostility"), BASE_PRIORITY);

        let profile = profile_with(&[(DimensionKey::BigFive(BigFiveTrait::Agreeableness), 50.0)]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Neuroticism, &profile);
        assert_eq!(priority_of(&ranked, "angry_hostility"), BASE_PRIORITY);
    }

    #[test]
    fn adhd_proxy_boosts_excitement_seeking() {
        let profile = profile_with(&[(
            DimensionKey::Neurodiversity(NeurodiversityKind::Adhd),
            70.0,
        )]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Extraversion, &profile);
        assert_eq!(ranked[0].facet, "excitement_seeking");
    }

    #[test]
    fn openness_has_no_rules_and_returns_empty() {
        let profile = profile_with(&[(DimensionKey::BigFive(BigFiveTrait::Neuroticism), 80.0)]);
        let ranked = FacetIntelligence::prioritize_facets(BigFiveTrait::Openness, &profile);
        assert!(ranked.is_empty());
    }
}
