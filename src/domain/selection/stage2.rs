//! Stage 2 - Targeted Building.
//!
//! Spends roughly 60% of the batch on facet coverage for traits still
//! below their confidence target, 30% on clinical screeners that screened
//! positive, and the remainder on elevated neurodiversity flags. Every
//! batch carries one more inconsistency pair.

use rand::Rng;
use tracing::debug;

use super::context::SelectionContext;
use super::fetch::{fetch_quota, find_inconsistency_pair, retain_well_formed};
use super::picks::BatchPicks;
use super::shuffle::{two_pass_shuffle, SHUFFLE_CHUNK};
use super::stage::Stage;
use crate::domain::catalog::{Item, ItemCategory, ItemQuery};
use crate::domain::dimension::{BigFiveTrait, ClinicalScale, DimensionKey, NeurodiversityKind};
use crate::domain::foundation::{DomainError, Score};
use crate::ports::ItemOrdering;

/// Facet items wanted per trait before Stage 2 stops building it.
const FACETS_PER_TRAIT: usize = 4;

/// Normalized category average above which an ND flag set expands.
const ND_EXPANSION_SCORE: f64 = 60.0;

/// Screeners that may expand into their full instruments.
const SCREENER_EXPANSIONS: [(ClinicalScale, &str); 2] = [
    (ClinicalScale::Depression, "phq9"),
    (ClinicalScale::Anxiety, "gad7"),
];

/// Flags whose item sets may expand.
const ND_EXPANSIONS: [NeurodiversityKind; 3] = [
    NeurodiversityKind::Adhd,
    NeurodiversityKind::Autism,
    NeurodiversityKind::SensoryProcessing,
];

/// Stage 2 selector.
pub struct TargetedBuildingSelector;

impl TargetedBuildingSelector {
    /// Builds the targeted-building batch.
    pub async fn select_questions<R: Rng>(
        ctx: &SelectionContext<'_>,
        rng: &mut R,
    ) -> Result<Vec<Item>, DomainError> {
        let policy = &ctx.config.stages.stage2;
        let target = policy.batch_target;
        let facet_budget = target * 60 / 100;
        let clinical_budget = target * 30 / 100;
        let nd_budget = target.saturating_sub(facet_budget + clinical_budget);

        let mut picks = BatchPicks::new(ctx.session.presented());

        Self::build_facets(ctx, &mut picks, facet_budget).await?;
        Self::expand_screeners(ctx, &mut picks, clinical_budget).await?;
        Self::expand_neurodiversity(ctx, &mut picks, nd_budget).await?;

        let pair =
            find_inconsistency_pair(ctx.repo, &picks.apply_exclusions(ItemQuery::new())).await?;
        picks.extend(pair);

        let mut items = picks.into_items();
        two_pass_shuffle(&mut items, SHUFFLE_CHUNK, rng);
        items.truncate(policy.batch_max);
        Ok(items)
    }

    /// Facet budget: up to `4 - already probed facets` items per trait still
    /// below the stage confidence target, ranked by FacetIntelligence with
    /// the fixed facet cycle as fallback.
    async fn build_facets(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        budget: usize,
    ) -> Result<(), DomainError> {
        let thresholds = Stage::TargetedBuilding.priority_thresholds();
        let mut spent = 0;

        for t in BigFiveTrait::all() {
            if spent >= budget {
                break;
            }
            let key = DimensionKey::BigFive(*t);
            if !ctx.tracker.needs_more_questions(
                &key,
                thresholds.min_questions,
                thresholds.target_confidence,
            ) {
                continue;
            }

            let quota = FACETS_PER_TRAIT
                .saturating_sub(ctx.tracker.facet_count_for(*t))
                .min(budget - spent);
            if quota == 0 {
                continue;
            }

            let ranked =
                crate::domain::facets::FacetIntelligence::prioritize_facets(*t, ctx.tracker);
            let facets: Vec<&str> = if ranked.is_empty() {
                t.facets().to_vec()
            } else {
                ranked.iter().map(|fp| fp.facet).collect()
            };

            let mut got = 0;
            for facet in &facets {
                if got >= quota {
                    break;
                }
                let query = picks.apply_exclusions(
                    ItemQuery::new()
                        .category(ItemCategory::Personality)
                        .trait_key(*t)
                        .facet(*facet),
                );
                if let Some(item) = ctx
                    .repo
                    .find_one(&query, ItemOrdering::DiscriminationDesc)
                    .await?
                {
                    if item.is_well_formed() && picks.add(item) {
                        got += 1;
                    }
                }
            }

            // Thin facet pools: top up from the trait at large.
            if got < quota {
                let query = picks.apply_exclusions(
                    ItemQuery::new()
                        .category(ItemCategory::Personality)
                        .trait_key(*t),
                );
                let extra = fetch_quota(
                    ctx.repo,
                    query,
                    ItemOrdering::DiscriminationDesc,
                    quota - got,
                )
                .await?;
                got += extra.len();
                picks.extend(extra);
            }

            spent += got;
        }
        Ok(())
    }

    /// Clinical budget: a screener expands into its full instrument only on
    /// a positive screen (raw sum and single-item gates both cleared).
    async fn expand_screeners(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        budget: usize,
    ) -> Result<(), DomainError> {
        // The budget is split evenly; each screener's gate is independent.
        let per_screener = budget / SCREENER_EXPANSIONS.len();

        for (scale, full_instrument) in SCREENER_EXPANSIONS {
            let key = DimensionKey::Clinical(scale);
            let Some(record) = ctx.tracker.record(&key) else {
                continue;
            };
            let responses = record.responses();
            if responses.len() < 2 {
                continue;
            }

            let first = raw_screener_value(responses[0].score);
            let second = raw_screener_value(responses[1].score);
            if !ctx.config.engine.clinical_gate.triggers(first, second) {
                continue;
            }
            debug!(scale = scale.key(), first, second, "screener positive, expanding instrument");

            let query = picks.apply_exclusions(
                ItemQuery::new()
                    .category(ItemCategory::Clinical)
                    .instrument(full_instrument),
            );
            let items = ctx
                .repo
                .find_many(&query, ItemOrdering::DiscriminationDesc, per_screener)
                .await?;
            picks.extend(retain_well_formed(items));
        }
        Ok(())
    }

    /// Neurodiversity budget: a flag's item set expands only when its
    /// Stage-1 average score is elevated.
    async fn expand_neurodiversity(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        budget: usize,
    ) -> Result<(), DomainError> {
        let elevated: Vec<NeurodiversityKind> = ND_EXPANSIONS
            .into_iter()
            .filter(|kind| {
                ctx.tracker
                    .score(&DimensionKey::Neurodiversity(*kind))
                    .is_some_and(|s| s.value() >= ND_EXPANSION_SCORE)
            })
            .collect();
        if elevated.is_empty() || budget == 0 {
            return Ok(());
        }

        let per_kind = (budget / elevated.len()).max(1);
        let mut spent = 0;
        for kind in elevated {
            if spent >= budget {
                break;
            }
            let query = picks.apply_exclusions(
                ItemQuery::new()
                    .category(ItemCategory::Neurodiversity)
                    .tag(kind.key()),
            );
            let items = ctx
                .repo
                .find_many(
                    &query,
                    ItemOrdering::DiscriminationDesc,
                    per_kind.min(budget - spent),
                )
                .await?;
            let items = retain_well_formed(items);
            spent += items.len();
            picks.extend(items);
        }
        Ok(())
    }
}

/// Recovers the raw 0-3 screener value from a normalized 0-100 score.
fn raw_screener_value(score: Score) -> u8 {
    (score.value() / 100.0 * 3.0).round() as u8
}
