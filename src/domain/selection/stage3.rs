//! Stage 3 - Precision Refinement.
//!
//! Revisits what the first two stages left uncertain: dimensions still
//! short of 85% confidence, facets that disagree with their parent trait,
//! and clinical score patterns that deserve a second look. When nothing
//! qualifies, the stage backfills rather than stalling the session short
//! of the terminal stage.

use tracing::debug;

use super::context::SelectionContext;
use super::fetch::{find_inconsistency_pair, query_for_dimension, retain_well_formed};
use super::picks::BatchPicks;
use super::stage::Stage;
use crate::domain::catalog::{Item, ItemQuery};
use crate::domain::dimension::{ClinicalScale, DimensionKey};
use crate::domain::foundation::DomainError;
use crate::ports::ItemOrdering;

/// Facet-to-trait distance past which a facet counts as divergent.
const DIVERGENCE_POINTS: f64 = 20.0;

/// Clinical score above which a scale counts as elevated.
const ELEVATED_SCORE: f64 = 60.0;

/// Items fetched per divergent facet.
const ITEMS_PER_DIVERGENT_FACET: usize = 2;

/// Stage 3 selector.
pub struct PrecisionRefinementSelector;

impl PrecisionRefinementSelector {
    /// Builds the precision-refinement batch.
    pub async fn select_questions(
        ctx: &SelectionContext<'_>,
    ) -> Result<Vec<Item>, DomainError> {
        let policy = &ctx.config.stages.stage3;
        let budget = policy.batch_target;
        let low_budget = budget * 40 / 100;
        let divergent_budget = budget * 30 / 100;
        let clinical_budget = budget.saturating_sub(low_budget + divergent_budget);

        let mut picks = BatchPicks::new(ctx.session.presented());

        Self::refine_low_confidence(ctx, &mut picks, low_budget).await?;
        Self::refine_divergent_facets(ctx, &mut picks, divergent_budget).await?;
        Self::validate_clinical_patterns(ctx, &mut picks, clinical_budget).await?;

        // Forward-progress guarantee: an empty refinement batch below the
        // stage ceiling backfills with the strongest unused items.
        if picks.is_empty() && ctx.session.answered_count() < policy.next_stage_at {
            debug!("nothing to refine, backfilling to keep the session moving");
            let query = picks.apply_exclusions(ItemQuery::new());
            let fill = ctx
                .repo
                .find_many(&query, ItemOrdering::DiscriminationDesc, policy.batch_target)
                .await?;
            picks.extend(retain_well_formed(fill));
        }

        let pair =
            find_inconsistency_pair(ctx.repo, &picks.apply_exclusions(ItemQuery::new())).await?;
        picks.extend(pair);

        picks.truncate(policy.batch_max);
        Ok(picks.into_items())
    }

    /// 40% bucket: dimensions below the stage confidence target, worst gap
    /// first, one top-discrimination item each.
    async fn refine_low_confidence(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        budget: usize,
    ) -> Result<(), DomainError> {
        let thresholds = Stage::PrecisionRefinement.priority_thresholds();
        let mut spent = 0;
        for (key, _gap) in ctx.tracker.priority_dimensions(thresholds) {
            if spent >= budget {
                break;
            }
            let query = picks.apply_exclusions(query_for_dimension(&key));
            if let Some(item) = ctx
                .repo
                .find_one(&query, ItemOrdering::DiscriminationDesc)
                .await?
            {
                if item.is_well_formed() && picks.add(item) {
                    spent += 1;
                }
            }
        }
        Ok(())
    }

    /// 30% bucket: facets more than 20 points from their parent trait.
    async fn refine_divergent_facets(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        budget: usize,
    ) -> Result<(), DomainError> {
        let mut spent = 0;
        for (key, delta) in ctx.tracker.divergent_facets(DIVERGENCE_POINTS) {
            if spent >= budget {
                break;
            }
            debug!(facet = %key, delta, "refining divergent facet");
            let query = picks.apply_exclusions(query_for_dimension(&key));
            let items = ctx
                .repo
                .find_many(
                    &query,
                    ItemOrdering::DiscriminationDesc,
                    ITEMS_PER_DIVERGENT_FACET.min(budget - spent),
                )
                .await?;
            let items = retain_well_formed(items);
            spent += items.len();
            picks.extend(items);
        }
        Ok(())
    }

    /// 30% bucket: atypical clinical patterns that warrant validation.
    ///
    /// Elevated depression without elevated anxiety validates both scales;
    /// any elevated mania score always validates further.
    async fn validate_clinical_patterns(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        budget: usize,
    ) -> Result<(), DomainError> {
        let score_of = |scale: ClinicalScale| {
            ctx.tracker
                .score(&DimensionKey::Clinical(scale))
                .map(|s| s.value())
        };

        let mut scales: Vec<ClinicalScale> = Vec::new();
        let depression_elevated =
            score_of(ClinicalScale::Depression).is_some_and(|s| s > ELEVATED_SCORE);
        let anxiety_elevated =
            score_of(ClinicalScale::Anxiety).is_some_and(|s| s > ELEVATED_SCORE);
        if depression_elevated && !anxiety_elevated {
            scales.push(ClinicalScale::Depression);
            scales.push(ClinicalScale::Anxiety);
        }
        if score_of(ClinicalScale::Mania).is_some_and(|s| s > ELEVATED_SCORE) {
            scales.push(ClinicalScale::Mania);
        }

        if scales.is_empty() || budget == 0 {
            return Ok(());
        }

        let per_scale = (budget / scales.len()).max(1);
        let mut spent = 0;
        for scale in scales {
            if spent >= budget {
                break;
            }
            let query =
                picks.apply_exclusions(query_for_dimension(&DimensionKey::Clinical(scale)));
            let items = ctx
                .repo
                .find_many(
                    &query,
                    ItemOrdering::DiscriminationDesc,
                    per_scale.min(budget - spent),
                )
                .await?;
            let items = retain_well_formed(items);
            spent += items.len();
            picks.extend(items);
        }
        Ok(())
    }
}
