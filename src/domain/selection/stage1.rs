//! Stage 1 - Broad Screening.
//!
//! A fixed-composition first batch: one anchor per Big-Five trait, the two
//! items of each short clinical screener, the strongest item per
//! neurodiversity flag, and a first round of validity items. The batch is
//! shuffled in two passes so the respondent never sees an instrument run.

use rand::Rng;

use super::context::SelectionContext;
use super::fetch::{find_inconsistency_pair, retain_well_formed};
use super::picks::BatchPicks;
use super::shuffle::{two_pass_shuffle, SHUFFLE_CHUNK};
use crate::domain::catalog::{Item, ItemCategory, ItemQuery};
use crate::domain::dimension::{BigFiveTrait, NeurodiversityKind};
use crate::domain::foundation::DomainError;
use crate::ports::ItemOrdering;

/// Discrimination bar for the anchor fallback query.
const ANCHOR_DISCRIMINATION: f64 = 0.7;

/// Short screener instruments opened in Stage 1, two items each.
const SCREENER_INSTRUMENTS: [&str; 2] = ["phq2", "gad2"];

/// Neurodiversity flags probed with their single strongest item.
const ND_FLAGS: [NeurodiversityKind; 3] = [
    NeurodiversityKind::Adhd,
    NeurodiversityKind::Autism,
    NeurodiversityKind::SensoryProcessing,
];

/// Stage 1 selector.
pub struct BroadScreeningSelector;

impl BroadScreeningSelector {
    /// Builds the broad-screening batch.
    pub async fn select_questions<R: Rng>(
        ctx: &SelectionContext<'_>,
        rng: &mut R,
    ) -> Result<Vec<Item>, DomainError> {
        let policy = &ctx.config.stages.stage1;
        let mut picks = BatchPicks::new(ctx.session.presented());

        // One anchor item per Big-Five trait.
        for t in BigFiveTrait::all() {
            if let Some(anchor) = Self::find_anchor(ctx, &picks, *t).await? {
                picks.add(anchor);
            }
        }

        // The first two items of each short clinical screener.
        for instrument in SCREENER_INSTRUMENTS {
            let query = picks.apply_exclusions(
                ItemQuery::new()
                    .category(ItemCategory::Clinical)
                    .instrument(instrument),
            );
            let items = ctx.repo.find_many(&query, ItemOrdering::Any, 2).await?;
            picks.extend(retain_well_formed(items));
        }

        // The single highest-discrimination item per neurodiversity flag.
        for kind in ND_FLAGS {
            let query = picks.apply_exclusions(
                ItemQuery::new()
                    .category(ItemCategory::Neurodiversity)
                    .tag(kind.key()),
            );
            if let Some(item) = ctx
                .repo
                .find_one(&query, ItemOrdering::DiscriminationDesc)
                .await?
            {
                if item.is_well_formed() {
                    picks.add(item);
                }
            }
        }

        // One complete inconsistency pair plus one infrequency item.
        let pair =
            find_inconsistency_pair(ctx.repo, &picks.apply_exclusions(ItemQuery::new())).await?;
        picks.extend(pair);

        let infrequency = picks.apply_exclusions(
            ItemQuery::new()
                .category(ItemCategory::Validity)
                .tag("infrequency"),
        );
        if let Some(item) = ctx.repo.find_one(&infrequency, ItemOrdering::Any).await? {
            if item.is_well_formed() {
                picks.add(item);
            }
        }

        let mut items = picks.into_items();
        two_pass_shuffle(&mut items, SHUFFLE_CHUNK, rng);
        items.truncate(policy.batch_max);
        Ok(items)
    }

    /// Anchor preference: tagged anchors, then discrimination >= 0.7, then
    /// any active trait item.
    async fn find_anchor(
        ctx: &SelectionContext<'_>,
        picks: &BatchPicks,
        t: BigFiveTrait,
    ) -> Result<Option<Item>, DomainError> {
        let base = picks.apply_exclusions(
            ItemQuery::new()
                .category(ItemCategory::Personality)
                .trait_key(t),
        );

        let tagged = base.clone().any_tag(["anchor", "high_loading"]);
        if let Some(item) = ctx
            .repo
            .find_one(&tagged, ItemOrdering::DiscriminationDesc)
            .await?
        {
            if item.is_well_formed() {
                return Ok(Some(item));
            }
        }

        let high = base.clone().min_discrimination(ANCHOR_DISCRIMINATION);
        if let Some(item) = ctx
            .repo
            .find_one(&high, ItemOrdering::DiscriminationDesc)
            .await?
        {
            if item.is_well_formed() {
                return Ok(Some(item));
            }
        }

        Ok(ctx
            .repo
            .find_one(&base, ItemOrdering::DiscriminationDesc)
            .await?
            .filter(Item::is_well_formed))
    }
}
