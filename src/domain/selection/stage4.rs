//! Stage 4 - Gap Filling (terminal).
//!
//! Computes the exact remaining budget and lands the session on the target
//! total: 60% to coverage gaps, 40% to archetype-themed items, exactly one
//! closing validity item, and a global backfill that makes up any
//! shortfall. Never more than the budget, and an under-filled terminal
//! batch is a fatal pool-exhaustion error rather than a short session.

use std::collections::HashSet;
use tracing::debug;

use super::archetype::Archetype;
use super::context::SelectionContext;
use super::fetch::{find_validity_item, retain_well_formed};
use super::picks::BatchPicks;
use crate::domain::catalog::{Item, ItemCategory, ItemQuery};
use crate::domain::dimension::DimensionKey;
use crate::domain::foundation::{DomainError, ItemId};
use crate::ports::ItemOrdering;

/// Clinical running average above which trauma/borderline gaps escalate.
const CLINICAL_CONTEXT_SCORE: f64 = 60.0;

/// Instruments audited for coverage in the terminal stage.
const IMPORTANT_INSTRUMENTS: [&str; 6] = [
    "attachment",
    "resilience",
    "interpersonal",
    "honesty_humility",
    "msi_bpd",
    "audit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GapPriority {
    High,
    Medium,
    Low,
}

struct CoverageGap {
    query: ItemQuery,
    priority: GapPriority,
}

/// Stage 4 selector.
pub struct GapFillingSelector;

impl GapFillingSelector {
    /// Builds the terminal batch of exactly the remaining budget.
    pub async fn select_questions(
        ctx: &SelectionContext<'_>,
    ) -> Result<Vec<Item>, DomainError> {
        let remaining = ctx.remaining_budget();
        if remaining == 0 {
            return Ok(Vec::new());
        }

        let mut picks = BatchPicks::new(ctx.session.presented());

        // One slot is reserved for the closing validity item.
        let usable = remaining.saturating_sub(1);
        let gap_budget = usable * 60 / 100;

        let gaps = Self::coverage_gaps(ctx).await?;
        let gap_spent = Self::fill_gaps(ctx, &mut picks, &gaps, gap_budget).await?;

        let archetype = Archetype::predict(ctx.tracker);
        debug!(archetype = %archetype, "selecting archetype-themed items");
        Self::fill_archetype(ctx, &mut picks, archetype, usable.saturating_sub(gap_spent))
            .await?;

        // Exactly one closing validity item.
        if let Some(item) =
            find_validity_item(ctx.repo, &picks.apply_exclusions(ItemQuery::new())).await?
        {
            picks.add(item);
        }

        // Land exactly on the target: backfill with the globally strongest
        // unused items, then hard-truncate.
        if picks.len() < remaining {
            let query = picks.apply_exclusions(ItemQuery::new());
            let fill = ctx
                .repo
                .find_many(
                    &query,
                    ItemOrdering::DiscriminationThenDifficultyDesc,
                    remaining - picks.len(),
                )
                .await?;
            picks.extend(retain_well_formed(fill));
        }

        if picks.len() < remaining {
            return Err(DomainError::pool_exhausted(remaining, picks.len()));
        }
        picks.truncate(remaining);
        Ok(picks.into_items())
    }

    /// Audits categories and important instruments never touched by an
    /// answered item, assigning each gap a contextual priority.
    async fn coverage_gaps(ctx: &SelectionContext<'_>) -> Result<Vec<CoverageGap>, DomainError> {
        let answered_ids: Vec<ItemId> = ctx
            .session
            .responses()
            .iter()
            .map(|r| r.item_id.clone())
            .collect();
        let answered_items = ctx.repo.find_by_ids(&answered_ids).await?;

        let touched_categories: HashSet<ItemCategory> =
            answered_items.iter().map(|i| i.category()).collect();
        let touched_instruments: HashSet<&str> =
            answered_items.iter().filter_map(|i| i.instrument()).collect();
        let relationship_context = answered_items.iter().any(|i| i.has_tag("relationship"));
        let clinical_average = Self::clinical_average(ctx);

        let attachment_priority = if relationship_context {
            GapPriority::High
        } else {
            GapPriority::Medium
        };
        let trauma_priority = if clinical_average > CLINICAL_CONTEXT_SCORE {
            GapPriority::High
        } else {
            GapPriority::Low
        };
        let borderline_priority = if clinical_average > CLINICAL_CONTEXT_SCORE {
            GapPriority::High
        } else {
            GapPriority::Medium
        };

        let mut gaps = Vec::new();
        for category in ItemCategory::coverage_categories() {
            if touched_categories.contains(category) {
                continue;
            }
            let priority = match category {
                ItemCategory::Personality => GapPriority::High,
                ItemCategory::Clinical => GapPriority::Medium,
                ItemCategory::Neurodiversity => GapPriority::Medium,
                ItemCategory::Attachment => attachment_priority,
                ItemCategory::Trauma => trauma_priority,
                ItemCategory::Cognitive => GapPriority::Low,
                ItemCategory::Validity => continue,
            };
            gaps.push(CoverageGap {
                query: ItemQuery::new().category(*category),
                priority,
            });
        }

        for instrument in IMPORTANT_INSTRUMENTS {
            if touched_instruments.contains(instrument) {
                continue;
            }
            let priority = match instrument {
                "attachment" => attachment_priority,
                "msi_bpd" => borderline_priority,
                "honesty_humility" => GapPriority::Low,
                _ => GapPriority::Medium,
            };
            gaps.push(CoverageGap {
                query: ItemQuery::new().instrument(instrument),
                priority,
            });
        }

        // High first; stable sort keeps category gaps ahead of instrument
        // gaps at equal priority.
        gaps.sort_by_key(|g| g.priority);
        Ok(gaps)
    }

    async fn fill_gaps(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        gaps: &[CoverageGap],
        budget: usize,
    ) -> Result<usize, DomainError> {
        if gaps.is_empty() || budget == 0 {
            return Ok(0);
        }
        let per_gap = (budget / gaps.len()).max(1);

        let mut spent = 0;
        for gap in gaps {
            if spent >= budget {
                break;
            }
            let query = picks.apply_exclusions(gap.query.clone());
            let items = ctx
                .repo
                .find_many(
                    &query,
                    ItemOrdering::DiscriminationDesc,
                    per_gap.min(budget - spent),
                )
                .await?;
            let items = retain_well_formed(items);
            spent += items.len();
            picks.extend(items);
        }
        Ok(spent)
    }

    async fn fill_archetype(
        ctx: &SelectionContext<'_>,
        picks: &mut BatchPicks,
        archetype: Archetype,
        budget: usize,
    ) -> Result<(), DomainError> {
        if budget == 0 {
            return Ok(());
        }
        let themes = archetype.themed_queries();
        let per_theme = (budget / themes.len()).max(1);

        let mut spent = 0;
        for theme in themes {
            if spent >= budget {
                break;
            }
            let query = picks.apply_exclusions(theme);
            let items = ctx
                .repo
                .find_many(
                    &query,
                    ItemOrdering::DiscriminationDesc,
                    per_theme.min(budget - spent),
                )
                .await?;
            let items = retain_well_formed(items);
            spent += items.len();
            picks.extend(items);
        }
        Ok(())
    }

    /// Mean running score across tracked clinical scales, 0 when none.
    fn clinical_average(ctx: &SelectionContext<'_>) -> f64 {
        let scores: Vec<f64> = ctx
            .tracker
            .iter()
            .filter(|(key, _)| matches!(key, DimensionKey::Clinical(_)))
            .map(|(_, record)| record.average().value())
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::InMemoryItemRepository;
    use crate::config::AppConfig;
    use crate::domain::confidence::{ConfidenceTracker, ScoredResponse};
    use crate::domain::dimension::{BigFiveTrait, ClinicalScale};
    use crate::domain::foundation::{Score, SessionId, Timestamp, UserId};
    use crate::domain::session::{AssessmentSession, RecordedResponse};
    use std::collections::HashSet;

    fn item(id: &str, category: ItemCategory) -> Item {
        Item::new(ItemId::new(id).unwrap(), "text", category)
    }

    /// A wide bank: plenty of everything the terminal stage may want.
    fn bank() -> Vec<Item> {
        let mut items = Vec::new();
        for t in BigFiveTrait::all() {
            for facet in t.facets() {
                items.push(
                    item(&format!("{}_{}", t.key(), facet), ItemCategory::Personality)
                        .with_trait(*t)
                        .with_facet(*facet)
                        .with_discrimination(0.7),
                );
            }
        }
        for n in 0..10 {
            items.push(
                item(&format!("cli_{}", n), ItemCategory::Clinical)
                    .with_tag("depression")
                    .with_discrimination(0.65),
            );
            items.push(
                item(&format!("att_{}", n), ItemCategory::Attachment)
                    .with_instrument("attachment")
                    .with_discrimination(0.6),
            );
            items.push(
                item(&format!("tra_{}", n), ItemCategory::Trauma).with_discrimination(0.6),
            );
            items.push(
                item(&format!("cog_{}", n), ItemCategory::Cognitive).with_discrimination(0.55),
            );
            items.push(
                item(&format!("nd_{}", n), ItemCategory::Neurodiversity)
                    .with_tag("adhd")
                    .with_discrimination(0.6),
            );
            items.push(
                item(&format!("res_{}", n), ItemCategory::Personality)
                    .with_instrument("resilience")
                    .with_discrimination(0.6),
            );
        }
        items.push(item("vld_inf", ItemCategory::Validity).with_tag("infrequency"));
        items.push(
            item("vld_pi", ItemCategory::Validity).with_tag("positive_impression"),
        );
        items
    }

    fn session_with_answers(n: usize) -> AssessmentSession {
        let mut session =
            AssessmentSession::new(SessionId::new(), UserId::new("u1").unwrap());
        for i in 0..n {
            let id = ItemId::new(format!("answered_{}", i)).unwrap();
            session.mark_presented(&[id.clone()]).unwrap();
            session
                .record_response(RecordedResponse {
                    item_id: id,
                    score: Score::new(50.0),
                    latency_ms: None,
                    answered_at: Timestamp::from_unix_secs(1_700_000_000),
                    dimensions: vec![],
                })
                .unwrap();
        }
        session
    }

    async fn select_with(
        bank: Vec<Item>,
        tracker: &ConfidenceTracker,
        session: &AssessmentSession,
    ) -> Result<Vec<Item>, DomainError> {
        let repo = InMemoryItemRepository::new(bank);
        let config = AppConfig::default();
        let ctx = SelectionContext {
            repo: &repo,
            tracker,
            session,
            config: &config,
        };
        GapFillingSelector::select_questions(&ctx).await
    }

    #[tokio::test]
    async fn lands_exactly_on_the_remaining_budget() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(58);
        let batch = select_with(bank(), &tracker, &session).await.unwrap();
        assert_eq!(batch.len(), 12);
    }

    #[tokio::test]
    async fn batch_is_empty_when_target_is_reached() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(70);
        let batch = select_with(bank(), &tracker, &session).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn includes_exactly_one_validity_item() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(58);
        let batch = select_with(bank(), &tracker, &session).await.unwrap();
        let validity = batch
            .iter()
            .filter(|i| i.category() == ItemCategory::Validity)
            .count();
        assert_eq!(validity, 1);
        // infrequency preferred over positive impression
        assert!(batch.iter().any(|i| i.id().as_str() == "vld_inf"));
    }

    #[tokio::test]
    async fn remaining_budget_of_one_is_just_the_validity_item() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(69);
        let batch = select_with(bank(), &tracker, &session).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].category(), ItemCategory::Validity);
    }

    #[tokio::test]
    async fn untouched_categories_are_gap_filled() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(58);
        let batch = select_with(bank(), &tracker, &session).await.unwrap();
        // nothing was answered, so every category is a gap; attachment and
        // trauma items should appear
        assert!(batch.iter().any(|i| i.category() == ItemCategory::Attachment));
        assert!(batch.iter().any(|i| i.category() == ItemCategory::Trauma));
    }

    #[tokio::test]
    async fn elevated_clinical_average_escalates_trauma_gap() {
        let mut tracker = ConfidenceTracker::new();
        tracker.update_confidence(
            DimensionKey::Clinical(ClinicalScale::Depression),
            ScoredResponse::new(
                ItemId::new("c1").unwrap(),
                Score::new(80.0),
                Timestamp::from_unix_secs(1_700_000_000),
            ),
        );

        // tight bank: only two trauma items and a competing cognitive pool
        let mut small = vec![
            item("tra_a", ItemCategory::Trauma).with_discrimination(0.5),
            item("tra_b", ItemCategory::Trauma).with_discrimination(0.5),
        ];
        for n in 0..30 {
            small.push(
                item(&format!("cog_{}", n), ItemCategory::Cognitive).with_discrimination(0.9),
            );
        }
        small.push(item("vld_inf", ItemCategory::Validity).with_tag("infrequency"));

        let session = session_with_answers(64);
        let batch = select_with(small, &tracker, &session).await.unwrap();
        // trauma ranks High, so its items appear despite the tight budget
        assert!(batch.iter().any(|i| i.category() == ItemCategory::Trauma));
        assert_eq!(batch.len(), 6);
    }

    #[tokio::test]
    async fn no_duplicates_and_never_over_budget() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(55);
        let batch = select_with(bank(), &tracker, &session).await.unwrap();
        assert_eq!(batch.len(), 15);
        let ids: HashSet<&str> = batch.iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids.len(), batch.len());
    }

    #[tokio::test]
    async fn exhausted_pool_is_a_fatal_error() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(58);
        // 12 needed, only 3 available
        let tiny = vec![
            item("a", ItemCategory::Clinical),
            item("b", ItemCategory::Trauma),
            item("vld_inf", ItemCategory::Validity).with_tag("infrequency"),
        ];
        let result = select_with(tiny, &tracker, &session).await;
        let err = result.unwrap_err();
        assert_eq!(
            err.code,
            crate::domain::foundation::ErrorCode::QuestionPoolExhausted
        );
    }

    #[tokio::test]
    async fn backfill_prefers_discrimination_then_difficulty() {
        let tracker = ConfidenceTracker::new();
        let session = session_with_answers(67);
        // no gap/archetype matches beyond these plain items
        let bank = vec![
            item("low", ItemCategory::Cognitive).with_discrimination(0.5),
            item("hard", ItemCategory::Cognitive)
                .with_discrimination(0.8)
                .with_difficulty(2.0),
            item("easy", ItemCategory::Cognitive)
                .with_discrimination(0.8)
                .with_difficulty(0.5),
            item("vld_inf", ItemCategory::Validity).with_tag("infrequency"),
        ];
        let batch = select_with(bank, &tracker, &session).await.unwrap();
        assert_eq!(batch.len(), 3);
        let ids: Vec<&str> = batch.iter().map(|i| i.id().as_str()).collect();
        // cognitive gap fills first (low priority but only gap), then
        // validity, then the strongest backfill
        assert!(ids.contains(&"vld_inf"));
        assert!(ids.contains(&"hard"));
    }
}
