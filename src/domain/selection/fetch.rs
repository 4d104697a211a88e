//! Shared fetch helpers for stage selectors.
//!
//! All repository reads flow through here so malformed-item filtering and
//! quota relaxation behave the same in every stage.

use std::collections::HashMap;
use tracing::warn;

use crate::domain::catalog::{Item, ItemCategory, ItemQuery};
use crate::domain::dimension::DimensionKey;
use crate::domain::foundation::DomainError;
use crate::ports::{ItemOrdering, ItemRepository};

/// Fetches up to `quota` items, relaxing the query when the pool is thin.
///
/// Relaxation order: exact query, then without the facet constraint, then
/// without subcategory/trait constraints. Each pass excludes what earlier
/// passes found. Malformed items are dropped with a warning rather than
/// failing the batch.
pub(crate) async fn fetch_quota(
    repo: &dyn ItemRepository,
    query: ItemQuery,
    ordering: ItemOrdering,
    quota: usize,
) -> Result<Vec<Item>, DomainError> {
    if quota == 0 {
        return Ok(Vec::new());
    }

    let mut found: Vec<Item> = Vec::new();
    let passes = [
        query.clone(),
        query.clone().relax_facet(),
        query.relax_facet().relax_scope(),
    ];

    for (pass, candidate) in passes.into_iter().enumerate() {
        if found.len() >= quota {
            break;
        }
        if pass > 0 {
            warn!(pass, quota, have = found.len(), "relaxing item query to fill quota");
        }
        let candidate = candidate.exclude(found.iter().map(|i: &Item| i.id()));
        let items = repo
            .find_many(&candidate, ordering, quota - found.len())
            .await?;
        found.extend(retain_well_formed(items));
    }

    found.truncate(quota);
    Ok(found)
}

/// Drops malformed items, logging each one.
pub(crate) fn retain_well_formed(items: Vec<Item>) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| {
            let ok = item.is_well_formed();
            if !ok {
                warn!(item_id = %item.id(), "dropping malformed item from selection");
            }
            ok
        })
        .collect()
}

/// The repository query that targets a confidence dimension.
pub(crate) fn query_for_dimension(key: &DimensionKey) -> ItemQuery {
    match key {
        DimensionKey::BigFive(t) => ItemQuery::new()
            .category(ItemCategory::Personality)
            .trait_key(*t),
        DimensionKey::Facet { parent, facet } => ItemQuery::new()
            .category(ItemCategory::Personality)
            .trait_key(*parent)
            .facet(facet.clone()),
        DimensionKey::Clinical(scale) => ItemQuery::new()
            .category(ItemCategory::Clinical)
            .tag(scale.key()),
        DimensionKey::Neurodiversity(kind) => ItemQuery::new()
            .category(ItemCategory::Neurodiversity)
            .tag(kind.key()),
        DimensionKey::Other(category) => match category.as_str() {
            "attachment" | "attachment_anxious" | "attachment_avoidant" => {
                let q = ItemQuery::new().category(ItemCategory::Attachment);
                match category.strip_prefix("attachment_") {
                    Some(style) => q.tag(style),
                    None => q,
                }
            }
            "trauma" => ItemQuery::new().category(ItemCategory::Trauma),
            "cognitive" => ItemQuery::new().category(ItemCategory::Cognitive),
            other => ItemQuery::new().tag(other),
        },
    }
}

/// Finds one complete inconsistency pair not yet excluded.
///
/// Returns both items of the first pair number whose members are all
/// available, or an empty vec when no complete pair remains.
pub(crate) async fn find_inconsistency_pair(
    repo: &dyn ItemRepository,
    exclusions: &ItemQuery,
) -> Result<Vec<Item>, DomainError> {
    let query = ItemQuery {
        category: Some(ItemCategory::Validity),
        tags: vec!["inconsistency".to_string()],
        ..exclusions.clone()
    };
    let candidates =
        retain_well_formed(repo.find_many(&query, ItemOrdering::Any, 50).await?);

    let mut pairs: HashMap<u32, Vec<Item>> = HashMap::new();
    for item in candidates {
        if let Some(n) = item.pair_number() {
            pairs.entry(n).or_default().push(item);
        }
    }

    let mut complete: Vec<(u32, Vec<Item>)> = pairs
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .collect();
    complete.sort_by_key(|(n, _)| *n);

    Ok(complete
        .into_iter()
        .next()
        .map(|(_, mut members)| {
            members.truncate(2);
            members
        })
        .unwrap_or_default())
}

/// Finds one closing validity item: infrequency first, then
/// positive-impression, then any validity item.
pub(crate) async fn find_validity_item(
    repo: &dyn ItemRepository,
    exclusions: &ItemQuery,
) -> Result<Option<Item>, DomainError> {
    let base = ItemQuery {
        category: Some(ItemCategory::Validity),
        ..exclusions.clone()
    };
    for tag in ["infrequency", "positive_impression"] {
        let query = base.clone().tag(tag);
        if let Some(item) = repo.find_one(&query, ItemOrdering::Any).await? {
            if item.is_well_formed() {
                return Ok(Some(item));
            }
        }
    }
    Ok(repo
        .find_one(&base, ItemOrdering::Any)
        .await?
        .filter(Item::is_well_formed))
}
