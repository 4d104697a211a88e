//! Item repository adapters.

mod cached_repository;
mod in_memory_repository;

pub use cached_repository::CachedItemRepository;
pub use in_memory_repository::InMemoryItemRepository;

use crate::domain::catalog::{Item, ItemQuery};
use crate::ports::ItemOrdering;

/// Applies a query, ordering, and limit to an in-memory item slice.
///
/// Shared by the in-memory repository and the pool cache so both filter
/// identically. Ordering is stable: equal keys keep bank order.
pub(crate) fn apply_query(
    items: &[Item],
    query: &ItemQuery,
    ordering: ItemOrdering,
    limit: usize,
) -> Vec<Item> {
    let mut matches: Vec<Item> = items.iter().filter(|i| query.matches(i)).cloned().collect();

    match ordering {
        ItemOrdering::Any => {}
        ItemOrdering::DiscriminationDesc => {
            matches.sort_by(|a, b| {
                b.discrimination_or_default()
                    .partial_cmp(&a.discrimination_or_default())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        ItemOrdering::DiscriminationThenDifficultyDesc => {
            matches.sort_by(|a, b| {
                b.discrimination_or_default()
                    .partial_cmp(&a.discrimination_or_default())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        b.difficulty_or_default()
                            .partial_cmp(&a.difficulty_or_default())
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
            });
        }
    }

    matches.truncate(limit);
    matches
}
