//! Item repository port (read side).
//!
//! The question bank is an external collaborator; the engine only queries
//! it. Implementations must return only well-formed items (or let callers
//! filter, as the selectors do defensively anyway).

use async_trait::async_trait;

use crate::domain::catalog::{Item, ItemQuery};
use crate::domain::foundation::{DomainError, ItemId};

/// Result ordering for item queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemOrdering {
    /// No ordering requirement; adapters may return storage order.
    #[default]
    Any,
    /// Highest discrimination index first (absent indices rank at the
    /// pool default).
    DiscriminationDesc,
    /// Highest discrimination first, ties broken by highest difficulty.
    /// Used by terminal-stage backfill.
    DiscriminationThenDifficultyDesc,
}

/// Repository port for question-bank reads.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Finds the best match for a query, or None when the pool has none.
    ///
    /// # Errors
    ///
    /// - `RepositoryUnavailable` when the bank cannot be reached
    async fn find_one(
        &self,
        query: &ItemQuery,
        ordering: ItemOrdering,
    ) -> Result<Option<Item>, DomainError>;

    /// Finds up to `limit` matches for a query.
    ///
    /// # Errors
    ///
    /// - `RepositoryUnavailable` when the bank cannot be reached
    async fn find_many(
        &self,
        query: &ItemQuery,
        ordering: ItemOrdering,
        limit: usize,
    ) -> Result<Vec<Item>, DomainError>;

    /// Batch lookup for response enrichment. Unknown ids are omitted.
    async fn find_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, DomainError>;

    /// Number of active items in the whole bank.
    ///
    /// Used to detect a globally exhausted pool before a session starts.
    async fn count_active(&self) -> Result<usize, DomainError>;
}
