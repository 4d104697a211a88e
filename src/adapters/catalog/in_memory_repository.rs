//! In-Memory Item Repository Adapter
//!
//! Serves the question bank from a vector. Used by tests, simulations, and
//! as the backing source behind the pool cache.

use async_trait::async_trait;
use std::collections::HashMap;

use super::apply_query;
use crate::domain::catalog::{Item, ItemQuery};
use crate::domain::foundation::{DomainError, ItemId};
use crate::ports::{ItemOrdering, ItemRepository};

/// In-memory question bank.
#[derive(Debug, Clone)]
pub struct InMemoryItemRepository {
    items: Vec<Item>,
}

impl InMemoryItemRepository {
    /// Creates a repository over a fixed item bank.
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Number of items in the bank, active or not.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find_one(
        &self,
        query: &ItemQuery,
        ordering: ItemOrdering,
    ) -> Result<Option<Item>, DomainError> {
        Ok(apply_query(&self.items, query, ordering, 1).into_iter().next())
    }

    async fn find_many(
        &self,
        query: &ItemQuery,
        ordering: ItemOrdering,
        limit: usize,
    ) -> Result<Vec<Item>, DomainError> {
        Ok(apply_query(&self.items, query, ordering, limit))
    }

    async fn find_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, DomainError> {
        let by_id: HashMap<&ItemId, &Item> = self.items.iter().map(|i| (i.id(), i)).collect();
        Ok(ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|i| (*i).clone()))
            .collect())
    }

    async fn count_active(&self) -> Result<usize, DomainError> {
        Ok(self.items.iter().filter(|i| i.is_active()).count())
    }
}
