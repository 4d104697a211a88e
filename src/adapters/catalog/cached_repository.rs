//! Cached Item Repository Adapter
//!
//! TTL-bound snapshot of the whole question pool in front of a slower
//! repository. Explicitly constructed and injected; carries its own
//! `invalidate()` for deployments that edit the bank at runtime.

use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::apply_query;
use crate::domain::catalog::{Item, ItemQuery};
use crate::domain::foundation::{DomainError, ItemId, Timestamp};
use crate::ports::{ItemOrdering, ItemRepository};

struct PoolSnapshot {
    items: Vec<Item>,
    fetched_at: Timestamp,
}

/// Caching decorator over any [`ItemRepository`].
#[derive(Clone)]
pub struct CachedItemRepository {
    inner: Arc<dyn ItemRepository>,
    ttl_secs: u64,
    snapshot: Arc<RwLock<Option<PoolSnapshot>>>,
}

impl CachedItemRepository {
    /// Wraps a repository with a pool cache of the given TTL.
    pub fn new(inner: Arc<dyn ItemRepository>, ttl_secs: u64) -> Self {
        Self {
            inner,
            ttl_secs,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    /// Drops the cached pool; the next read refetches.
    pub async fn invalidate(&self) {
        debug!("invalidating question pool cache");
        *self.snapshot.write().await = None;
    }

    async fn pool(&self) -> Result<Vec<Item>, DomainError> {
        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                if !self.expired(snapshot) {
                    return Ok(snapshot.items.clone());
                }
            }
        }

        // Stale or empty: refetch the full pool (inactive included so
        // count/filter semantics match the inner repository).
        let items = self
            .inner
            .find_many(
                &ItemQuery::new().include_inactive(),
                ItemOrdering::Any,
                usize::MAX,
            )
            .await?;
        debug!(items = items.len(), "refreshed question pool cache");

        let mut guard = self.snapshot.write().await;
        *guard = Some(PoolSnapshot {
            items: items.clone(),
            fetched_at: Timestamp::now(),
        });
        Ok(items)
    }

    fn expired(&self, snapshot: &PoolSnapshot) -> bool {
        let age = Timestamp::now().duration_since(&snapshot.fetched_at);
        age > Duration::seconds(self.ttl_secs as i64)
    }
}

#[async_trait]
impl ItemRepository for CachedItemRepository {
    async fn find_one(
        &self,
        query: &ItemQuery,
        ordering: ItemOrdering,
    ) -> Result<Option<Item>, DomainError> {
        let pool = self.pool().await?;
        Ok(apply_query(&pool, query, ordering, 1).into_iter().next())
    }

    async fn find_many(
        &self,
        query: &ItemQuery,
        ordering: ItemOrdering,
        limit: usize,
    ) -> Result<Vec<Item>, DomainError> {
        let pool = self.pool().await?;
        Ok(apply_query(&pool, query, ordering, limit))
    }

    async fn find_by_ids(&self, ids: &[ItemId]) -> Result<Vec<Item>, DomainError> {
        let pool = self.pool().await?;
        Ok(ids
            .iter()
            .filter_map(|id| pool.iter().find(|i| i.id() == id).cloned())
            .collect())
    }

    async fn count_active(&self) -> Result<usize, DomainError> {
        let pool = self.pool().await?;
        Ok(pool.iter().filter(|i| i.is_active()).count())
    }
}
