//! Running batch selection with a shared exclusion set.
//!
//! Every stage selector accumulates its picks here: the set starts from
//! the session's already-presented ids, and every accepted item extends
//! it, so no sub-query can ever pick a duplicate.

use std::collections::HashSet;

use crate::domain::catalog::{Item, ItemQuery};
use crate::domain::foundation::ItemId;

#[derive(Debug, Default)]
pub(crate) struct BatchPicks {
    items: Vec<Item>,
    excluded: HashSet<ItemId>,
}

impl BatchPicks {
    /// Starts a batch with the session's presented ids pre-excluded.
    pub(crate) fn new(presented: &[ItemId]) -> Self {
        Self {
            items: Vec::new(),
            excluded: presented.iter().cloned().collect(),
        }
    }

    /// Accepts an item unless its id is already excluded.
    ///
    /// Returns true when the item joined the batch.
    pub(crate) fn add(&mut self, item: Item) -> bool {
        if self.excluded.contains(item.id()) {
            return false;
        }
        self.excluded.insert(item.id().clone());
        self.items.push(item);
        true
    }

    /// Accepts a sequence of items, dropping duplicates.
    pub(crate) fn extend(&mut self, items: impl IntoIterator<Item = Item>) {
        for item in items {
            self.add(item);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Applies the full exclusion set (presented plus picked) to a query.
    pub(crate) fn apply_exclusions(&self, query: ItemQuery) -> ItemQuery {
        query.exclude(self.excluded.iter())
    }

    /// Keeps at most `max` items, dropping from the back.
    pub(crate) fn truncate(&mut self, max: usize) {
        self.items.truncate(max);
    }

    pub(crate) fn into_items(self) -> Vec<Item> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::ItemCategory;

    fn item(id: &str) -> Item {
        Item::new(ItemId::new(id).unwrap(), "text", ItemCategory::Clinical)
    }

    #[test]
    fn presented_ids_are_rejected() {
        let presented = vec![ItemId::new("a").unwrap()];
        let mut picks = BatchPicks::new(&presented);
        assert!(!picks.add(item("a")));
        assert!(picks.add(item("b")));
        assert_eq!(picks.len(), 1);
    }

    #[test]
    fn double_add_is_rejected() {
        let mut picks = BatchPicks::new(&[]);
        assert!(picks.add(item("x")));
        assert!(!picks.add(item("x")));
        assert_eq!(picks.len(), 1);
    }

    #[test]
    fn exclusions_flow_into_queries() {
        let mut picks = BatchPicks::new(&[ItemId::new("seed").unwrap()]);
        picks.add(item("picked"));

        let query = picks.apply_exclusions(ItemQuery::new());
        assert!(!query.matches(&item("seed")));
        assert!(!query.matches(&item("picked")));
        assert!(query.matches(&item("fresh")));
    }
}
