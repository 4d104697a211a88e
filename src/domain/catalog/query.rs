//! Repository query predicate for items.
//!
//! A plain data structure rather than closures so adapters backed by real
//! databases can translate it into their own query language.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Item, ItemCategory};
use crate::domain::dimension::BigFiveTrait;
use crate::domain::foundation::ItemId;

/// Predicate set understood by [`crate::ports::ItemRepository`].
///
/// All present fields must match (conjunction); `any_tags` matches when the
/// item carries at least one of the listed tags. Inactive items are excluded
/// unless `include_inactive` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ItemCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_key: Option<BigFiveTrait>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Tags the item must all carry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Tags of which the item must carry at least one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discrimination: Option<f64>,
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub exclude_ids: HashSet<ItemId>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl ItemQuery {
    /// Creates an empty query matching every active item.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: ItemCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn trait_key(mut self, t: BigFiveTrait) -> Self {
        self.trait_key = Some(t);
        self
    }

    pub fn facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = Some(facet.into());
        self
    }

    pub fn instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn any_tag(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.any_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn min_discrimination(mut self, min: f64) -> Self {
        self.min_discrimination = Some(min);
        self
    }

    /// Extends the id exclusion set.
    pub fn exclude<'a>(mut self, ids: impl IntoIterator<Item = &'a ItemId>) -> Self {
        self.exclude_ids.extend(ids.into_iter().cloned());
        self
    }

    pub fn include_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    /// Drops the facet constraint (filter relaxation, first step).
    pub fn relax_facet(mut self) -> Self {
        self.facet = None;
        self
    }

    /// Drops subcategory and trait constraints (filter relaxation, second step).
    pub fn relax_scope(mut self) -> Self {
        self.subcategory = None;
        self.trait_key = None;
        self
    }

    /// Evaluates the predicate against one item.
    pub fn matches(&self, item: &Item) -> bool {
        if !self.include_inactive && !item.is_active() {
            return false;
        }
        if self.exclude_ids.contains(item.id()) {
            return false;
        }
        if let Some(category) = self.category {
            if item.category() != category {
                return false;
            }
        }
        if let Some(t) = self.trait_key {
            if item.trait_key() != Some(t) {
                return false;
            }
        }
        if let Some(facet) = &self.facet {
            if item.facet() != Some(facet.as_str()) {
                return false;
            }
        }
        if let Some(instrument) = &self.instrument {
            if item.instrument() != Some(instrument.as_str()) {
                return false;
            }
        }
        if let Some(subcategory) = &self.subcategory {
            if item.subcategory() != Some(subcategory.as_str()) {
                return false;
            }
        }
        if !self.tags.iter().all(|t| item.has_tag(t)) {
            return false;
        }
        if !self.any_tags.is_empty() && !self.any_tags.iter().any(|t| item.has_tag(t)) {
            return false;
        }
        if let Some(min) = self.min_discrimination {
            if item.discrimination_or_default() < min {
                return false;
            }
        }
        true
    }
}
