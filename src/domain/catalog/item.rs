//! Question item entity.
//!
//! Items are read-only from the engine's perspective; the repository owns
//! them. Tag conventions the selectors rely on:
//!
//! - `anchor` / `high_loading`: preferred Stage-1 trait anchors
//! - `pair_<n>`: inconsistency-pair membership (both items share `n`)
//! - `infrequency` / `positive_impression`: validity sub-kinds
//! - `screener`: short-form clinical screening items

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::dimension::BigFiveTrait;
use crate::domain::foundation::ItemId;

/// Default discrimination index assumed when an item carries none.
pub const DEFAULT_DISCRIMINATION: f64 = 0.7;

/// Top-level item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Personality,
    Clinical,
    Neurodiversity,
    Attachment,
    Trauma,
    Cognitive,
    Validity,
}

impl ItemCategory {
    /// All categories in a fixed declaration order.
    pub fn all() -> &'static [ItemCategory] {
        &[
            ItemCategory::Personality,
            ItemCategory::Clinical,
            ItemCategory::Neurodiversity,
            ItemCategory::Attachment,
            ItemCategory::Trauma,
            ItemCategory::Cognitive,
            ItemCategory::Validity,
        ]
    }

    /// Content categories that Stage 4 audits for coverage gaps.
    ///
    /// Validity items are deliberately excluded; they are budgeted
    /// separately by every stage.
    pub fn coverage_categories() -> &'static [ItemCategory] {
        &[
            ItemCategory::Personality,
            ItemCategory::Clinical,
            ItemCategory::Neurodiversity,
            ItemCategory::Attachment,
            ItemCategory::Trauma,
            ItemCategory::Cognitive,
        ]
    }

    /// Returns the display label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            ItemCategory::Personality => "Personality",
            ItemCategory::Clinical => "Clinical",
            ItemCategory::Neurodiversity => "Neurodiversity",
            ItemCategory::Attachment => "Attachment",
            ItemCategory::Trauma => "Trauma",
            ItemCategory::Cognitive => "Cognitive",
            ItemCategory::Validity => "Validity",
        }
    }
}

/// A single question-bank item.
///
/// # Invariants
///
/// - `discrimination` and `difficulty`, when present, are finite
/// - `tags` is a set (no duplicates by construction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    text: String,
    category: ItemCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trait_key: Option<BigFiveTrait>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    facet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instrument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subcategory: Option<String>,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    discrimination: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    difficulty: Option<f64>,
    active: bool,
}

impl Item {
    /// Creates a new active item with the required fields.
    pub fn new(id: ItemId, text: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id,
            text: text.into(),
            category,
            trait_key: None,
            facet: None,
            instrument: None,
            subcategory: None,
            tags: BTreeSet::new(),
            discrimination: None,
            difficulty: None,
            active: true,
        }
    }

    /// Sets the Big-Five trait this item loads on.
    pub fn with_trait(mut self, t: BigFiveTrait) -> Self {
        self.trait_key = Some(t);
        self
    }

    /// Sets the facet within the item's trait.
    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = Some(facet.into());
        self
    }

    /// Sets the source instrument name (e.g. `phq9`, `gad7`).
    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    /// Sets the subcategory (used by neurodiversity items).
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets the discrimination index.
    pub fn with_discrimination(mut self, discrimination: f64) -> Self {
        self.discrimination = Some(discrimination);
        self
    }

    /// Sets the difficulty parameter.
    pub fn with_difficulty(mut self, difficulty: f64) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Marks the item inactive (retired from the pool).
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> ItemCategory {
        self.category
    }

    pub fn trait_key(&self) -> Option<BigFiveTrait> {
        self.trait_key
    }

    pub fn facet(&self) -> Option<&str> {
        self.facet.as_deref()
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn discrimination(&self) -> Option<f64> {
        self.discrimination
    }

    pub fn difficulty(&self) -> Option<f64> {
        self.difficulty
    }

    // ─────────────────────────────────────────────────────────────────────
    // Derived properties
    // ─────────────────────────────────────────────────────────────────────

    /// True if the item carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Discrimination index, or the pool-wide default when absent.
    pub fn discrimination_or_default(&self) -> f64 {
        self.discrimination.unwrap_or(DEFAULT_DISCRIMINATION)
    }

    /// Difficulty, or 0.0 when absent (sorts last for backfill).
    pub fn difficulty_or_default(&self) -> f64 {
        self.difficulty.unwrap_or(0.0)
    }

    /// Inconsistency-pair number parsed from a `pair_<n>` tag.
    pub fn pair_number(&self) -> Option<u32> {
        self.tags
            .iter()
            .find_map(|t| t.strip_prefix("pair_").and_then(|n| n.parse().ok()))
    }

    /// True for preferred Stage-1 trait anchors.
    pub fn is_anchor(&self) -> bool {
        self.has_tag("anchor") || self.has_tag("high_loading")
    }

    /// Structural sanity check applied when items cross the port boundary.
    ///
    /// Malformed items are filtered out of selections rather than failing
    /// the whole batch.
    pub fn is_well_formed(&self) -> bool {
        if self.text.trim().is_empty() {
            return false;
        }
        if let Some(d) = self.discrimination {
            if !d.is_finite() {
                return false;
            }
        }
        if let Some(d) = self.difficulty {
            if !d.is_finite() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item::new(
            ItemId::new(id).unwrap(),
            "I enjoy meeting new people.",
            ItemCategory::Personality,
        )
    }

    #[test]
    fn new_item_is_active_with_no_metadata() {
        let it = item("bfi_e_01");
        assert!(it.is_active());
        assert!(it.trait_key().is_none());
        assert!(it.tags().is_empty());
    }

    #[test]
    fn builder_sets_optional_fields() {
        let it = item("bfi_e_01")
            .with_trait(BigFiveTrait::Extraversion)
            .with_facet("warmth")
            .with_instrument("bfi2")
            .with_discrimination(0.82);

        assert_eq!(it.trait_key(), Some(BigFiveTrait::Extraversion));
        assert_eq!(it.facet(), Some("warmth"));
        assert_eq!(it.instrument(), Some("bfi2"));
        assert_eq!(it.discrimination(), Some(0.82));
    }

    #[test]
    fn discrimination_defaults_to_pool_average() {
        assert_eq!(item("x").discrimination_or_default(), DEFAULT_DISCRIMINATION);
        assert_eq!(
            item("x").with_discrimination(0.9).discrimination_or_default(),
            0.9
        );
    }

    #[test]
    fn pair_number_parses_from_tag() {
        let it = item("vld_03").with_tag("pair_7").with_tag("validity");
        assert_eq!(it.pair_number(), Some(7));
        assert_eq!(item("vld_04").pair_number(), None);
    }

    #[test]
    fn anchor_detection_uses_either_tag() {
        assert!(item("a").with_tag("anchor").is_anchor());
        assert!(item("b").with_tag("high_loading").is_anchor());
        assert!(!item("c").with_tag("screener").is_anchor());
    }

    #[test]
    fn well_formed_rejects_blank_text_and_non_finite_indices() {
        let blank = Item::new(
            ItemId::new("bad").unwrap(),
            "   ",
            ItemCategory::Clinical,
        );
        assert!(!blank.is_well_formed());

        let nan = item("nan").with_discrimination(f64::NAN);
        assert!(!nan.is_well_formed());

        assert!(item("ok").is_well_formed());
    }

    #[test]
    fn coverage_categories_exclude_validity() {
        assert!(!ItemCategory::coverage_categories().contains(&ItemCategory::Validity));
        assert_eq!(ItemCategory::coverage_categories().len(), 6);
    }

    #[test]
    fn category_serializes_to_snake_case() {
        let json = serde_json::to_string(&ItemCategory::Neurodiversity).unwrap();
        assert_eq!(json, "\"neurodiversity\"");
    }

    #[test]
    fn item_round_trips_through_json() {
        let it = item("bfi_e_01")
            .with_trait(BigFiveTrait::Extraversion)
            .with_tag("anchor")
            .with_difficulty(1.2);
        let json = serde_json::to_string(&it).unwrap();
        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back, it);
    }
}
