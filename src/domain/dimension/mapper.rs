//! Pure item-to-dimension classification.
//!
//! The mapping runs exactly once per response, at submission time; the
//! resulting keys are stored on the response and never recomputed.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::{BigFiveTrait, ClinicalScale, DimensionKey, NeurodiversityKind};
use crate::domain::catalog::{Item, ItemCategory};

/// Instrument-name fallback for clinical items without scale tags.
static CLINICAL_INSTRUMENTS: Lazy<HashMap<&'static str, ClinicalScale>> = Lazy::new(|| {
    HashMap::from([
        ("phq2", ClinicalScale::Depression),
        ("phq9", ClinicalScale::Depression),
        ("gad2", ClinicalScale::Anxiety),
        ("gad7", ClinicalScale::Anxiety),
        ("asrm", ClinicalScale::Mania),
        ("pqb", ClinicalScale::Psychosis),
        ("msi_bpd", ClinicalScale::Borderline),
        ("phq15", ClinicalScale::Somatic),
        ("audit", ClinicalScale::SubstanceUse),
        ("cage", ClinicalScale::SubstanceUse),
        ("pcl5", ClinicalScale::Ptsd),
        ("pc_ptsd", ClinicalScale::Ptsd),
        ("oci_r", ClinicalScale::Ocd),
    ])
});

/// Subcategory fallback for neurodiversity items without kind tags.
static ND_SUBCATEGORIES: Lazy<HashMap<&'static str, NeurodiversityKind>> = Lazy::new(|| {
    HashMap::from([
        ("adhd", NeurodiversityKind::Adhd),
        ("attention", NeurodiversityKind::Adhd),
        ("autism", NeurodiversityKind::Autism),
        ("executive_function", NeurodiversityKind::ExecutiveFunction),
        ("sensory_processing", NeurodiversityKind::SensoryProcessing),
        ("sensory", NeurodiversityKind::SensoryProcessing),
        ("masking", NeurodiversityKind::Masking),
    ])
});

/// Pure classification function, item to dimension keys.
pub struct DimensionMapper;

impl DimensionMapper {
    /// Returns the deduplicated set of dimension keys this item updates.
    ///
    /// Validity items update no dimension; their responses only feed the
    /// careless-responding checks downstream.
    pub fn dimensions_of(item: &Item) -> Vec<DimensionKey> {
        let mut keys = Vec::new();

        match item.category() {
            ItemCategory::Personality => Self::personality_keys(item, &mut keys),
            ItemCategory::Clinical => Self::clinical_keys(item, &mut keys),
            ItemCategory::Neurodiversity => Self::neurodiversity_keys(item, &mut keys),
            ItemCategory::Attachment => Self::attachment_keys(item, &mut keys),
            ItemCategory::Trauma => push_unique(&mut keys, DimensionKey::Other("trauma".into())),
            ItemCategory::Cognitive => {
                push_unique(&mut keys, DimensionKey::Other("cognitive".into()))
            }
            ItemCategory::Validity => {}
        }

        keys
    }

    fn personality_keys(item: &Item, keys: &mut Vec<DimensionKey>) {
        let Some(t) = item.trait_key() else {
            return;
        };
        push_unique(keys, DimensionKey::BigFive(t));
        if let Some(facet) = item.facet() {
            push_unique(keys, DimensionKey::facet(t, facet));
        }
    }

    fn clinical_keys(item: &Item, keys: &mut Vec<DimensionKey>) {
        let before = keys.len();
        for scale in ClinicalScale::all() {
            if item.has_tag(scale.key()) {
                push_unique(keys, DimensionKey::Clinical(*scale));
            }
        }
        // Instrument fallback only when no tag resolved a scale.
        if keys.len() == before {
            if let Some(scale) = item
                .instrument()
                .and_then(|i| CLINICAL_INSTRUMENTS.get(i).copied())
            {
                push_unique(keys, DimensionKey::Clinical(scale));
            }
        }
    }

    fn neurodiversity_keys(item: &Item, keys: &mut Vec<DimensionKey>) {
        let before = keys.len();
        for kind in NeurodiversityKind::all() {
            if item.has_tag(kind.key()) {
                push_unique(keys, DimensionKey::Neurodiversity(*kind));
            }
        }
        if keys.len() == before {
            if let Some(kind) = item
                .subcategory()
                .and_then(|s| ND_SUBCATEGORIES.get(s).copied())
            {
                push_unique(keys, DimensionKey::Neurodiversity(kind));
            }
        }
    }

    fn attachment_keys(item: &Item, keys: &mut Vec<DimensionKey>) {
        push_unique(keys, DimensionKey::Other("attachment".into()));
        if item.has_tag("anxious") {
            push_unique(keys, DimensionKey::Other("attachment_anxious".into()));
        }
        if item.has_tag("avoidant") {
            push_unique(keys, DimensionKey::Other("attachment_avoidant".into()));
        }
    }
}

fn push_unique(keys: &mut Vec<DimensionKey>, key: DimensionKey) {
    if !keys.contains(&key) {
        keys.push(key);
    }
}
