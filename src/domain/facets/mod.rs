//! Facet prioritization from cross-trait correlations.

mod intelligence;

pub use intelligence::{FacetIntelligence, FacetPriority};
