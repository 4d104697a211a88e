//! Dimension model - named constructs the engine estimates.
//!
//! Dimensions are typed internally and string-keyed at the persistence
//! boundary so snapshots stay compatible with existing stored sessions.

mod big_five;
mod key;
mod mapper;

pub use big_five::BigFiveTrait;
pub use key::{ClinicalScale, DimensionKey, NeurodiversityKind};
pub use mapper::DimensionMapper;
