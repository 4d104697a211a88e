//! Foundation types shared across the domain.
//!
//! Value objects, identifiers, errors, and time handling used by every
//! other domain module.

mod errors;
mod ids;
mod score;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ItemId, SessionId, UserId};
pub use score::{Confidence, Score};
pub use timestamp::Timestamp;
