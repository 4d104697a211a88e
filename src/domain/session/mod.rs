//! Assessment session aggregate.

mod aggregate;

pub use aggregate::{
    AssessmentSession, RecordedResponse, SessionStatus, StageTransition,
};
