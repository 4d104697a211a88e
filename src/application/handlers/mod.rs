//! Command handlers.

mod create_session;
mod next_questions;
mod submit_responses;

pub use create_session::{CreateSessionCommand, CreateSessionHandler};
pub use next_questions::{NextQuestionsCommand, NextQuestionsHandler};
pub use submit_responses::{
    AnswerSubmission, SubmitResponsesCommand, SubmitResponsesHandler, SubmitResponsesResult,
};
