//! Shared inputs to every stage selector.

use crate::config::AppConfig;
use crate::domain::confidence::ConfidenceTracker;
use crate::domain::session::AssessmentSession;
use crate::ports::ItemRepository;

/// Everything a stage selector needs: the question bank, the working
/// confidence tracker, the session snapshot, and configuration.
pub struct SelectionContext<'a> {
    pub repo: &'a dyn ItemRepository,
    pub tracker: &'a ConfidenceTracker,
    pub session: &'a AssessmentSession,
    pub config: &'a AppConfig,
}

impl<'a> SelectionContext<'a> {
    /// Items still owed to reach the configured target total.
    pub fn remaining_budget(&self) -> usize {
        self.config
            .engine
            .target_total
            .saturating_sub(self.session.answered_count())
    }
}
