//! Spaced repetition scheduling.

pub mod retention;
pub mod sm2;

use crate::error::Result;
use crate::types::{MemoryState, Rating, ReviewEvent};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Result of scheduling a word after review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub new_state: MemoryState,
    pub next_review_date: NaiveDate,
    /// Whether the review counts towards the success rate, for callers that
    /// keep their own running statistic.
    pub was_success: bool,
}

/// Trait for spaced repetition algorithms.
///
/// Implementations are pure: no I/O and no shared mutable state, so one
/// instance can serve any number of threads.
pub trait SpacedRepetitionAlgorithm: Send + Sync {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate next memory state after a review.
    ///
    /// Fails only when `state` is outside the algorithm's input domain.
    fn schedule(
        &self,
        state: &MemoryState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<SchedulingResult>;

    /// Initial state for a word added on `today`.
    fn initial_state(&self, today: NaiveDate) -> MemoryState;

    /// Schedule a recorded review event.
    fn apply(&self, state: &MemoryState, event: &ReviewEvent) -> Result<SchedulingResult> {
        self.schedule(state, event.rating, event.occurred_at)
    }
}

/// Schedule a review with the default SM-2 parameters.
pub fn compute_next(state: &MemoryState, rating: Rating, now: DateTime<Utc>) -> Result<MemoryState> {
    sm2::Sm2::default()
        .schedule(state, rating, now)
        .map(|result| result.new_state)
}
