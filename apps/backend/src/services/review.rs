//! Review submission: load state, schedule, persist.
//!
//! Reviews for the same (user, word) pair are serialized so two concurrent
//! submissions can never both read the same prior state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use vocab_core::{
    LearningStage, MemoryState, Rating, ReviewEvent, SchedulingResult, SpacedRepetitionAlgorithm,
};

use crate::db::Database;
use crate::error::{ApiError, Result};
use crate::models::Word;

type PairKey = (i64, i64);

/// Per (user, word) async locks, dropped again once nobody holds them.
#[derive(Default)]
pub struct ReviewLocks {
    locks: Mutex<HashMap<PairKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ReviewLocks {
    fn entry(&self, key: PairKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key).or_default().clone()
    }

    fn release(&self, key: PairKey, lock: Arc<tokio::sync::Mutex<()>>) {
        drop(lock);
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(&key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&key);
        }
    }

    /// Number of pairs with a review in flight or waiting.
    pub fn active(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// What a review did to a word.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub previous: MemoryState,
    pub result: SchedulingResult,
    pub stage: LearningStage,
}

/// Applies reviews through the scheduler and writes them back.
pub struct ReviewService {
    db: Arc<Database>,
    scheduler: Arc<dyn SpacedRepetitionAlgorithm>,
    locks: ReviewLocks,
}

impl ReviewService {
    pub fn new(db: Arc<Database>, scheduler: Arc<dyn SpacedRepetitionAlgorithm>) -> Self {
        Self {
            db,
            scheduler,
            locks: ReviewLocks::default(),
        }
    }

    pub fn scheduler(&self) -> &dyn SpacedRepetitionAlgorithm {
        self.scheduler.as_ref()
    }

    pub fn locks(&self) -> &ReviewLocks {
        &self.locks
    }

    /// Initial memory state for a word added now.
    pub fn initial_state(&self, today: NaiveDate) -> MemoryState {
        self.scheduler.initial_state(today)
    }

    /// Record one review of `word_id` and return the updated state.
    pub async fn submit_review(
        &self,
        user_id: i64,
        word_id: i64,
        rating: Rating,
        response_time_ms: u32,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        let key = (user_id, word_id);
        let lock = self.locks.entry(key);
        let outcome = {
            let _guard = lock.lock().await;
            self.review_locked(user_id, word_id, ReviewEvent::new(rating, now), response_time_ms)
                .await
        };
        self.locks.release(key, lock);
        outcome
    }

    /// Put a word's schedule back to the initial values. Returns false when
    /// the word has no memory state.
    pub async fn reset_word(&self, user_id: i64, word_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let key = (user_id, word_id);
        let lock = self.locks.entry(key);
        let reset = {
            let _guard = lock.lock().await;
            let initial = self.scheduler.initial_state(now.date_naive());
            self.db.reset_memory_state(user_id, word_id, &initial).await
        };
        self.locks.release(key, lock);

        if matches!(reset, Ok(true)) {
            tracing::info!(user_id, word_id, "word progress reset");
        }
        reset
    }

    async fn review_locked(
        &self,
        user_id: i64,
        word_id: i64,
        event: ReviewEvent,
        response_time_ms: u32,
    ) -> Result<ReviewOutcome> {
        let word = self
            .db
            .get_word(user_id, word_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("word {}", word_id)))?;

        let previous = self.load_state(user_id, &word).await?;

        let result = self.scheduler.apply(&previous, &event).map_err(|e| {
            tracing::warn!(user_id, word_id, "rejected review: {}", e);
            ApiError::from(e)
        })?;

        self.db
            .record_review(
                user_id,
                word_id,
                &previous,
                event.rating,
                response_time_ms,
                &result,
            )
            .await?;

        tracing::info!(
            user_id,
            word_id,
            rating = %event.rating,
            interval_before = previous.interval_days,
            interval_after = result.new_state.interval_days,
            next_review = %result.next_review_date,
            "review recorded"
        );

        Ok(ReviewOutcome {
            stage: result.new_state.stage(),
            previous,
            result,
        })
    }

    /// Stored state, or a fresh one if the word never got a state row.
    async fn load_state(&self, user_id: i64, word: &Word) -> Result<MemoryState> {
        match self.db.get_memory_state(user_id, word.id).await? {
            Some(stored) => stored.to_core_state(),
            None => {
                tracing::info!(
                    user_id,
                    word_id = word.id,
                    "no memory state found, starting from defaults"
                );
                Ok(self.scheduler.initial_state(word.created_at.date_naive()))
            }
        }
    }
}
