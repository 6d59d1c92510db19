//! SM-2 spaced repetition algorithm.
//!
//! SuperMemo 2 variant with four discrete ratings. Every parameter is an
//! explicit field so callers can tune the scheduler without global state.

use super::{SchedulingResult, SpacedRepetitionAlgorithm};
use crate::error::{Result, ScheduleError};
use crate::types::{MemoryState, Rating, DEFAULT_EASINESS_FACTOR, DEFAULT_INTERVAL_DAYS};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub maximum_ease: f64,
    pub again_ease_penalty: f64,
    pub hard_ease_penalty: f64,
    pub easy_ease_bonus: f64,
    pub hard_multiplier: f64,
    pub easy_bonus: f64,
    pub initial_interval: u32,
    /// Upper bound on intervals. `None` leaves them uncapped.
    pub maximum_interval: Option<u32>,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: DEFAULT_EASINESS_FACTOR,
            minimum_ease: 1.3,
            maximum_ease: 3.0,
            again_ease_penalty: 0.20,
            hard_ease_penalty: 0.15,
            easy_ease_bonus: 0.15,
            hard_multiplier: 1.2,
            easy_bonus: 1.3,
            initial_interval: DEFAULT_INTERVAL_DAYS,
            maximum_interval: None,
        }
    }
}

impl SpacedRepetitionAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(&self, today: NaiveDate) -> MemoryState {
        MemoryState {
            easiness_factor: self.initial_ease,
            interval_days: self.initial_interval,
            ..MemoryState::new(today)
        }
    }

    fn schedule(
        &self,
        state: &MemoryState,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<SchedulingResult> {
        self.validate_state(state)?;

        let new_ease = self.next_ease(state.easiness_factor, rating);
        let new_interval = self.next_interval(state.interval_days, new_ease, rating);
        let new_repetitions = if rating.is_lapse() {
            0
        } else {
            state.repetitions.saturating_add(1)
        };

        let next_review_date = now
            .date_naive()
            .checked_add_days(Days::new(u64::from(new_interval)))
            .unwrap_or(NaiveDate::MAX);
        let was_success = rating.is_success();

        Ok(SchedulingResult {
            new_state: MemoryState {
                easiness_factor: new_ease,
                interval_days: new_interval,
                repetitions: new_repetitions,
                next_review_date,
                last_reviewed_at: Some(now),
                review_count: state.review_count.saturating_add(1),
                success_count: state.success_count.saturating_add(u32::from(was_success)),
            },
            next_review_date,
            was_success,
        })
    }
}

impl Sm2 {
    /// Check that the parameters describe a usable scheduler.
    pub fn validate(&self) -> Result<()> {
        let floats = [
            ("initial_ease", self.initial_ease),
            ("minimum_ease", self.minimum_ease),
            ("maximum_ease", self.maximum_ease),
            ("again_ease_penalty", self.again_ease_penalty),
            ("hard_ease_penalty", self.hard_ease_penalty),
            ("easy_ease_bonus", self.easy_ease_bonus),
            ("hard_multiplier", self.hard_multiplier),
            ("easy_bonus", self.easy_bonus),
        ];
        for (name, value) in floats {
            if !value.is_finite() || value < 0.0 {
                return Err(ScheduleError::InvalidConfig(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if self.minimum_ease <= 0.0 || self.minimum_ease > self.maximum_ease {
            return Err(ScheduleError::InvalidConfig(format!(
                "easiness bounds [{}, {}] are not a valid range",
                self.minimum_ease, self.maximum_ease
            )));
        }
        if !(self.minimum_ease..=self.maximum_ease).contains(&self.initial_ease) {
            return Err(ScheduleError::InvalidConfig(format!(
                "initial_ease {} outside [{}, {}]",
                self.initial_ease, self.minimum_ease, self.maximum_ease
            )));
        }
        if self.initial_interval == 0 {
            return Err(ScheduleError::InvalidConfig(
                "initial_interval must be at least one day".to_string(),
            ));
        }
        if self.maximum_interval == Some(0) {
            return Err(ScheduleError::InvalidConfig(
                "maximum_interval must be at least one day".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject states that could not have come out of this scheduler.
    pub fn validate_state(&self, state: &MemoryState) -> Result<()> {
        let ease = state.easiness_factor;
        if !ease.is_finite() || ease < self.minimum_ease || ease > self.maximum_ease {
            return Err(ScheduleError::EasinessOutOfRange {
                value: ease,
                min: self.minimum_ease,
                max: self.maximum_ease,
            });
        }
        if state.success_count > state.review_count {
            return Err(ScheduleError::InconsistentCounts {
                successes: state.success_count,
                reviews: state.review_count,
            });
        }
        Ok(())
    }

    fn next_ease(&self, ease: f64, rating: Rating) -> f64 {
        let ease = to_hundredths(ease);
        let adjusted = match rating {
            Rating::Again => ease - to_hundredths(self.again_ease_penalty),
            Rating::Hard => ease - to_hundredths(self.hard_ease_penalty),
            Rating::Good => ease,
            Rating::Easy => ease + to_hundredths(self.easy_ease_bonus),
        };
        let clamped = adjusted.clamp(
            to_hundredths(self.minimum_ease),
            to_hundredths(self.maximum_ease),
        );
        clamped as f64 / 100.0
    }

    /// `new_ease` is the factor after this review's adjustment.
    ///
    /// The product is formed in integer hundredths so that exact halves
    /// round up.
    fn next_interval(&self, interval: u32, new_ease: f64, rating: Rating) -> u32 {
        let (factor, scale) = match rating {
            // Due again in the current session.
            Rating::Again => return 0,
            Rating::Hard => (to_hundredths(self.hard_multiplier), 100),
            Rating::Good => (to_hundredths(new_ease), 100),
            Rating::Easy => (
                to_hundredths(new_ease) * to_hundredths(self.easy_bonus),
                10_000,
            ),
        };

        let product = i128::from(interval) * i128::from(factor.max(0));
        let rounded = (product + scale / 2) / scale;
        let days = u32::try_from(rounded).unwrap_or(u32::MAX).max(1);
        match self.maximum_interval {
            Some(cap) => days.min(cap),
            None => days,
        }
    }
}

/// Scheduler quantities live on a grid of hundredths.
fn to_hundredths(value: f64) -> i64 {
    // `as` saturates for out-of-range values.
    (value * 100.0).round() as i64
}
