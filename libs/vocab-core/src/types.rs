//! Core types for vocabulary review scheduling.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Easiness factor given to a word the first time it is added.
pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;

/// Interval a fresh word starts from. Also the bootstrap value for the
/// first successful review.
pub const DEFAULT_INTERVAL_DAYS: u32 = 1;

/// Self-reported recall quality for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];

    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }

    /// Whether the review counts towards the lifetime success rate.
    ///
    /// `Hard` keeps the word progressing but is not counted as a success.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Good | Self::Easy)
    }

    /// A lapse: the learner failed to recall the word.
    pub fn is_lapse(self) -> bool {
        self == Self::Again
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = ScheduleError;

    /// Accepts the rating name in any case, or its 1-4 numeric value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let by_name = match trimmed.to_ascii_lowercase().as_str() {
            "again" => Some(Self::Again),
            "hard" => Some(Self::Hard),
            "good" => Some(Self::Good),
            "easy" => Some(Self::Easy),
            _ => None,
        };

        by_name
            .or_else(|| trimmed.parse::<u8>().ok().and_then(Self::from_value))
            .ok_or_else(|| ScheduleError::InvalidRating {
                value: s.to_string(),
            })
    }
}

/// Coarse progress bucket derived from a memory state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningStage {
    New,
    Learning,
    Review,
}

/// Per user and word memory state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub easiness_factor: f64,
    pub interval_days: u32,
    /// Consecutive non-lapse reviews since the last `Again`.
    pub repetitions: u32,
    pub next_review_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub review_count: u32,
    /// Lifetime count of `Good` and `Easy` ratings.
    pub success_count: u32,
}

impl MemoryState {
    /// Fresh state for a word added on `created_on`. The word is due at once.
    pub fn new(created_on: NaiveDate) -> Self {
        Self {
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            interval_days: DEFAULT_INTERVAL_DAYS,
            repetitions: 0,
            next_review_date: created_on,
            last_reviewed_at: None,
            review_count: 0,
            success_count: 0,
        }
    }

    /// Lifetime fraction of reviews rated `Good` or `Easy`.
    pub fn success_rate(&self) -> f64 {
        if self.review_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.review_count as f64
        }
    }

    pub fn stage(&self) -> LearningStage {
        if self.review_count == 0 {
            LearningStage::New
        } else if self.repetitions >= 2 {
            LearningStage::Review
        } else {
            LearningStage::Learning
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }
}

/// A single review, as handed to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub rating: Rating,
    pub occurred_at: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(rating: Rating, occurred_at: DateTime<Utc>) -> Self {
        Self {
            rating,
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rating_parses_names_and_numbers() {
        assert_eq!("again".parse::<Rating>().unwrap(), Rating::Again);
        assert_eq!("Easy".parse::<Rating>().unwrap(), Rating::Easy);
        assert_eq!(" HARD ".parse::<Rating>().unwrap(), Rating::Hard);
        assert_eq!("3".parse::<Rating>().unwrap(), Rating::Good);
    }

    #[test]
    fn rating_rejects_unknown_symbols() {
        for bad in ["", "0", "5", "perfect", "-1"] {
            let err = bad.parse::<Rating>().unwrap_err();
            assert_eq!(
                err,
                ScheduleError::InvalidRating {
                    value: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn rating_value_round_trips() {
        for rating in Rating::ALL {
            assert_eq!(Rating::from_value(rating.to_value()), Some(rating));
        }
        assert_eq!(Rating::from_value(0), None);
    }

    #[test]
    fn only_good_and_easy_are_successes() {
        assert!(!Rating::Again.is_success());
        assert!(!Rating::Hard.is_success());
        assert!(Rating::Good.is_success());
        assert!(Rating::Easy.is_success());
    }

    #[test]
    fn new_state_has_defaults_and_is_due() {
        let today = day(2024, 1, 1);
        let state = MemoryState::new(today);
        assert_eq!(state.easiness_factor, 2.5);
        assert_eq!(state.interval_days, 1);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.review_count, 0);
        assert_eq!(state.success_rate(), 0.0);
        assert_eq!(state.stage(), LearningStage::New);
        assert!(state.is_due(today));
        assert!(!state.is_due(day(2023, 12, 31)));
    }

    #[test]
    fn stage_follows_repetitions() {
        let mut state = MemoryState::new(day(2024, 1, 1));
        state.review_count = 1;
        state.repetitions = 1;
        assert_eq!(state.stage(), LearningStage::Learning);
        state.repetitions = 2;
        assert_eq!(state.stage(), LearningStage::Review);
        state.repetitions = 0;
        assert_eq!(state.stage(), LearningStage::Learning);
    }

    #[test]
    fn display_matches_parse() {
        for rating in Rating::ALL {
            assert_eq!(rating.to_string().parse::<Rating>().unwrap(), rating);
        }
    }
}
