//! Review statistics kept apart from the scheduling transform.

use serde::{Deserialize, Serialize};

use crate::types::Rating;

/// Running success statistic folded from `was_success` decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessTally {
    reviews: u32,
    successes: u32,
}

impl SuccessTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the outcome of one review.
    pub fn record(&mut self, was_success: bool) {
        self.reviews = self.reviews.saturating_add(1);
        if was_success {
            self.successes = self.successes.saturating_add(1);
        }
    }

    pub fn reviews(&self) -> u32 {
        self.reviews
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    /// Exact `successes / reviews`, or 0.0 before any review.
    pub fn success_rate(&self) -> f64 {
        if self.reviews == 0 {
            0.0
        } else {
            self.successes as f64 / self.reviews as f64
        }
    }
}

impl FromIterator<Rating> for SuccessTally {
    fn from_iter<I: IntoIterator<Item = Rating>>(iter: I) -> Self {
        let mut tally = Self::new();
        for rating in iter {
            tally.record(rating.is_success());
        }
        tally
    }
}

/// Direction of recent ratings compared to older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Difficulty bucket from the average rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    Moderate,
    Hard,
    VeryHard,
    Unknown,
}

/// Summary of a word's review history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningAnalysis {
    pub total_reviews: usize,
    pub average_rating: f64,
    pub success_rate: f64,
    pub trend: LearningTrend,
    pub difficulty: DifficultyLevel,
}

/// Number of most recent ratings compared against the rest.
const RECENT_WINDOW: usize = 3;
const TREND_THRESHOLD: f64 = 0.3;

/// Analyze ratings given oldest first.
pub fn analyze_history(ratings: &[Rating]) -> LearningAnalysis {
    if ratings.is_empty() {
        return LearningAnalysis {
            total_reviews: 0,
            average_rating: 0.0,
            success_rate: 0.0,
            trend: LearningTrend::Stable,
            difficulty: DifficultyLevel::Unknown,
        };
    }

    let average = mean(ratings);
    let tally: SuccessTally = ratings.iter().copied().collect();

    let trend = if ratings.len() > RECENT_WINDOW {
        let (older, recent) = ratings.split_at(ratings.len() - RECENT_WINDOW);
        let (recent_avg, older_avg) = (mean(recent), mean(older));
        if recent_avg > older_avg + TREND_THRESHOLD {
            LearningTrend::Improving
        } else if recent_avg < older_avg - TREND_THRESHOLD {
            LearningTrend::Declining
        } else {
            LearningTrend::Stable
        }
    } else {
        LearningTrend::InsufficientData
    };

    let difficulty = if average >= 3.5 {
        DifficultyLevel::Easy
    } else if average >= 2.5 {
        DifficultyLevel::Moderate
    } else if average >= 1.5 {
        DifficultyLevel::Hard
    } else {
        DifficultyLevel::VeryHard
    };

    LearningAnalysis {
        total_reviews: ratings.len(),
        average_rating: round2(average),
        success_rate: round2(tally.success_rate()),
        trend,
        difficulty,
    }
}

fn mean(ratings: &[Rating]) -> f64 {
    let sum: u32 = ratings.iter().map(|r| u32::from(r.to_value())).sum();
    sum as f64 / ratings.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
