//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{ApiError, Result};

// Re-export shared types from vocab-core
pub use vocab_core::selector::SessionKind;
pub use vocab_core::stats::LearningAnalysis;
pub use vocab_core::types::{LearningStage, MemoryState, Rating};
use vocab_core::ScheduleError;

// === Database Entity Types ===

/// Registered learner
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Vocabulary entry stored in SQLite
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Word {
    pub id: i64,
    pub user_id: i64,
    pub lemma: String,
    pub part_of_speech: Option<String>,
    pub article: Option<String>,
    pub translation: String,
    pub example: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Memory state columns as stored in SQLite
#[derive(Debug, Clone, FromRow)]
pub struct DbMemoryState {
    pub easiness_factor: f64,
    pub interval_days: i64,
    pub repetitions: i64,
    pub next_review_date: NaiveDate,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub review_count: i64,
    pub success_count: i64,
}

impl DbMemoryState {
    /// Convert to vocab-core MemoryState, rejecting out-of-domain counters
    pub fn to_core_state(&self) -> Result<MemoryState> {
        Ok(MemoryState {
            easiness_factor: self.easiness_factor,
            interval_days: to_u32("interval_days", self.interval_days)?,
            repetitions: to_u32("repetitions", self.repetitions)?,
            next_review_date: self.next_review_date,
            last_reviewed_at: self.last_reviewed_at,
            review_count: to_u32("review_count", self.review_count)?,
            success_count: to_u32("success_count", self.success_count)?,
        })
    }
}

fn to_u32(field: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| ScheduleError::CountOutOfRange { field, value }.into())
}

/// Word joined with its memory state
#[derive(Debug, Clone, FromRow)]
pub struct DbWordWithState {
    #[sqlx(flatten)]
    pub word: Word,
    #[sqlx(flatten)]
    pub state: DbMemoryState,
}

/// Review log entry in SQLite
#[derive(Debug, Clone, FromRow)]
pub struct DbReview {
    pub id: i64,
    pub user_id: i64,
    pub word_id: i64,
    pub rating: i64,
    pub response_time_ms: i64,
    pub interval_before: i64,
    pub interval_after: i64,
    pub ease_before: f64,
    pub ease_after: f64,
    pub reviewed_at: DateTime<Utc>,
}

impl DbReview {
    pub fn to_api_review(&self) -> Result<ReviewRecord> {
        let rating = u8::try_from(self.rating)
            .ok()
            .and_then(Rating::from_value)
            .ok_or_else(|| ApiError::Internal(format!("stored rating out of range: {}", self.rating)))?;

        Ok(ReviewRecord {
            id: self.id,
            word_id: self.word_id,
            rating,
            response_time_ms: self.response_time_ms,
            interval_before: self.interval_before,
            interval_after: self.interval_after,
            ease_before: self.ease_before,
            ease_after: self.ease_after,
            reviewed_at: self.reviewed_at,
        })
    }
}

/// Aggregates over a window of the review log
#[derive(Debug, Clone, Default, FromRow)]
pub struct DbReviewAggregate {
    pub total_reviews: i64,
    pub rating_sum: i64,
    pub successful_reviews: i64,
    pub response_time_sum: i64,
    pub words_reviewed: i64,
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserStatusResponse {
    pub user_id: i64,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

// Word types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWord {
    pub lemma: String,
    pub part_of_speech: Option<String>,
    pub article: Option<String>,
    pub translation: String,
    pub example: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordWithState {
    pub word: Word,
    pub state: MemoryState,
    pub stage: LearningStage,
    pub success_rate: f64,
}

impl WordWithState {
    pub fn new(word: Word, state: MemoryState) -> Self {
        Self {
            stage: state.stage(),
            success_rate: state.success_rate(),
            word,
            state,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WordListResponse {
    pub words: Vec<WordWithState>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WordDetailResponse {
    #[serde(flatten)]
    pub entry: WordWithState,
    pub predicted_retention: f64,
    pub analysis: LearningAnalysis,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub word_id: i64,
    pub rating: Rating,
    pub response_time_ms: i64,
    pub interval_before: i64,
    pub interval_after: i64,
    pub ease_before: f64,
    pub ease_after: f64,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub reviews: Vec<ReviewRecord>,
}

// Study types
#[derive(Debug, Serialize, Deserialize)]
pub struct StudyQueueQuery {
    pub kind: Option<SessionKind>,
    pub limit: Option<usize>,
    pub shuffle: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StudyQueueResponse {
    pub kind: SessionKind,
    pub words: Vec<WordWithState>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub word_id: i64,
    pub rating: String,
    pub response_time_ms: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitReviewResponse {
    pub previous_state: MemoryState,
    pub state: MemoryState,
    pub next_review_date: NaiveDate,
    pub was_success: bool,
    pub stage: LearningStage,
}

// Stats types
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_words: usize,
    pub new_words: usize,
    pub due_words: usize,
    pub learned_words: usize,
    pub difficult_words: usize,
    pub reviews_today: i64,
    pub words_reviewed_today: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub days: i64,
    pub total_reviews: i64,
    pub average_rating: f64,
    /// Percentage of reviews rated Good or Easy.
    pub accuracy: f64,
    pub average_response_time_ms: f64,
}

impl PerformanceStats {
    pub fn from_aggregate(days: i64, agg: &DbReviewAggregate) -> Self {
        if agg.total_reviews == 0 {
            return Self {
                days,
                total_reviews: 0,
                average_rating: 0.0,
                accuracy: 0.0,
                average_response_time_ms: 0.0,
            };
        }
        let total = agg.total_reviews as f64;
        Self {
            days,
            total_reviews: agg.total_reviews,
            average_rating: agg.rating_sum as f64 / total,
            accuracy: agg.successful_reviews as f64 / total * 100.0,
            average_response_time_ms: agg.response_time_sum as f64 / total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub words: UserStats,
    pub performance: PerformanceStats,
}
