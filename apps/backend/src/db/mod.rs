//! SQLite database operations
//!
//! Word store (users, words, memory states) and the append-only review log.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;
use vocab_core::{MemoryState, Rating, SchedulingResult};

use crate::error::{ApiError, Result};
use crate::models::*;

const WORD_COLUMNS: &str =
    "w.id, w.user_id, w.lemma, w.part_of_speech, w.article, w.translation, w.example, w.created_at";

const STATE_COLUMNS: &str = "ms.easiness_factor, ms.interval_days, ms.repetitions, \
     ms.next_review_date, ms.last_reviewed_at, ms.review_count, ms.success_count";

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is a separate database,
        // so keep exactly one alive for the lifetime of the pool.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(dir) = options.get_filename().parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir).map_err(|e| {
                        ApiError::Internal(format!("cannot create {}: {}", dir.display(), e))
                    })?;
                }
            }
            SqlitePoolOptions::new()
                .max_connections(10)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with generated token
    pub async fn create_user(&self, name: Option<&str>) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (token, name, created_at, last_seen_at)
            VALUES (?1, ?2, ?3, ?3)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE token = ?1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_seen_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // === Word Store ===

    /// Add a word for a user together with its initial memory state
    pub async fn create_word(
        &self,
        user_id: i64,
        new_word: &NewWord,
        initial: &MemoryState,
        now: DateTime<Utc>,
    ) -> Result<Word> {
        let mut tx = self.pool.begin().await?;

        let word = sqlx::query_as::<_, Word>(
            r#"
            INSERT INTO words (user_id, lemma, lemma_key, part_of_speech, article, translation,
                               example, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id, user_id, lemma, part_of_speech, article, translation, example, created_at
            "#,
        )
        .bind(user_id)
        .bind(new_word.lemma.trim())
        .bind(lemma_key(&new_word.lemma))
        .bind(&new_word.part_of_speech)
        .bind(&new_word.article)
        .bind(new_word.translation.trim())
        .bind(&new_word.example)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            unique_violation_as_conflict(e, format!("word '{}' already added", new_word.lemma.trim()))
        })?;

        sqlx::query(
            r#"
            INSERT INTO memory_states (user_id, word_id, easiness_factor, interval_days, repetitions,
                                       next_review_date, last_reviewed_at, review_count, success_count,
                                       updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(user_id)
        .bind(word.id)
        .bind(initial.easiness_factor)
        .bind(i64::from(initial.interval_days))
        .bind(i64::from(initial.repetitions))
        .bind(initial.next_review_date)
        .bind(initial.last_reviewed_at)
        .bind(i64::from(initial.review_count))
        .bind(i64::from(initial.success_count))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(word)
    }

    /// Get a word owned by the user
    pub async fn get_word(&self, user_id: i64, word_id: i64) -> Result<Option<Word>> {
        let word = sqlx::query_as::<_, Word>(
            r#"
            SELECT id, user_id, lemma, part_of_speech, article, translation, example, created_at
            FROM words
            WHERE id = ?1 AND user_id = ?2
            "#,
        )
        .bind(word_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(word)
    }

    /// Get a word with its memory state
    pub async fn get_word_with_state(
        &self,
        user_id: i64,
        word_id: i64,
    ) -> Result<Option<DbWordWithState>> {
        let query = format!(
            "SELECT {WORD_COLUMNS}, {STATE_COLUMNS} \
             FROM words w \
             JOIN memory_states ms ON ms.word_id = w.id AND ms.user_id = w.user_id \
             WHERE w.user_id = ?1 AND w.id = ?2"
        );
        let row = sqlx::query_as::<_, DbWordWithState>(&query)
            .bind(user_id)
            .bind(word_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// All words of a user with their memory states, newest first
    pub async fn list_words_with_state(&self, user_id: i64) -> Result<Vec<DbWordWithState>> {
        let query = format!(
            "SELECT {WORD_COLUMNS}, {STATE_COLUMNS} \
             FROM words w \
             JOIN memory_states ms ON ms.word_id = w.id AND ms.user_id = w.user_id \
             WHERE w.user_id = ?1 \
             ORDER BY w.created_at DESC, w.id DESC"
        );
        let rows = sqlx::query_as::<_, DbWordWithState>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Delete a word with its memory state and review history
    pub async fn delete_word(&self, user_id: i64, word_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // Delete in order due to foreign keys
        sqlx::query("DELETE FROM review_history WHERE user_id = ?1 AND word_id = ?2")
            .bind(user_id)
            .bind(word_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM memory_states WHERE user_id = ?1 AND word_id = ?2")
            .bind(user_id)
            .bind(word_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM words WHERE user_id = ?1 AND id = ?2")
            .bind(user_id)
            .bind(word_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // === Memory State Repository ===

    /// Get memory state for a word
    pub async fn get_memory_state(&self, user_id: i64, word_id: i64) -> Result<Option<DbMemoryState>> {
        let state = sqlx::query_as::<_, DbMemoryState>(
            r#"
            SELECT easiness_factor, interval_days, repetitions, next_review_date,
                   last_reviewed_at, review_count, success_count
            FROM memory_states
            WHERE user_id = ?1 AND word_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Put a word's scheduling back to its initial values.
    ///
    /// Lifetime counters and the last review time are kept.
    pub async fn reset_memory_state(
        &self,
        user_id: i64,
        word_id: i64,
        initial: &MemoryState,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE memory_states
            SET easiness_factor = ?1,
                interval_days = ?2,
                repetitions = 0,
                next_review_date = ?3,
                updated_at = ?4
            WHERE user_id = ?5 AND word_id = ?6
            "#,
        )
        .bind(initial.easiness_factor)
        .bind(i64::from(initial.interval_days))
        .bind(initial.next_review_date)
        .bind(Utc::now())
        .bind(user_id)
        .bind(word_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Persist a scheduled review: new memory state plus review log entry
    pub async fn record_review(
        &self,
        user_id: i64,
        word_id: i64,
        previous: &MemoryState,
        rating: Rating,
        response_time_ms: u32,
        result: &SchedulingResult,
    ) -> Result<()> {
        let state = &result.new_state;
        let reviewed_at = state.last_reviewed_at.unwrap_or_else(Utc::now);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO memory_states (user_id, word_id, easiness_factor, interval_days, repetitions,
                                       next_review_date, last_reviewed_at, review_count, success_count,
                                       updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (user_id, word_id) DO UPDATE SET
                easiness_factor = excluded.easiness_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                next_review_date = excluded.next_review_date,
                last_reviewed_at = excluded.last_reviewed_at,
                review_count = excluded.review_count,
                success_count = excluded.success_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .bind(state.easiness_factor)
        .bind(i64::from(state.interval_days))
        .bind(i64::from(state.repetitions))
        .bind(state.next_review_date)
        .bind(state.last_reviewed_at)
        .bind(i64::from(state.review_count))
        .bind(i64::from(state.success_count))
        .bind(reviewed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO review_history (user_id, word_id, rating, response_time_ms,
                                        interval_before, interval_after, ease_before, ease_after,
                                        reviewed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .bind(i64::from(rating.to_value()))
        .bind(i64::from(response_time_ms))
        .bind(i64::from(previous.interval_days))
        .bind(i64::from(state.interval_days))
        .bind(previous.easiness_factor)
        .bind(state.easiness_factor)
        .bind(reviewed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // === Review Log ===

    /// Review history for a word, newest first
    pub async fn get_review_history(
        &self,
        user_id: i64,
        word_id: i64,
        limit: i64,
    ) -> Result<Vec<DbReview>> {
        let reviews = sqlx::query_as::<_, DbReview>(
            r#"
            SELECT id, user_id, word_id, rating, response_time_ms, interval_before,
                   interval_after, ease_before, ease_after, reviewed_at
            FROM review_history
            WHERE user_id = ?1 AND word_id = ?2
            ORDER BY reviewed_at DESC, id DESC
            LIMIT ?3
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// Ratings for a word, oldest first
    pub async fn get_ratings(&self, user_id: i64, word_id: i64) -> Result<Vec<Rating>> {
        let values: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT rating FROM review_history
            WHERE user_id = ?1 AND word_id = ?2
            ORDER BY reviewed_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(word_id)
        .fetch_all(&self.pool)
        .await?;

        values
            .into_iter()
            .map(|v| {
                u8::try_from(v)
                    .ok()
                    .and_then(Rating::from_value)
                    .ok_or_else(|| ApiError::Internal(format!("stored rating out of range: {}", v)))
            })
            .collect()
    }

    /// Aggregate the review log since a point in time
    pub async fn review_aggregate(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<DbReviewAggregate> {
        let aggregate = sqlx::query_as::<_, DbReviewAggregate>(
            r#"
            SELECT COUNT(*) AS total_reviews,
                   COALESCE(SUM(rating), 0) AS rating_sum,
                   COALESCE(SUM(CASE WHEN rating >= 3 THEN 1 ELSE 0 END), 0) AS successful_reviews,
                   COALESCE(SUM(response_time_ms), 0) AS response_time_sum,
                   COUNT(DISTINCT word_id) AS words_reviewed
            FROM review_history
            WHERE user_id = ?1 AND reviewed_at >= ?2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(aggregate)
    }
}

/// Key for the per-user lemma uniqueness check. SQLite's `lower()` only
/// folds ASCII, so umlauts are folded here.
fn lemma_key(lemma: &str) -> String {
    lemma.trim().to_lowercase()
}

fn unique_violation_as_conflict(error: sqlx::Error, message: String) -> ApiError {
    let is_unique = error
        .as_database_error()
        .is_some_and(|e| e.is_unique_violation());
    if is_unique {
        ApiError::Conflict(message)
    } else {
        ApiError::Database(error)
    }
}
