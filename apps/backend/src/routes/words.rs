//! Word endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use vocab_core::{analyze_history, predict_retention};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

/// POST /api/words
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<NewWord>,
) -> Result<Json<WordWithState>> {
    if payload.lemma.trim().is_empty() {
        return Err(ApiError::BadRequest("lemma must not be empty".to_string()));
    }
    if payload.translation.trim().is_empty() {
        return Err(ApiError::BadRequest("translation must not be empty".to_string()));
    }

    let now = Utc::now();
    let initial = state.reviews.initial_state(now.date_naive());
    let word = state
        .db
        .create_word(auth.user_id, &payload, &initial, now)
        .await?;

    tracing::info!(user_id = auth.user_id, word_id = word.id, lemma = %word.lemma, "word added");

    Ok(Json(WordWithState::new(word, initial)))
}

/// GET /api/words
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<WordListResponse>> {
    let words = state
        .db
        .list_words_with_state(auth.user_id)
        .await?
        .into_iter()
        .map(|row| Ok(WordWithState::new(row.word, row.state.to_core_state()?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(WordListResponse { words }))
}

/// GET /api/words/:word_id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(word_id): Path<i64>,
) -> Result<Json<WordDetailResponse>> {
    let row = state
        .db
        .get_word_with_state(auth.user_id, word_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("word {}", word_id)))?;
    let memory = row.state.to_core_state()?;

    let ratings = state.db.get_ratings(auth.user_id, word_id).await?;
    let analysis = analyze_history(&ratings);

    let days_since_review = memory
        .last_reviewed_at
        .map(|at| (Utc::now().date_naive() - at.date_naive()).num_days())
        .unwrap_or(0);
    let predicted_retention = predict_retention(
        days_since_review,
        memory.easiness_factor,
        state.config.scheduler.initial_ease,
    );

    Ok(Json(WordDetailResponse {
        entry: WordWithState::new(row.word, memory),
        predicted_retention,
        analysis,
    }))
}

/// DELETE /api/words/:word_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(word_id): Path<i64>,
) -> Result<StatusCode> {
    if !state.db.delete_word(auth.user_id, word_id).await? {
        return Err(ApiError::NotFound(format!("word {}", word_id)));
    }

    tracing::info!(user_id = auth.user_id, word_id, "word deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/words/:word_id/reset
pub async fn reset(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(word_id): Path<i64>,
) -> Result<Json<WordWithState>> {
    if !state
        .reviews
        .reset_word(auth.user_id, word_id, Utc::now())
        .await?
    {
        return Err(ApiError::NotFound(format!("word {}", word_id)));
    }

    let row = state
        .db
        .get_word_with_state(auth.user_id, word_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("word {}", word_id)))?;

    Ok(Json(WordWithState::new(row.word, row.state.to_core_state()?)))
}

/// GET /api/words/:word_id/history
pub async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(word_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    state
        .db
        .get_word(auth.user_id, word_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("word {}", word_id)))?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let reviews = state
        .db
        .get_review_history(auth.user_id, word_id, limit)
        .await?
        .iter()
        .map(DbReview::to_api_review)
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(HistoryResponse { reviews }))
}
