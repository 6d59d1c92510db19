//! Study endpoints

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use vocab_core::{Candidate, Rating, SessionSelector};

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/study/queue
pub async fn queue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StudyQueueQuery>,
) -> Result<Json<StudyQueueResponse>> {
    let kind = query.kind.unwrap_or_default();
    let limit = query.limit.unwrap_or(state.config.cards_per_session);

    let mut entries: HashMap<i64, WordWithState> = HashMap::new();
    let mut candidates = Vec::new();
    for row in state.db.list_words_with_state(auth.user_id).await? {
        let memory = row.state.to_core_state()?;
        candidates.push(Candidate {
            word_id: row.word.id,
            added_at: row.word.created_at,
            state: memory.clone(),
        });
        entries.insert(row.word.id, WordWithState::new(row.word, memory));
    }

    let today = Utc::now().date_naive();
    let selector = SessionSelector::with_limit(limit);
    let ids = if query.shuffle.unwrap_or(false) {
        selector.select_shuffled(kind, today, &candidates, &mut rand::thread_rng())
    } else {
        selector.select(kind, today, &candidates)
    };

    let words: Vec<WordWithState> = ids.iter().filter_map(|id| entries.remove(id)).collect();

    tracing::debug!(
        user_id = auth.user_id,
        kind = kind.as_str(),
        selected = words.len(),
        "study queue built"
    );

    Ok(Json(StudyQueueResponse { kind, words }))
}

/// POST /api/study/review
pub async fn review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<SubmitReviewRequest>,
) -> Result<Json<SubmitReviewResponse>> {
    let rating = Rating::from_str(&payload.rating)?;

    let outcome = state
        .reviews
        .submit_review(
            auth.user_id,
            payload.word_id,
            rating,
            payload.response_time_ms.unwrap_or(0),
            Utc::now(),
        )
        .await?;

    Ok(Json(SubmitReviewResponse {
        previous_state: outcome.previous,
        next_review_date: outcome.result.next_review_date,
        was_success: outcome.result.was_success,
        state: outcome.result.new_state,
        stage: outcome.stage,
    }))
}
