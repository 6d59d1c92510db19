//! Learning statistics endpoint

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate, Utc};
use vocab_core::{MemoryState, SessionSelector};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

const DEFAULT_STATS_DAYS: i64 = 30;
const MAX_STATS_DAYS: i64 = 3650;

/// Repetitions after which a word counts as learned.
const LEARNED_REPETITIONS: u32 = 3;

/// GET /api/stats
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>> {
    let days = query.days.unwrap_or(DEFAULT_STATS_DAYS);
    if !(1..=MAX_STATS_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {}",
            MAX_STATS_DAYS
        )));
    }

    let states = state
        .db
        .list_words_with_state(auth.user_id)
        .await?
        .iter()
        .map(|row| row.state.to_core_state())
        .collect::<Result<Vec<_>>>()?;

    let now = Utc::now();
    let start_of_today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now);

    let today_agg = state.db.review_aggregate(auth.user_id, start_of_today).await?;
    let period_agg = state
        .db
        .review_aggregate(auth.user_id, now - Duration::days(days))
        .await?;

    let mut words = word_counts(&states, now.date_naive());
    words.reviews_today = today_agg.total_reviews;
    words.words_reviewed_today = today_agg.words_reviewed;

    Ok(Json(StatsResponse {
        words,
        performance: PerformanceStats::from_aggregate(days, &period_agg),
    }))
}

fn word_counts(states: &[MemoryState], today: NaiveDate) -> UserStats {
    let difficult_threshold = SessionSelector::default().difficult_threshold;
    let count = |f: fn(&MemoryState, f64, NaiveDate) -> bool| {
        states
            .iter()
            .filter(|s| f(*s, difficult_threshold, today))
            .count()
    };

    UserStats {
        total_words: states.len(),
        new_words: count(|s, _, _| s.review_count == 0),
        due_words: count(|s, _, today| s.is_due(today)),
        learned_words: count(|s, _, _| s.repetitions >= LEARNED_REPETITIONS),
        difficult_words: count(|s, threshold, _| {
            s.repetitions > 0 && s.easiness_factor < threshold
        }),
        reviews_today: 0,
        words_reviewed_today: 0,
    }
}
