//! Study session queue selection.
//!
//! Filtering and ordering only. Storage hands over candidates, the selector
//! returns word ids in the order they should be shown.

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::MemoryState;

/// Words with an easiness factor below this count as difficult.
pub const DEFAULT_DIFFICULT_THRESHOLD: f64 = 2.0;

/// Default number of words in one session.
pub const DEFAULT_SESSION_LIMIT: usize = 10;

/// Which words a session draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Words whose review date has arrived.
    #[default]
    Due,
    /// Words that have never been reviewed.
    New,
    /// Reviewed words with a low easiness factor.
    Difficult,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Due => "due",
            Self::New => "new",
            Self::Difficult => "difficult",
        }
    }
}

/// A word the selector can choose from.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub word_id: i64,
    pub added_at: DateTime<Utc>,
    pub state: MemoryState,
}

/// Builds ordered study queues.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSelector {
    pub limit: usize,
    pub difficult_threshold: f64,
}

impl Default for SessionSelector {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SESSION_LIMIT,
            difficult_threshold: DEFAULT_DIFFICULT_THRESHOLD,
        }
    }
}

impl SessionSelector {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Whether `candidate` belongs in a session of `kind` on `today`.
    pub fn matches(&self, kind: SessionKind, today: NaiveDate, candidate: &Candidate) -> bool {
        let state = &candidate.state;
        match kind {
            SessionKind::Due => state.is_due(today),
            SessionKind::New => state.review_count == 0,
            SessionKind::Difficult => {
                state.repetitions > 0 && state.easiness_factor < self.difficult_threshold
            }
        }
    }

    /// Matching word ids in deterministic session order, at most `limit`.
    pub fn select(&self, kind: SessionKind, today: NaiveDate, candidates: &[Candidate]) -> Vec<i64> {
        let mut chosen = self.filter(kind, today, candidates);

        match kind {
            SessionKind::Due => chosen.sort_by(|a, b| {
                a.state
                    .next_review_date
                    .cmp(&b.state.next_review_date)
                    .then(a.word_id.cmp(&b.word_id))
            }),
            SessionKind::New => {
                chosen.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.word_id.cmp(&b.word_id)))
            }
            SessionKind::Difficult => chosen.sort_by(|a, b| {
                a.state
                    .easiness_factor
                    .total_cmp(&b.state.easiness_factor)
                    .then(a.word_id.cmp(&b.word_id))
            }),
        }

        chosen
            .into_iter()
            .take(self.limit)
            .map(|c| c.word_id)
            .collect()
    }

    /// Matching word ids in random order, at most `limit`.
    pub fn select_shuffled<R: Rng + ?Sized>(
        &self,
        kind: SessionKind,
        today: NaiveDate,
        candidates: &[Candidate],
        rng: &mut R,
    ) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .filter(kind, today, candidates)
            .into_iter()
            .map(|c| c.word_id)
            .collect();
        ids.shuffle(rng);
        ids.truncate(self.limit);
        ids
    }

    fn filter<'a>(
        &self,
        kind: SessionKind,
        today: NaiveDate,
        candidates: &'a [Candidate],
    ) -> Vec<&'a Candidate> {
        candidates
            .iter()
            .filter(|c| self.matches(kind, today, c))
            .collect()
    }
}
