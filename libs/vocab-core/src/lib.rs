//! Core vocabulary review library.
//!
//! Provides:
//! - SM-2 review scheduler (pure, no I/O)
//! - Review statistics and history analysis
//! - Study session queue selection
//! - Shared types (MemoryState, Rating, etc.)

pub mod algorithm;
pub mod error;
pub mod selector;
pub mod stats;
pub mod types;

pub use algorithm::retention::{optimal_review_days, predict_retention};
pub use algorithm::sm2::Sm2;
pub use algorithm::{compute_next, SchedulingResult, SpacedRepetitionAlgorithm};
pub use error::{Result, ScheduleError};
pub use selector::{Candidate, SessionKind, SessionSelector};
pub use stats::{analyze_history, DifficultyLevel, LearningAnalysis, LearningTrend, SuccessTally};
pub use types::{
    LearningStage, MemoryState, Rating, ReviewEvent, DEFAULT_EASINESS_FACTOR,
    DEFAULT_INTERVAL_DAYS,
};
