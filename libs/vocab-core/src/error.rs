//! Error types for vocab-core.
//!
//! Every variant is a contract violation: the caller handed the scheduler
//! something outside its input domain. None of them are worth retrying.

use thiserror::Error;

/// Result type alias using ScheduleError.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors raised when scheduler inputs are rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("invalid rating: {value}")]
    InvalidRating { value: String },

    #[error("easiness factor {value} outside [{min}, {max}]")]
    EasinessOutOfRange { value: f64, min: f64, max: f64 },

    #[error("success count {successes} exceeds review count {reviews}")]
    InconsistentCounts { successes: u32, reviews: u32 },

    #[error("{field} {value} is not a valid count")]
    CountOutOfRange { field: &'static str, value: i64 },

    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),
}
