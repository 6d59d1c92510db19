//! Application services sitting between routes and storage.

pub mod review;

pub use review::{ReviewOutcome, ReviewService};
