//! Rough retention model used for display hints.
//!
//! Not part of scheduling: intervals come from [`super::sm2`] alone.

/// Longest interval the optimal-review search considers.
const SEARCH_MAX_DAYS: u32 = 365;

/// Tolerance for treating a predicted retention as on target.
const TARGET_TOLERANCE: f64 = 0.01;

/// Probability of recall `days_since_review` days after the last review.
///
/// Retention decays by 10% per day and scales with the square root of the
/// word's easiness relative to `reference_ease`.
pub fn predict_retention(days_since_review: i64, easiness_factor: f64, reference_ease: f64) -> f64 {
    if days_since_review <= 0 {
        return 1.0;
    }
    if reference_ease <= 0.0 || easiness_factor <= 0.0 {
        return 0.0;
    }

    let exponent = days_since_review.min(i32::MAX as i64) as i32;
    let base = 0.9_f64.powi(exponent);
    let ease_multiplier = (easiness_factor / reference_ease).sqrt();

    (base * ease_multiplier).clamp(0.0, 1.0)
}

/// Days after which predicted retention reaches `target_retention`.
///
/// Binary search over 1..=365 days; returns the first day found within
/// tolerance, or the boundary where the search converged.
pub fn optimal_review_days(easiness_factor: f64, reference_ease: f64, target_retention: f64) -> u32 {
    let mut low = 1_i64;
    let mut high = SEARCH_MAX_DAYS as i64;

    while low <= high {
        let mid = (low + high) / 2;
        let predicted = predict_retention(mid, easiness_factor, reference_ease);

        if (predicted - target_retention).abs() < TARGET_TOLERANCE {
            return mid as u32;
        } else if predicted > target_retention {
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    low.clamp(1, SEARCH_MAX_DAYS as i64) as u32
}
