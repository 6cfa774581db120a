use serde::{Deserialize, Serialize};

use super::breakdown::{round2, RatingBreakdown};
use super::error::RatingError;

/// Merged component outputs for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Full-precision signed total.
    pub total_points: f64,
    pub raw_percentage: f64,
    /// Clamped to `[0, 100]` and rounded to two decimals.
    pub final_percentage: f64,
}

/// `max_points` is the point total worth 100%; it must be finite and positive.
pub fn check_max_points(max_points: f64) -> Result<(), RatingError> {
    if !max_points.is_finite() || max_points <= 0.0 {
        return Err(RatingError::InvalidRequest(format!(
            "max_points must be a positive number (got {max_points})"
        )));
    }
    Ok(())
}

/// Sum component values and normalise against `max_points`. Callers validate
/// `max_points` with [`check_max_points`] first.
pub fn aggregate(breakdown: &RatingBreakdown, max_points: f64) -> Aggregate {
    let total_points: f64 = breakdown.component_values().iter().sum();
    let raw_percentage = total_points / max_points * 100.0;
    let final_percentage = round2(raw_percentage.clamp(0.0, 100.0));

    Aggregate {
        total_points,
        raw_percentage,
        final_percentage,
    }
}
