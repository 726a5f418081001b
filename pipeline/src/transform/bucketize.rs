//! Cholesterol risk bucketing.
//!
//! ```text
//!   chol < 200          → Low
//!   200 ≤ chol ≤ 239    → Medium
//!   otherwise           → High
//! ```

use crate::models::CholesterolLevel;

pub const MEDIUM_LOWER_BOUND: f64 = 200.0;
pub const MEDIUM_UPPER_BOUND: f64 = 239.0;

impl CholesterolLevel {
    /// Total over all `f64` inputs. Values between 239 and 240 and NaN fall
    /// through to `High`.
    pub fn classify(chol: f64) -> Self {
        if chol < MEDIUM_LOWER_BOUND {
            CholesterolLevel::Low
        } else if chol <= MEDIUM_UPPER_BOUND {
            CholesterolLevel::Medium
        } else {
            CholesterolLevel::High
        }
    }
}

/// Bucket a nullable integer reading. Null stays null.
pub fn cholesterol_level(chol: Option<i64>) -> Option<CholesterolLevel> {
    chol.map(|v| CholesterolLevel::classify(v as f64))
}
