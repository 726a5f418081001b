//! Row-local feature derivation and cohort selection.

use crate::error::{DerivationError, DerivationResult};
use crate::models::RawRecord;

/// Minimum age (exclusive) for the cohort.
pub const COHORT_MIN_AGE: i64 = 50;

/// Minimum resting blood pressure (exclusive) for the cohort.
pub const COHORT_MIN_TRESTBPS: i64 = 140;

/// `trestbps²`, squared in `i64` then widened. Null stays null.
///
/// The widening is exact while the square stays below 2^53, which covers
/// any blood pressure reading.
pub fn power_of_trestbps(trestbps: Option<i64>) -> DerivationResult<Option<f64>> {
    trestbps
        .map(|v| {
            v.checked_mul(v)
                .map(|sq| sq as f64)
                .ok_or_else(|| DerivationError::Overflow {
                    feature: "powerOfTrestbps".to_string(),
                    input: v,
                })
        })
        .transpose()
}

/// `age > 50 AND trestbps > 140`. A null operand excludes the row.
pub fn in_cohort(record: &RawRecord) -> bool {
    matches!(
        (record.age, record.trestbps),
        (Some(age), Some(bps)) if age > COHORT_MIN_AGE && bps > COHORT_MIN_TRESTBPS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(age: Option<i64>, trestbps: Option<i64>) -> RawRecord {
        RawRecord {
            age,
            trestbps,
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_square() {
        assert_eq!(power_of_trestbps(Some(150)).unwrap(), Some(22500.0));
        assert_eq!(power_of_trestbps(Some(94)).unwrap(), Some(8836.0));
        assert_eq!(power_of_trestbps(Some(0)).unwrap(), Some(0.0));
    }

    #[test]
    fn test_square_exact_over_clinical_range() {
        for v in 0..=400_i64 {
            assert_eq!(power_of_trestbps(Some(v)).unwrap(), Some((v * v) as f64));
        }
    }

    #[test]
    fn test_null_propagates() {
        assert_eq!(power_of_trestbps(None).unwrap(), None);
    }

    #[test]
    fn test_overflow_rejected() {
        let err = power_of_trestbps(Some(i64::MAX)).unwrap_err();
        assert!(matches!(err, DerivationError::Overflow { input, .. } if input == i64::MAX));
    }

    #[test]
    fn test_cohort_membership() {
        assert!(in_cohort(&patient(Some(55), Some(150))));
        assert!(in_cohort(&patient(Some(51), Some(141))));
    }

    #[test]
    fn test_cohort_boundaries_excluded() {
        assert!(!in_cohort(&patient(Some(50), Some(150))));
        assert!(!in_cohort(&patient(Some(55), Some(140))));
        assert!(!in_cohort(&patient(Some(50), Some(140))));
    }

    #[test]
    fn test_cohort_null_excluded() {
        assert!(!in_cohort(&patient(None, Some(150))));
        assert!(!in_cohort(&patient(Some(60), None)));
    }
}
