//! Domain models for the heartprep pipeline.
//!
//! Each pipeline stage produces a new value wrapping the previous one:
//!
//! - [`RawRecord`] - One input row, as loaded
//! - [`EncodedRecord`] - Raw row + one-hot `cp` columns + `powerOfTrestbps`
//! - [`BucketedRecord`] - Cohort row + [`CholesterolLevel`]
//! - [`FinalRecord`] - Bucketed row + run-scoped `report_date`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of flattened one-hot columns (`cp_ohe_0..cp_ohe_3`).
pub const OHE_SLOTS: usize = 4;

/// Columns the input file must provide, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach", "exang", "oldpeak",
    "slope", "ca", "thal", "target",
];

// =============================================================================
// Raw Record
// =============================================================================

/// One patient row as read from the input file.
///
/// Every field is nullable: an empty cell loads as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub age: Option<i64>,
    pub sex: Option<i64>,
    /// Chest pain type, the categorical column fed to the encoder.
    pub cp: Option<i64>,
    /// Resting blood pressure (mm Hg).
    pub trestbps: Option<i64>,
    /// Serum cholesterol (mg/dl).
    pub chol: Option<i64>,
    pub fbs: Option<i64>,
    pub restecg: Option<i64>,
    pub thalach: Option<i64>,
    pub exang: Option<i64>,
    pub oldpeak: Option<f64>,
    pub slope: Option<i64>,
    pub ca: Option<i64>,
    pub thal: Option<i64>,
    pub target: Option<i64>,
}

// =============================================================================
// Cholesterol Level
// =============================================================================

/// Ordered risk bucket for serum cholesterol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CholesterolLevel {
    /// Below 200 mg/dl.
    Low,
    /// 200 to 239 mg/dl.
    Medium,
    /// Above 239 mg/dl.
    High,
}

impl CholesterolLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CholesterolLevel::Low => "Low",
            CholesterolLevel::Medium => "Medium",
            CholesterolLevel::High => "High",
        }
    }
}

impl fmt::Display for CholesterolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Pipeline Stages
// =============================================================================

/// Raw row after category encoding and feature derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedRecord {
    pub raw: RawRecord,
    /// Flattened one-hot vector. `None` marks a slot past the vector length.
    pub cp_ohe: [Option<f64>; OHE_SLOTS],
    /// `trestbps` squared, `None` when `trestbps` is null.
    pub power_of_trestbps: Option<f64>,
}

/// Cohort row with its cholesterol bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketedRecord {
    pub encoded: EncodedRecord,
    /// `None` when `chol` is null.
    pub cholesterol_level: Option<CholesterolLevel>,
}

/// Fully processed row, ready for projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalRecord {
    pub bucketed: BucketedRecord,
    pub report_date: NaiveDate,
}

impl FinalRecord {
    pub fn raw(&self) -> &RawRecord {
        &self.bucketed.encoded.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(CholesterolLevel::Low < CholesterolLevel::Medium);
        assert!(CholesterolLevel::Medium < CholesterolLevel::High);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(CholesterolLevel::High.to_string(), "High");
        assert_eq!(CholesterolLevel::Medium.as_str(), "Medium");
    }

    #[test]
    fn test_level_serializes_as_label() {
        let json = serde_json::to_string(&CholesterolLevel::Low).unwrap();
        assert_eq!(json, "\"Low\"");
    }
}
