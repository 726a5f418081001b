//! Run-scoped processing date.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::models::{BucketedRecord, FinalRecord};

/// State captured once at the start of a run and shared by every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub report_date: NaiveDate,
}

impl RunContext {
    /// Capture today's local date.
    pub fn capture() -> Self {
        Self {
            report_date: Local::now().date_naive(),
        }
    }

    /// Fixed date, for reproducible runs.
    pub fn with_date(report_date: NaiveDate) -> Self {
        Self { report_date }
    }

    pub fn stamp(&self, record: BucketedRecord) -> FinalRecord {
        FinalRecord {
            bucketed: record,
            report_date: self.report_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncodedRecord, RawRecord, OHE_SLOTS};

    #[test]
    fn test_same_date_on_every_row() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let ctx = RunContext::with_date(date);
        let row = BucketedRecord {
            encoded: EncodedRecord {
                raw: RawRecord::default(),
                cp_ohe: [None; OHE_SLOTS],
                power_of_trestbps: None,
            },
            cholesterol_level: None,
        };

        let stamped: Vec<_> = (0..5).map(|_| ctx.stamp(row)).collect();
        assert!(stamped.iter().all(|r| r.report_date == date));
        assert_eq!(stamped[0].bucketed, row);
    }

    #[test]
    fn test_capture_is_today() {
        let ctx = RunContext::capture();
        let today = Local::now().date_naive();
        // tolerate a run straddling midnight
        assert!(ctx.report_date == today || ctx.report_date.succ_opt() == Some(today));
    }
}
