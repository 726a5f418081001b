//! Cohort aggregation kept apart from the row pipeline.

use serde::Serialize;

use crate::models::{BucketedRecord, CholesterolLevel};

/// Number of rows carrying one cholesterol level.
///
/// Partial counts over any partitioning combine with [`merge`](Self::merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelCount {
    pub level: CholesterolLevel,
    pub count: usize,
}

impl LevelCount {
    pub fn zero(level: CholesterolLevel) -> Self {
        Self { level, count: 0 }
    }

    /// Count matching rows. Rows without a level never match.
    pub fn of(level: CholesterolLevel, rows: &[BucketedRecord]) -> Self {
        let count = rows
            .iter()
            .filter(|r| r.cholesterol_level == Some(level))
            .count();
        Self { level, count }
    }

    /// Sum two partial counts of the same level.
    pub fn merge(self, other: LevelCount) -> LevelCount {
        debug_assert_eq!(self.level, other.level);
        LevelCount {
            level: self.level,
            count: self.count + other.count,
        }
    }
}

/// Count `High` rows across partitions.
pub fn count_high_cholesterol<'a, I>(partitions: I) -> LevelCount
where
    I: IntoIterator<Item = &'a [BucketedRecord]>,
{
    partitions
        .into_iter()
        .map(|rows| LevelCount::of(CholesterolLevel::High, rows))
        .fold(LevelCount::zero(CholesterolLevel::High), LevelCount::merge)
}
