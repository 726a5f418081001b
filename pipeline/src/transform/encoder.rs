//! Frequency-ranked one-hot encoding of a categorical column.
//!
//! Encoding is two-phase:
//!
//! ```text
//! fit:       whole column ──▶ CategoryCounts ──▶ CategoryIndexMap (write once)
//! transform: (map, one value) ──▶ [Option<f64>; OHE_SLOTS]
//! ```
//!
//! Counting can be split across partitions: each partition fills its own
//! [`CategoryCounts`] using global row positions, and the partial counts are
//! merged before the map is built. The result does not depend on how the
//! column was partitioned.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{EncodingError, EncodingResult};
use crate::models::OHE_SLOTS;

/// Occurrence count and first position of each observed category.
#[derive(Debug, Clone, Default)]
pub struct CategoryCounts {
    seen: HashMap<i64, (usize, usize)>,
}

impl CategoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the values of one partition. `offset` is the global row
    /// position of the partition's first value.
    pub fn from_values<I>(offset: usize, values: I) -> Self
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        let mut counts = Self::new();
        for (i, value) in values.into_iter().enumerate() {
            if let Some(value) = value {
                counts.observe(offset + i, value);
            }
        }
        counts
    }

    /// Record one value seen at global row `position`.
    pub fn observe(&mut self, position: usize, value: i64) {
        let entry = self.seen.entry(value).or_insert((0, position));
        entry.0 += 1;
        entry.1 = entry.1.min(position);
    }

    /// Combine two partial counts. Commutative and associative.
    pub fn merge(mut self, other: CategoryCounts) -> CategoryCounts {
        for (value, (count, first)) in other.seen {
            let entry = self.seen.entry(value).or_insert((0, first));
            entry.0 += count;
            entry.1 = entry.1.min(first);
        }
        self
    }

    /// Rank categories: descending frequency, ties by first occurrence.
    pub fn into_map(self, column: &str) -> EncodingResult<CategoryIndexMap> {
        if self.seen.is_empty() {
            return Err(EncodingError::EmptyColumn(column.to_string()));
        }

        let mut ranked: Vec<(i64, usize, usize)> = self
            .seen
            .into_iter()
            .map(|(value, (count, first))| (value, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let index = ranked
            .iter()
            .enumerate()
            .map(|(i, (value, _, _))| (*value, i))
            .collect();
        let entries = ranked
            .into_iter()
            .enumerate()
            .map(|(index, (value, count, _))| CategoryEntry { value, index, count })
            .collect();

        Ok(CategoryIndexMap {
            column: column.to_string(),
            entries,
            index,
        })
    }
}

/// One ranked category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub value: i64,
    pub index: usize,
    pub count: usize,
}

/// Category value → dense index, most frequent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryIndexMap {
    column: String,
    entries: Vec<CategoryEntry>,
    #[serde(skip)]
    index: HashMap<i64, usize>,
}

impl CategoryIndexMap {
    /// Build the map from a full column in one pass. Nulls are not counted.
    pub fn fit<I>(column: &str, values: I) -> EncodingResult<Self>
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        CategoryCounts::from_values(0, values).into_map(column)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn index_of(&self, value: i64) -> Option<usize> {
        self.index.get(&value).copied()
    }

    /// Categories in index order.
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Number of distinct categories (`K`).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Applies a fitted [`CategoryIndexMap`] to single values.
///
/// With `drop_last` the vector has `K-1` positions and the category at index
/// `K-1` encodes as all zeros.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    map: Arc<CategoryIndexMap>,
    drop_last: bool,
}

impl OneHotEncoder {
    pub fn new(map: Arc<CategoryIndexMap>, drop_last: bool) -> EncodingResult<Self> {
        let encoder = Self { map, drop_last };
        let width = encoder.width();
        if width > OHE_SLOTS {
            return Err(EncodingError::TooManyCategories {
                column: encoder.map.column().to_string(),
                width,
                slots: OHE_SLOTS,
            });
        }
        Ok(encoder)
    }

    pub fn map(&self) -> &CategoryIndexMap {
        &self.map
    }

    /// Length of the one-hot vector.
    pub fn width(&self) -> usize {
        if self.drop_last {
            self.map.len().saturating_sub(1)
        } else {
            self.map.len()
        }
    }

    /// Encode one value into the flattened output slots.
    ///
    /// Slots past [`width`](Self::width) are `None`.
    pub fn transform(&self, value: Option<i64>) -> EncodingResult<[Option<f64>; OHE_SLOTS]> {
        let value = value.ok_or_else(|| EncodingError::NullCategory(self.map.column().to_string()))?;
        let index = self
            .map
            .index_of(value)
            .ok_or_else(|| EncodingError::UnseenCategory {
                column: self.map.column().to_string(),
                value,
            })?;

        let width = self.width();
        let mut slots = [None; OHE_SLOTS];
        for (i, slot) in slots.iter_mut().enumerate().take(width) {
            *slot = Some(if i == index { 1.0 } else { 0.0 });
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[i64]) -> Vec<Option<i64>> {
        values.iter().copied().map(Some).collect()
    }

    fn encoder(values: &[i64], drop_last: bool) -> OneHotEncoder {
        let map = CategoryIndexMap::fit("cp", column(values)).unwrap();
        OneHotEncoder::new(Arc::new(map), drop_last).unwrap()
    }

    #[test]
    fn test_most_frequent_gets_index_zero() {
        let map = CategoryIndexMap::fit("cp", column(&[2, 0, 0, 1, 0, 2, 3])).unwrap();

        assert_eq!(map.index_of(0), Some(0));
        assert_eq!(map.index_of(2), Some(1));
        assert_eq!(map.len(), 4);
        assert_eq!(map.entries()[0].count, 3);
    }

    #[test]
    fn test_ties_broken_by_first_occurrence() {
        let map = CategoryIndexMap::fit("cp", column(&[3, 1, 1, 3, 2])).unwrap();

        assert_eq!(map.index_of(3), Some(0));
        assert_eq!(map.index_of(1), Some(1));
        assert_eq!(map.index_of(2), Some(2));
    }

    #[test]
    fn test_fit_ignores_nulls() {
        let map = CategoryIndexMap::fit("cp", vec![None, Some(1), None, Some(1), Some(2)]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.entries()[0].count, 2);
    }

    #[test]
    fn test_fit_empty_column_fails() {
        let err = CategoryIndexMap::fit("cp", Vec::<Option<i64>>::new()).unwrap_err();
        assert_eq!(err, EncodingError::EmptyColumn("cp".into()));

        let err = CategoryIndexMap::fit("cp", vec![None, None]).unwrap_err();
        assert_eq!(err, EncodingError::EmptyColumn("cp".into()));
    }

    #[test]
    fn test_partitioned_counts_match_single_pass() {
        let values = column(&[1, 2, 2, 0, 1, 3, 0, 0, 1, 2]);
        let single = CategoryIndexMap::fit("cp", values.clone()).unwrap();

        let left = CategoryCounts::from_values(0, values[..4].to_vec());
        let middle = CategoryCounts::from_values(4, values[4..7].to_vec());
        let right = CategoryCounts::from_values(7, values[7..].to_vec());
        let merged = right.merge(left).merge(middle).into_map("cp").unwrap();

        assert_eq!(merged, single);
    }

    #[test]
    fn test_drop_last_encoding() {
        // ranks: 0 -> 0, 2 -> 1, 1 -> 2, 3 -> 3
        let enc = encoder(&[0, 0, 0, 0, 2, 2, 2, 1, 1, 3], true);
        assert_eq!(enc.width(), 3);

        assert_eq!(enc.transform(Some(0)).unwrap(), [Some(1.0), Some(0.0), Some(0.0), None]);
        assert_eq!(enc.transform(Some(2)).unwrap(), [Some(0.0), Some(1.0), Some(0.0), None]);
        assert_eq!(enc.transform(Some(1)).unwrap(), [Some(0.0), Some(0.0), Some(1.0), None]);
        assert_eq!(enc.transform(Some(3)).unwrap(), [Some(0.0), Some(0.0), Some(0.0), None]);
    }

    #[test]
    fn test_exactly_one_hot_or_dropped() {
        let values = [0, 0, 0, 0, 2, 2, 2, 1, 1, 3];
        let enc = encoder(&values, true);
        let dropped = enc.map().entries().last().unwrap().value;

        for value in values {
            let ones = enc
                .transform(Some(value))
                .unwrap()
                .iter()
                .filter(|s| **s == Some(1.0))
                .count();
            let expected = if value == dropped { 0 } else { 1 };
            assert_eq!(ones, expected, "value {value}");
        }
    }

    #[test]
    fn test_keep_all_categories() {
        let enc = encoder(&[0, 0, 2, 1, 3], false);
        assert_eq!(enc.width(), 4);
        assert_eq!(enc.transform(Some(3)).unwrap(), [Some(0.0), Some(0.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_fewer_categories_leave_trailing_slots_null() {
        let enc = encoder(&[1, 1, 0], true);
        assert_eq!(enc.transform(Some(1)).unwrap(), [Some(1.0), None, None, None]);
        assert_eq!(enc.transform(Some(0)).unwrap(), [Some(0.0), None, None, None]);
    }

    #[test]
    fn test_too_many_categories() {
        let map = CategoryIndexMap::fit("cp", column(&[0, 1, 2, 3, 4, 5])).unwrap();
        let err = OneHotEncoder::new(Arc::new(map), true).unwrap_err();
        assert_eq!(
            err,
            EncodingError::TooManyCategories {
                column: "cp".into(),
                width: 5,
                slots: OHE_SLOTS,
            }
        );
    }

    #[test]
    fn test_five_categories_fit_when_last_dropped() {
        let map = CategoryIndexMap::fit("cp", column(&[0, 1, 2, 3, 4])).unwrap();
        assert!(OneHotEncoder::new(Arc::new(map.clone()), true).is_ok());
        assert!(OneHotEncoder::new(Arc::new(map), false).is_err());
    }

    #[test]
    fn test_unseen_and_null_categories() {
        let enc = encoder(&[0, 1, 2, 3], true);

        assert_eq!(
            enc.transform(Some(9)).unwrap_err(),
            EncodingError::UnseenCategory {
                column: "cp".into(),
                value: 9,
            }
        );
        assert_eq!(enc.transform(None).unwrap_err(), EncodingError::NullCategory("cp".into()));
    }
}
