//! Transformation module.
//!
//! This module holds every stage between loading and export:
//! - Encoder: frequency-ranked one-hot encoding of `cp`
//! - Features: `powerOfTrestbps` and the cohort filter
//! - Bucketize: cholesterol risk levels
//! - Aggregate: high-cholesterol count
//! - Stamp: run-scoped report date
//! - Pipeline: orchestration of all stages

pub mod aggregate;
pub mod bucketize;
pub mod encoder;
pub mod features;
pub mod pipeline;
pub mod stamp;

pub use aggregate::{count_high_cholesterol, LevelCount};
pub use bucketize::cholesterol_level;
pub use encoder::{CategoryCounts, CategoryEntry, CategoryIndexMap, OneHotEncoder};
pub use features::{in_cohort, power_of_trestbps};
pub use pipeline::*;
pub use stamp::RunContext;
