//! # Heartprep - heart-disease dataset preprocessing
//!
//! Heartprep turns a raw heart-disease CSV into a flattened, feature-enriched
//! cohort export.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────────────┐   ┌───────────┐   ┌──────────┐
//! │ CSV file │──▶│  Loader  │──▶│ encode · derive ·    │──▶│ aggregate │──▶│  Export  │
//! │ (header) │   │ (typed)  │   │ filter · bucketize   │   │  · stamp  │   │  (CSV)   │
//! └──────────┘   └──────────┘   └──────────────────────┘   └───────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use heartprep::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let summary = run(&PipelineConfig::default()).await.unwrap();
//!     println!("High cholesterol: {}", summary.high_cholesterol_count);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Record types for each stage
//! - [`parser`] - Dataset loading with auto-detection
//! - [`transform`] - Encoding, derivation, filtering, bucketing, pipeline
//! - [`export`] - Projection and atomic CSV export
//! - [`config`] - Run configuration
//! - [`logs`] - Stage-tagged run log

// Core modules
pub mod error;
pub mod models;

// Configuration and logging
pub mod config;
pub mod logs;

// Loading
pub mod parser;

// Transformation
pub mod transform;

// Export
pub mod export;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    DerivationError, EncodingError, ExportError, LoadError, PipelineError, PipelineResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    BucketedRecord, CholesterolLevel, EncodedRecord, FinalRecord, RawRecord, OHE_SLOTS,
    REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Loading
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_bytes, load_dataset, load_str, Dataset,
};

// =============================================================================
// Re-exports - Stages
// =============================================================================

pub use transform::{
    cholesterol_level, count_high_cholesterol, in_cohort, power_of_trestbps, CategoryCounts,
    CategoryEntry, CategoryIndexMap, LevelCount, OneHotEncoder, RunContext,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    inspect, process, run, run_with_context, InspectReport, Processed, RunSummary,
};

// =============================================================================
// Re-exports - Export and config
// =============================================================================

pub use config::PipelineConfig;
pub use export::{export_records, write_records, OUTPUT_COLUMNS};
