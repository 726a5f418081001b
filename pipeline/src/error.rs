//! Error types for the heartprep pipeline.
//!
//! One enum per pipeline concern:
//!
//! - [`LoadError`] - Reading and typing the input dataset
//! - [`EncodingError`] - Fitting and applying the `cp` category encoder
//! - [`DerivationError`] - Computing derived numeric features
//! - [`ExportError`] - Writing the projected result set
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while loading the input dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The file has no header row.
    #[error("Input file is empty")]
    Empty,

    /// A column required by the record schema is absent from the header.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A cell could not be read as its column's type.
    #[error("Line {line}, column '{column}' (value '{value}'): {message}")]
    Malformed {
        line: u64,
        column: String,
        value: String,
        message: String,
    },

    /// Structural CSV error (unterminated quote, bad UTF-8 after decoding...).
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Encoding Errors
// =============================================================================

/// Errors from the category encoder.
#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    /// Fit was given no non-null value.
    #[error("Cannot fit encoder on column '{0}': column is empty or entirely null")]
    EmptyColumn(String),

    /// Transform met a value that was not observed at fit time.
    #[error("Unseen category {value} in column '{column}'")]
    UnseenCategory { column: String, value: i64 },

    /// Transform met a null category.
    #[error("Null category in column '{0}'")]
    NullCategory(String),

    /// The encoded vector does not fit the fixed output columns.
    #[error("Column '{column}' encodes to {width} positions but only {slots} output columns exist")]
    TooManyCategories {
        column: String,
        width: usize,
        slots: usize,
    },
}

// =============================================================================
// Derivation Errors
// =============================================================================

/// Errors while computing derived features.
#[derive(Debug, Error, PartialEq)]
pub enum DerivationError {
    /// The derived value does not fit the numeric width.
    #[error("Derived feature '{feature}' overflows for input {input}")]
    Overflow { feature: String, input: i64 },
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing the result set.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Target location not writable.
    #[error("Cannot write output '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Category encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Feature derivation failed.
    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    /// Output could not be written.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// A partition worker panicked or was cancelled.
    #[error("Partition worker failed: {0}")]
    Worker(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for encoding.
pub type EncodingResult<T> = Result<T, EncodingError>;

/// Result type for derivation.
pub type DerivationResult<T> = Result<T, DerivationError>;

/// Result type for export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let load_err = LoadError::MissingColumn("chol".into());
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("chol"));

        let enc_err = EncodingError::UnseenCategory {
            column: "cp".into(),
            value: 7,
        };
        let pipeline_err: PipelineError = enc_err.into();
        assert!(pipeline_err.to_string().contains("Unseen category 7"));
    }

    #[test]
    fn test_malformed_error_format() {
        let err = LoadError::Malformed {
            line: 5,
            column: "age".into(),
            value: "abc".into(),
            message: "invalid digit found in string".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'age'"));
        assert!(msg.contains("value 'abc'"));
    }

    #[test]
    fn test_export_error_names_path() {
        let err = ExportError::Io {
            path: "/nope/out.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/nope/out.csv"));
    }
}
