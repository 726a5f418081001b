//! High-level pipeline API: load, encode, derive, filter, bucketize,
//! aggregate, stamp, export.
//!
//! # Execution
//!
//! ```text
//!              ┌──────── partition 0 ────────┐
//! load ─▶ split├──────── partition 1 ────────┤─▶ merge counts ─▶ fit map
//!              └──────── partition n ────────┘        (barrier)
//!
//!              ┌ encode ▶ derive ▶ filter ▶ bucketize ┐
//! fitted map ─▶├ encode ▶ derive ▶ filter ▶ bucketize ┤─▶ count High ─▶ stamp ─▶ export
//!              └ encode ▶ derive ▶ filter ▶ bucketize ┘
//! ```
//!
//! Partitions run as blocking tasks on a tokio `JoinSet`. Results are put
//! back in input order before aggregation, so output order never depends on
//! scheduling.
//!
//! # Example
//!
//! ```rust,ignore
//! use heartprep::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = run(&PipelineConfig::from_env()).await?;
//!     println!("{} rows exported", summary.exported_rows);
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

use super::aggregate::count_high_cholesterol;
use super::bucketize::cholesterol_level;
use super::encoder::{CategoryCounts, CategoryIndexMap, OneHotEncoder};
use super::features::{in_cohort, power_of_trestbps};
use super::stamp::RunContext;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::export::export_records;
use crate::logs::{done, progress, progress_nested, warning, Stage};
use crate::models::{BucketedRecord, EncodedRecord, FinalRecord, RawRecord};
use crate::parser::load_dataset;

/// Column the category encoder is fitted on.
pub const CATEGORY_COLUMN: &str = "cp";

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input_rows: usize,
    pub cohort_rows: usize,
    pub exported_rows: usize,
    pub high_cholesterol_count: usize,
    pub report_date: NaiveDate,
    pub categories: CategoryIndexMap,
    pub encoding: String,
    pub delimiter: char,
    pub output: PathBuf,
}

/// Cohort rows produced by the row-local stages.
#[derive(Debug, Clone)]
pub struct Processed {
    pub categories: Arc<CategoryIndexMap>,
    /// Bucketed cohort rows, one vector per partition, in input order
    pub partitions: Vec<Vec<BucketedRecord>>,
}

impl Processed {
    pub fn cohort_rows(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }
}

/// Dataset metadata and fitted categories, without running the rest.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows: usize,
    pub categories: CategoryIndexMap,
}

/// Run the whole pipeline, stamping rows with today's date.
pub async fn run(config: &PipelineConfig) -> PipelineResult<RunSummary> {
    run_with_context(config, RunContext::capture()).await
}

/// Run the whole pipeline with an explicit run context.
pub async fn run_with_context(
    config: &PipelineConfig,
    ctx: RunContext,
) -> PipelineResult<RunSummary> {
    progress(Stage::Load, format!("Loading {}", config.input.display()));
    let dataset = load_dataset(&config.input, config.delimiter)?;
    done(Stage::Load, format!("Detected encoding: {}", dataset.encoding));
    done(
        Stage::Load,
        format!("Detected separator: '{}'", format_delimiter(dataset.delimiter)),
    );
    done(Stage::Load, format!("Read {} rows", dataset.records.len()));

    let input_rows = dataset.records.len();
    let processed = process(dataset.records, config.partitions, config.drop_last).await?;
    let cohort_rows = processed.cohort_rows();
    done(Stage::Transform, format!("{} of {} rows in cohort", cohort_rows, input_rows));
    if cohort_rows == 0 {
        warning(Stage::Transform, "No row passed the cohort filter; exporting header only");
    }

    let high = count_high_cholesterol(processed.partitions.iter().map(Vec::as_slice));
    done(
        Stage::Aggregate,
        format!("Number of patients with High cholesterol level: {}", high.count),
    );

    progress(Stage::Stamp, format!("Report date: {}", ctx.report_date));
    let rows = stamp_all(processed.partitions, &ctx);

    progress(Stage::Export, format!("Writing {}", config.output.display()));
    let exported_rows = export_records(&rows, &config.output, config.output_delimiter())?;
    done(Stage::Export, format!("Exported {} rows", exported_rows));

    Ok(RunSummary {
        input_rows,
        cohort_rows,
        exported_rows,
        high_cholesterol_count: high.count,
        report_date: ctx.report_date,
        categories: (*processed.categories).clone(),
        encoding: dataset.encoding,
        delimiter: dataset.delimiter,
        output: config.output.clone(),
    })
}

/// Load the input and fit the category map only.
pub fn inspect(config: &PipelineConfig) -> PipelineResult<InspectReport> {
    let dataset = load_dataset(&config.input, config.delimiter)?;
    let categories = CategoryIndexMap::fit(CATEGORY_COLUMN, dataset.cp_column())?;

    Ok(InspectReport {
        rows: dataset.records.len(),
        encoding: dataset.encoding,
        delimiter: dataset.delimiter,
        headers: dataset.headers,
        categories,
    })
}

/// Fit the encoder over all rows, then encode, derive, filter and bucketize
/// each partition concurrently.
pub async fn process(
    records: Vec<RawRecord>,
    partitions: usize,
    drop_last: bool,
) -> PipelineResult<Processed> {
    let chunks = split(records, partitions);
    progress(
        Stage::Fit,
        format!("Counting {} over {} partition(s)", CATEGORY_COLUMN, chunks.len()),
    );

    // Fit: every partition contributes its counts before any row is encoded.
    let mut fit_tasks = JoinSet::new();
    for (offset, chunk) in &chunks {
        let offset = *offset;
        let values: Vec<Option<i64>> = chunk.iter().map(|r| r.cp).collect();
        fit_tasks.spawn_blocking(move || CategoryCounts::from_values(offset, values));
    }
    let mut counts = CategoryCounts::new();
    while let Some(joined) = fit_tasks.join_next().await {
        counts = counts.merge(joined.map_err(worker_failed)?);
    }

    let categories = Arc::new(counts.into_map(CATEGORY_COLUMN)?);
    for entry in categories.entries() {
        progress_nested(
            Stage::Fit,
            format!("cp={} → index {} ({} rows)", entry.value, entry.index, entry.count),
        );
    }
    let encoder = OneHotEncoder::new(Arc::clone(&categories), drop_last)?;

    // Transform: row-local stages, one task per partition.
    let mut row_tasks = JoinSet::new();
    for (index, (_, chunk)) in chunks.into_iter().enumerate() {
        let encoder = encoder.clone();
        row_tasks.spawn_blocking(move || (index, process_partition(chunk, &encoder)));
    }

    let mut results: Vec<Option<Vec<BucketedRecord>>> = vec![None; row_tasks.len()];
    while let Some(joined) = row_tasks.join_next().await {
        let (index, rows) = joined.map_err(worker_failed)?;
        results[index] = Some(rows?);
    }

    Ok(Processed {
        categories,
        partitions: results.into_iter().flatten().collect(),
    })
}

/// Run the row-local stages over one partition, keeping cohort rows.
pub fn process_partition(
    rows: Vec<RawRecord>,
    encoder: &OneHotEncoder,
) -> PipelineResult<Vec<BucketedRecord>> {
    let mut cohort = Vec::new();
    for raw in rows {
        if let Some(row) = process_row(raw, encoder)? {
            cohort.push(row);
        }
    }
    Ok(cohort)
}

/// Encode and derive one row; `None` if it falls outside the cohort.
pub fn process_row(
    raw: RawRecord,
    encoder: &OneHotEncoder,
) -> PipelineResult<Option<BucketedRecord>> {
    let encoded = encode_row(raw, encoder)?;
    if !in_cohort(&encoded.raw) {
        return Ok(None);
    }
    Ok(Some(BucketedRecord {
        cholesterol_level: cholesterol_level(encoded.raw.chol),
        encoded,
    }))
}

/// One-hot encode `cp` and derive `powerOfTrestbps`.
pub fn encode_row(raw: RawRecord, encoder: &OneHotEncoder) -> PipelineResult<EncodedRecord> {
    Ok(EncodedRecord {
        cp_ohe: encoder.transform(raw.cp)?,
        power_of_trestbps: power_of_trestbps(raw.trestbps)?,
        raw,
    })
}

/// Attach the run's report date to every row, keeping partition order.
pub fn stamp_all(partitions: Vec<Vec<BucketedRecord>>, ctx: &RunContext) -> Vec<FinalRecord> {
    partitions
        .into_iter()
        .flatten()
        .map(|row| ctx.stamp(row))
        .collect()
}

/// Split rows into at most `partitions` contiguous chunks, each tagged with
/// the global position of its first row. Always yields at least one chunk.
fn split(records: Vec<RawRecord>, partitions: usize) -> Vec<(usize, Vec<RawRecord>)> {
    let size = records.len().div_ceil(partitions.max(1)).max(1);
    let mut chunks = Vec::new();
    let mut offset = 0;
    let mut rest = records.into_iter().peekable();

    while rest.peek().is_some() {
        let chunk: Vec<RawRecord> = rest.by_ref().take(size).collect();
        let len = chunk.len();
        chunks.push((offset, chunk));
        offset += len;
    }
    if chunks.is_empty() {
        chunks.push((0, Vec::new()));
    }
    chunks
}

fn worker_failed(err: JoinError) -> PipelineError {
    PipelineError::Worker(err.to_string())
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
