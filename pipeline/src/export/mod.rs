//! Projection of final records onto the committed output columns.
//!
//! # Output Format
//!
//! One header row followed by one row per record, columns in
//! [`OUTPUT_COLUMNS`] order. Nulls are written as empty fields, floats keep a
//! decimal point (`22500.0`) and `report_date` is `YYYY-MM-DD`.
//!
//! The file is written to a temporary sibling and renamed over the target
//! once complete, so a failed export never leaves a truncated file behind.
//! On Unix the published file keeps the mode of the file it replaces, or
//! `0644` for a new file.

use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{ExportError, ExportResult};
use crate::models::FinalRecord;

/// Output columns, in order. Downstream consumers rely on this order.
pub const OUTPUT_COLUMNS: [&str; 21] = [
    "age",
    "sex",
    "cp",
    "trestbps",
    "chol",
    "fbs",
    "restecg",
    "thalach",
    "exang",
    "oldpeak",
    "slope",
    "ca",
    "thal",
    "target",
    "report_date",
    "cp_ohe_0",
    "cp_ohe_1",
    "cp_ohe_2",
    "cp_ohe_3",
    "cholesterol_level",
    "powerOfTrestbps",
];

/// One exported row. Field order must match [`OUTPUT_COLUMNS`].
#[derive(Debug, Serialize)]
struct OutputRow {
    age: Option<i64>,
    sex: Option<i64>,
    cp: Option<i64>,
    trestbps: Option<i64>,
    chol: Option<i64>,
    fbs: Option<i64>,
    restecg: Option<i64>,
    thalach: Option<i64>,
    exang: Option<i64>,
    oldpeak: Option<f64>,
    slope: Option<i64>,
    ca: Option<i64>,
    thal: Option<i64>,
    target: Option<i64>,
    report_date: NaiveDate,
    cp_ohe_0: Option<f64>,
    cp_ohe_1: Option<f64>,
    cp_ohe_2: Option<f64>,
    cp_ohe_3: Option<f64>,
    cholesterol_level: Option<&'static str>,
    #[serde(rename = "powerOfTrestbps")]
    power_of_trestbps: Option<f64>,
}

impl From<&FinalRecord> for OutputRow {
    fn from(record: &FinalRecord) -> Self {
        let encoded = &record.bucketed.encoded;
        let raw = &encoded.raw;
        let [cp_ohe_0, cp_ohe_1, cp_ohe_2, cp_ohe_3] = encoded.cp_ohe;

        Self {
            age: raw.age,
            sex: raw.sex,
            cp: raw.cp,
            trestbps: raw.trestbps,
            chol: raw.chol,
            fbs: raw.fbs,
            restecg: raw.restecg,
            thalach: raw.thalach,
            exang: raw.exang,
            oldpeak: raw.oldpeak,
            slope: raw.slope,
            ca: raw.ca,
            thal: raw.thal,
            target: raw.target,
            report_date: record.report_date,
            cp_ohe_0,
            cp_ohe_1,
            cp_ohe_2,
            cp_ohe_3,
            cholesterol_level: record.bucketed.cholesterol_level.map(|l| l.as_str()),
            power_of_trestbps: encoded.power_of_trestbps,
        }
    }
}

/// Serialize records with a header row into any writer.
pub fn write_records<W: Write>(records: &[FinalRecord], out: W, delimiter: u8) -> ExportResult<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_writer(out);

    writer.write_record(OUTPUT_COLUMNS)?;
    for record in records {
        writer.serialize(OutputRow::from(record))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write records to `path`, creating its directory if needed.
///
/// Returns the number of data rows written.
pub fn export_records(records: &[FinalRecord], path: &Path, delimiter: u8) -> ExportResult<usize> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(&parent).map_err(io_err)?;
    write_records(records, tmp.as_file_mut(), delimiter)?;
    #[cfg(unix)]
    tmp.as_file()
        .set_permissions(published_permissions(path))
        .map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(records.len())
}

/// Temp files are created `0600`; readers of the output expect the usual mode.
#[cfg(unix)]
fn published_permissions(path: &Path) -> fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.permissions(),
        _ => fs::Permissions::from_mode(0o644),
    }
}
