//! Dataset loader with encoding and delimiter auto-detection.
//!
//! Reads a delimited file with a header row into typed [`RawRecord`]s.
//! Column lookup is by header name, so column order and extra columns in the
//! input do not matter. Empty cells load as nulls.

use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::{RawRecord, REQUIRED_COLUMNS};

/// A loaded dataset with the metadata detected while reading it.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Typed rows, in file order
    pub records: Vec<RawRecord>,
    /// Detected encoding
    pub encoding: String,
    /// Detected or forced delimiter
    pub delimiter: char,
    /// Column headers as found in the file
    pub headers: Vec<String>,
}

impl Dataset {
    /// The `cp` column, nulls included.
    pub fn cp_column(&self) -> Vec<Option<i64>> {
        self.records.iter().map(|r| r.cp).collect()
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    decoded.trim_start_matches('\u{feff}').to_string()
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Load a dataset file.
///
/// `delimiter` forces the separator; `None` auto-detects it from the header.
///
/// # Example
/// ```ignore
/// let dataset = load_dataset("data/heart_disease_data.csv", None)?;
/// println!("{} rows, delimiter '{}'", dataset.records.len(), dataset.delimiter);
/// ```
pub fn load_dataset<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> LoadResult<Dataset> {
    let bytes = std::fs::read(path.as_ref())?;
    load_bytes(&bytes, delimiter)
}

/// Load a dataset from raw bytes.
pub fn load_bytes(bytes: &[u8], delimiter: Option<char>) -> LoadResult<Dataset> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    load_str(&content, delimiter, encoding)
}

/// Load a dataset from decoded text with an explicit delimiter.
pub fn load_str(content: &str, delimiter: char, encoding: String) -> LoadResult<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter_byte(delimiter))
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty);
    }

    let columns = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(columns.read(&row, line)?);
    }

    Ok(Dataset {
        records,
        encoding,
        delimiter,
        headers,
    })
}

fn delimiter_byte(delimiter: char) -> u8 {
    if delimiter.is_ascii() {
        delimiter as u8
    } else {
        b','
    }
}

/// Position of every required column in the header row.
struct ColumnIndex {
    positions: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> LoadResult<Self> {
        let mut positions = [0; REQUIRED_COLUMNS.len()];
        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            positions[slot] = headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))?;
        }
        Ok(Self { positions })
    }

    fn cell<'r>(&self, row: &'r StringRecord, slot: usize) -> (&'static str, &'r str) {
        let raw = row.get(self.positions[slot]).unwrap_or("").trim();
        (REQUIRED_COLUMNS[slot], raw)
    }

    fn int(&self, row: &StringRecord, slot: usize, line: u64) -> LoadResult<Option<i64>> {
        let (column, raw) = self.cell(row, slot);
        parse_int(raw, column, line)
    }

    fn read(&self, row: &StringRecord, line: u64) -> LoadResult<RawRecord> {
        let (oldpeak_col, oldpeak_raw) = self.cell(row, 9);
        Ok(RawRecord {
            age: self.int(row, 0, line)?,
            sex: self.int(row, 1, line)?,
            cp: self.int(row, 2, line)?,
            trestbps: self.int(row, 3, line)?,
            chol: self.int(row, 4, line)?,
            fbs: self.int(row, 5, line)?,
            restecg: self.int(row, 6, line)?,
            thalach: self.int(row, 7, line)?,
            exang: self.int(row, 8, line)?,
            oldpeak: parse_float(oldpeak_raw, oldpeak_col, line)?,
            slope: self.int(row, 10, line)?,
            ca: self.int(row, 11, line)?,
            thal: self.int(row, 12, line)?,
            target: self.int(row, 13, line)?,
        })
    }
}

/// 2^63, the first float past `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Integers may be written with a zero fraction (`145.0`).
fn parse_int(raw: &str, column: &str, line: u64) -> LoadResult<Option<i64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(Some(v));
    }
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= -I64_LIMIT && v < I64_LIMIT => {
            Ok(Some(v as i64))
        }
        _ => Err(malformed(raw, column, line, "expected an integer")),
    }
}

fn parse_float(raw: &str, column: &str, line: u64) -> LoadResult<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| malformed(raw, column, line, "expected a number"))
}

fn malformed(raw: &str, column: &str, line: u64, message: &str) -> LoadError {
    LoadError::Malformed {
        line,
        column: column.to_string(),
        value: raw.to_string(),
        message: message.to_string(),
    }
}
