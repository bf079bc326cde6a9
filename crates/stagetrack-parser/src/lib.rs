//! # stagetrack-parser
//!
//! Ingestion boundary for stagetrack: turns record files into
//! [`RawStageRecord`]s.
//!
//! This crate provides:
//! - JSON record files, as an array of long records or an object with
//!   `records` and/or `planner_rows`
//! - Loose value normalization for dates and percentages (`value`)
//! - Wide planner-row unpivoting (`planner`)
//! - A synthetic fallback dataset (`sample`)
//!
//! ## Example
//!
//! ```rust
//! use stagetrack_parser::parse_json;
//!
//! let input = r#"[
//!     { "module": "UGB1 | Alpha", "stage": "Planejamento",
//!       "planned_start": "01/02/2024", "planned_end": "2024-02-28",
//!       "completion": "100%" }
//! ]"#;
//!
//! let records = parse_json(input).unwrap();
//! assert_eq!(records[0].project_id, "Alpha");
//! assert_eq!(records[0].org_unit.as_deref(), Some("UGB1"));
//! ```

pub mod planner;
pub mod records;
pub mod sample;
pub mod value;

pub use sample::sample_records;

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use stagetrack_core::RawStageRecord;

/// Ingestion error
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected structure: {0}")]
    Structure(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON record file (.json)
    Json,
}

/// Detect file format from extension
pub fn detect_format(path: &Path) -> Result<FileFormat, ParseError> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("json") => Ok(FileFormat::Json),
        Some(other) => Err(ParseError::UnsupportedFormat(other.to_string())),
        None => Err(ParseError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Parse JSON record content.
///
/// The root is either an array of long records or an object with optional
/// `records` and `planner_rows` arrays. Entries that are not objects are
/// skipped with a warning.
pub fn parse_json(input: &str) -> Result<Vec<RawStageRecord>, ParseError> {
    let root: Value = serde_json::from_str(input)?;

    let records = match root {
        Value::Array(items) => long_records(&items),
        Value::Object(map) => {
            let long = map.get("records");
            let wide = map.get("planner_rows");
            if long.is_none() && wide.is_none() {
                return Err(ParseError::Structure(
                    "expected a 'records' or 'planner_rows' key".into(),
                ));
            }

            let mut records = Vec::new();
            if let Some(long) = long {
                records.extend(long_records(expect_array(long, "records")?));
            }
            if let Some(wide) = wide {
                for row in expect_array(wide, "planner_rows")? {
                    match row {
                        Value::Object(obj) => records.extend(planner::unpivot_row(obj)),
                        other => warn!(value = %other, "non-object planner row skipped"),
                    }
                }
            }
            records
        }
        _ => {
            return Err(ParseError::Structure(
                "root must be an array or an object".into(),
            ))
        }
    };

    debug!(count = records.len(), "parsed records");
    Ok(records)
}

fn expect_array<'a>(value: &'a Value, key: &str) -> Result<&'a [Value], ParseError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| ParseError::Structure(format!("'{}' must be an array", key)))
}

fn long_records(items: &[Value]) -> Vec<RawStageRecord> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => records::record_from_object(obj),
            other => {
                warn!(value = %other, "non-object record skipped");
                None
            }
        })
        .collect()
}

/// Parse a record file from a path (format from extension)
pub fn parse_file(path: &Path) -> Result<Vec<RawStageRecord>, ParseError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match format {
        FileFormat::Json => parse_json(&content),
    }
}

/// Where a record set came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    File(PathBuf),
    Sample,
}

/// Records plus their provenance
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    pub records: Vec<RawStageRecord>,
    pub source: RecordSource,
}

impl LoadedRecords {
    pub fn is_sample(&self) -> bool {
        self.source == RecordSource::Sample
    }
}

/// Load records from a file, falling back to the synthetic dataset when no
/// path is given, ingestion fails, or the file yields no records.
pub fn load_or_sample(path: Option<&Path>) -> LoadedRecords {
    let Some(path) = path else {
        info!("no input file, using sample dataset");
        return sample();
    };

    match parse_file(path) {
        Ok(records) if !records.is_empty() => LoadedRecords {
            records,
            source: RecordSource::File(path.to_path_buf()),
        },
        Ok(_) => {
            info!(path = %path.display(), "input has no records, using sample dataset");
            sample()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ingestion failed");
            info!("using sample dataset");
            sample()
        }
    }
}

fn sample() -> LoadedRecords {
    LoadedRecords {
        records: sample_records(),
        source: RecordSource::Sample,
    }
}
