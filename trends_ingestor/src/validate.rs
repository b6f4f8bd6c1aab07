//! Read-only validation of output files against the consumer contract.
//!
//! Validation never mutates a file. A file that fails blocks its own
//! publication (the caller exits non-zero), but never stops validation of
//! the remaining files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::models::observation::MAX_ROWS;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Default staleness threshold for the freshness warning, in days.
pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;

/// A single contract violation found in an output file. Row numbers are
/// 1-based and count the header as row 1, matching what an editor shows.
#[derive(Debug, Error, PartialEq)]
pub enum Violation {
    #[error("unable to read file: {message}")]
    Unreadable { message: String },

    #[error("invalid header: expected `time,close`, got `{got}`")]
    BadHeader { got: String },

    #[error("row {row}: expected 2 columns, got {got}")]
    Structural { row: usize, got: usize },

    #[error("row {row}: invalid timestamp `{value}`")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: timestamps must be strictly ascending")]
    OrderingViolation { row: usize },

    #[error("row {row}: invalid close value `{value}`")]
    BadScore { row: usize, value: String },

    #[error("row {row}: close value {value} outside expected range [0, 100]")]
    ValueOutOfRange { row: usize, value: f64 },

    #[error("too many data rows: {rows} (max {max})")]
    SizeExceeded { rows: usize, max: usize },

    #[error("no data rows found")]
    Empty,
}

/// Validation result for one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    /// Number of data rows (header excluded).
    pub rows: usize,
    pub violations: Vec<Violation>,
    /// Age in days of the newest point, when it exceeds the freshness
    /// threshold. Staleness is a warning; it never makes a file invalid.
    pub stale_age_days: Option<i64>,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Validation results for a whole data directory.
#[derive(Debug, Default)]
pub struct ValidationReport {
    files: Vec<FileReport>,
}

impl ValidationReport {
    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn invalid_count(&self) -> usize {
        self.files.iter().filter(|r| !r.is_valid()).count()
    }

    pub fn all_valid(&self) -> bool {
        self.invalid_count() == 0
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Validation Results ===")?;
        for file in &self.files {
            if file.is_valid() {
                writeln!(f, "{}: valid ({} rows)", file.file_name(), file.rows)?;
            } else {
                writeln!(f, "{}: INVALID", file.file_name())?;
                for violation in &file.violations {
                    writeln!(f, "  {violation}")?;
                }
            }
            if let Some(age) = file.stale_age_days {
                writeln!(f, "  warning: newest data point is {age} days old")?;
            }
        }
        write!(
            f,
            "Files validated: {}, valid: {}, invalid: {}",
            self.files.len(),
            self.files.len() - self.invalid_count(),
            self.invalid_count()
        )
    }
}

/// Validates every `*.csv` file in `dir`, in file-name order.
///
/// A missing directory yields an empty report (nothing has been published
/// yet); the caller decides whether that's acceptable.
pub fn validate_all(dir: &Path, max_age_days: i64) -> Result<ValidationReport, std::io::Error> {
    let mut report = ValidationReport::default();
    if !dir.exists() {
        return Ok(report);
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    for path in paths {
        report.files.push(validate_file(&path, max_age_days));
    }

    Ok(report)
}

/// Validates a single output file. Read-only.
pub fn validate_file(path: &Path, max_age_days: i64) -> FileReport {
    debug!(path = %path.display(), "validating output file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return FileReport {
                path: path.to_path_buf(),
                rows: 0,
                violations: vec![Violation::Unreadable {
                    message: e.to_string(),
                }],
                stale_age_days: None,
            };
        }
    };

    let mut violations = Vec::new();
    let mut lines = content.lines();

    match lines.next() {
        Some("time,close") => {}
        Some(header) => violations.push(Violation::BadHeader {
            got: header.to_string(),
        }),
        None => {
            return FileReport {
                path: path.to_path_buf(),
                rows: 0,
                violations: vec![Violation::Empty],
                stale_age_days: None,
            };
        }
    }

    let mut rows = 0usize;
    let mut prev_timestamp: Option<i64> = None;
    let mut newest: Option<i64> = None;

    for (i, line) in lines.enumerate() {
        let row = i + 2;
        rows += 1;

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 2 {
            violations.push(Violation::Structural {
                row,
                got: fields.len(),
            });
            continue;
        }

        match fields[0].parse::<i64>() {
            Ok(timestamp) => {
                if prev_timestamp.is_some_and(|prev| timestamp <= prev) {
                    violations.push(Violation::OrderingViolation { row });
                }
                prev_timestamp = Some(timestamp);
                newest = Some(newest.map_or(timestamp, |n: i64| n.max(timestamp)));
            }
            Err(_) => violations.push(Violation::BadTimestamp {
                row,
                value: fields[0].to_string(),
            }),
        }

        if !fields[1].is_empty() {
            match fields[1].parse::<f64>() {
                Ok(value) if !(SCORE_MIN..=SCORE_MAX).contains(&value) => {
                    violations.push(Violation::ValueOutOfRange { row, value });
                }
                Ok(_) => {}
                Err(_) => violations.push(Violation::BadScore {
                    row,
                    value: fields[1].to_string(),
                }),
            }
        }
    }

    if rows == 0 {
        violations.push(Violation::Empty);
    } else if rows > MAX_ROWS {
        violations.push(Violation::SizeExceeded {
            rows,
            max: MAX_ROWS,
        });
    }

    let stale_age_days = newest
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|newest| (Utc::now() - newest).num_days())
        .filter(|age| *age > max_age_days);

    FileReport {
        path: path.to_path_buf(),
        rows,
        violations,
        stale_age_days,
    }
}
