//! CSV sink writing one `<SYMBOL>.csv` file per series.
//!
//! The at-rest format is the two-column contract the downstream charting
//! platform polls: a `time,close` header, Unix-second timestamps, scores in
//! `[0, 100]` or an empty field for missing points.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::DateTime;
use snafu::ResultExt;
use tempfile::NamedTempFile;

use crate::io::sink::{DataSink, IoSnafu, ParseSnafu, SinkError, WriteSnafu};
use crate::models::observation::{Observation, SeriesData};

pub const HEADER: [&str; 2] = ["time", "close"];

/// File-per-series CSV sink rooted at a data directory.
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The output file backing `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_series(path: &Path) -> Result<SeriesData, SinkError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            ParseSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        let headers = reader.headers().map_err(|e| {
            ParseSnafu {
                message: e.to_string(),
            }
            .build()
        })?;
        if headers.iter().ne(HEADER) {
            return ParseSnafu {
                message: format!("unexpected header `{}`", headers.iter().collect::<Vec<_>>().join(",")),
            }
            .fail();
        }

        let mut observations = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                ParseSnafu {
                    message: e.to_string(),
                }
                .build()
            })?;
            let row = i + 2;
            if record.len() != 2 {
                return ParseSnafu {
                    message: format!("row {row}: expected 2 fields, got {}", record.len()),
                }
                .fail();
            }

            let secs: i64 = record[0].parse().map_err(|_| {
                ParseSnafu {
                    message: format!("row {row}: invalid timestamp `{}`", &record[0]),
                }
                .build()
            })?;
            let time = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                ParseSnafu {
                    message: format!("row {row}: timestamp `{secs}` out of range"),
                }
                .build()
            })?;

            let score = if record[1].is_empty() {
                None
            } else {
                Some(record[1].parse::<f64>().map_err(|_| {
                    ParseSnafu {
                        message: format!("row {row}: invalid close value `{}`", &record[1]),
                    }
                    .build()
                })?)
            };

            observations.push(Observation { time, score });
        }

        Ok(SeriesData::from_observations(observations))
    }

    fn write_series(&self, path: &Path, data: &SeriesData) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir).context(IoSnafu)?;

        // Write to a sibling temp file and rename over the target, so a
        // concurrent reader never sees a half-written file.
        let tmp = NamedTempFile::new_in(&self.dir).context(IoSnafu)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file());
            writer.write_record(HEADER).map_err(|e| {
                WriteSnafu {
                    message: e.to_string(),
                }
                .build()
            })?;
            for obs in data.points() {
                let time = obs.time.timestamp().to_string();
                let close = obs.score.map(|v| v.to_string()).unwrap_or_default();
                writer.write_record([time.as_str(), close.as_str()]).map_err(|e| {
                    WriteSnafu {
                        message: e.to_string(),
                    }
                    .build()
                })?;
            }
            writer.flush().context(IoSnafu)?;
        }
        tmp.persist(path).map_err(|e| e.error).context(IoSnafu)?;

        Ok(())
    }
}

#[async_trait]
impl DataSink for CsvDirSink {
    type Output = PathBuf;

    async fn load(&self, symbol: &str) -> Result<Option<SeriesData>, SinkError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_series(&path).map(Some)
    }

    async fn write(&self, symbol: &str, data: &SeriesData) -> Result<PathBuf, SinkError> {
        let path = self.path_for(symbol);
        self.write_series(&path, data)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;

    fn sample_data() -> SeriesData {
        SeriesData::from_observations([
            Observation {
                time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                score: Some(42.0),
            },
            Observation {
                time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
                score: None,
            },
            Observation {
                time: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
                score: Some(63.5),
            },
        ])
    }

    #[tokio::test]
    async fn write_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let sink = CsvDirSink::new(dir.path());

        let data = sample_data();
        let path = sink.write("GOOGL_TRENDS_BITCOIN", &data).await.unwrap();
        assert_eq!(path, dir.path().join("GOOGL_TRENDS_BITCOIN.csv"));

        let loaded = sink.load("GOOGL_TRENDS_BITCOIN").await.unwrap().unwrap();
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn written_file_matches_contract() {
        let dir = tempdir().unwrap();
        let sink = CsvDirSink::new(dir.path());

        sink.write("TEST", &sample_data()).await.unwrap();

        let content = fs::read_to_string(dir.path().join("TEST.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "time,close");
        assert_eq!(lines[1], "1704067200,42");
        // Missing score is an empty field, not a zero.
        assert_eq!(lines[2], "1704153600,");
        assert_eq!(lines[3], "1704240000,63.5");
        assert_eq!(lines.len(), 4);
    }

    #[tokio::test]
    async fn load_missing_symbol_is_none() {
        let dir = tempdir().unwrap();
        let sink = CsvDirSink::new(dir.path());

        assert!(sink.load("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let sink = CsvDirSink::new(dir.path());
        fs::write(dir.path().join("BAD.csv"), "time,close\ngarbage,42\n").unwrap();

        let err = sink.load("BAD").await.unwrap_err();
        assert!(matches!(err, SinkError::ParseError { .. }));
    }

    #[tokio::test]
    async fn load_rejects_wrong_header() {
        let dir = tempdir().unwrap();
        let sink = CsvDirSink::new(dir.path());
        fs::write(dir.path().join("HDR.csv"), "date,value\n1704067200,42\n").unwrap();

        let err = sink.load("HDR").await.unwrap_err();
        assert!(matches!(err, SinkError::ParseError { .. }));
    }

    #[tokio::test]
    async fn rewrite_fully_replaces_previous_content() {
        let dir = tempdir().unwrap();
        let sink = CsvDirSink::new(dir.path());

        sink.write("TEST", &sample_data()).await.unwrap();
        let shorter = SeriesData::from_observations([Observation {
            time: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            score: Some(10.0),
        }]);
        sink.write("TEST", &shorter).await.unwrap();

        let loaded = sink.load("TEST").await.unwrap().unwrap();
        assert_eq!(loaded, shorter);
    }
}
