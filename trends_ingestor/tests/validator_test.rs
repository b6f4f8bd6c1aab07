//! Validator tests against real files in a temp directory.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tempfile::tempdir;

use trends_ingestor::models::observation::MAX_ROWS;
use trends_ingestor::validate::{Violation, validate_all, validate_file};

const MAX_AGE_DAYS: i64 = 7;

/// A small valid file with fresh timestamps.
fn fresh_valid_content() -> String {
    let now = Utc::now().timestamp();
    format!(
        "time,close\n{},42\n{},\n{},63.5\n",
        now - 2 * 86_400,
        now - 86_400,
        now
    )
}

fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn valid_file_passes_and_is_not_mutated() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "OK.csv", &fresh_valid_content());
    let before = fs::read(&path).unwrap();

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.is_valid(), "violations: {:?}", report.violations);
    assert_eq!(report.rows, 3);
    assert_eq!(report.stale_age_days, None);
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn out_of_order_timestamp_is_flagged_with_its_row() {
    let dir = tempdir().unwrap();
    let path = write(
        dir.path(),
        "ORDER.csv",
        "time,close\n1704067200,42\n1704240000,57\n1704153600,63\n",
    );

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(!report.is_valid());
    assert!(report.violations.contains(&Violation::OrderingViolation { row: 4 }));
}

#[test]
fn duplicate_timestamp_is_an_ordering_violation() {
    let dir = tempdir().unwrap();
    let path = write(
        dir.path(),
        "DUP.csv",
        "time,close\n1704067200,42\n1704067200,57\n",
    );

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::OrderingViolation { row: 3 }));
}

#[test]
fn scores_outside_bounds_are_flagged() {
    let dir = tempdir().unwrap();
    let path = write(
        dir.path(),
        "RANGE.csv",
        "time,close\n1704067200,150\n1704153600,-5\n",
    );

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::ValueOutOfRange {
        row: 2,
        value: 150.0
    }));
    assert!(report.violations.contains(&Violation::ValueOutOfRange {
        row: 3,
        value: -5.0
    }));
}

#[test]
fn empty_close_field_is_allowed() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "GAP.csv", "time,close\n1704067200,\n");

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(!report.violations.iter().any(|v| matches!(
        v,
        Violation::BadScore { .. } | Violation::ValueOutOfRange { .. }
    )));
}

#[test]
fn wrong_header_is_flagged() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "HDR.csv", "date,value\n1704067200,42\n");

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::BadHeader {
        got: "date,value".to_string()
    }));
}

#[test]
fn wrong_column_count_is_structural() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "COLS.csv", "time,close\n1704067200,42,extra\n");

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::Structural { row: 2, got: 3 }));
}

#[test]
fn unparsable_fields_are_flagged() {
    let dir = tempdir().unwrap();
    let path = write(
        dir.path(),
        "PARSE.csv",
        "time,close\nyesterday,42\n1704153600,high\n",
    );

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::BadTimestamp {
        row: 2,
        value: "yesterday".to_string()
    }));
    assert!(report.violations.contains(&Violation::BadScore {
        row: 3,
        value: "high".to_string()
    }));
}

#[test]
fn header_only_file_is_empty() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "EMPTY.csv", "time,close\n");

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::Empty));
}

#[test]
fn zero_byte_file_is_empty() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "ZERO.csv", "");

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::Empty));
}

#[test]
fn files_over_the_row_cap_are_flagged() {
    let dir = tempdir().unwrap();
    let mut content = String::from("time,close\n");
    for i in 0..(MAX_ROWS + 1) {
        content.push_str(&format!("{},50\n", 1_600_000_000 + i as i64 * 86_400));
    }
    let path = write(dir.path(), "BIG.csv", &content);

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.violations.contains(&Violation::SizeExceeded {
        rows: MAX_ROWS + 1,
        max: MAX_ROWS
    }));
}

#[test]
fn old_data_warns_but_stays_valid() {
    let dir = tempdir().unwrap();
    let old = Utc::now().timestamp() - 30 * 86_400;
    let path = write(dir.path(), "STALE.csv", &format!("time,close\n{old},42\n"));

    let report = validate_file(&path, MAX_AGE_DAYS);

    assert!(report.is_valid());
    let age = report.stale_age_days.expect("expected staleness warning");
    assert!(age >= 29);
}

#[test]
fn validate_all_isolates_per_file_failures() {
    let dir = tempdir().unwrap();
    write(dir.path(), "A_BAD.csv", "time,close\nnope,42\n");
    write(dir.path(), "B_GOOD.csv", &fresh_valid_content());
    // Non-CSV files are ignored.
    write(dir.path(), "README.md", "not data");

    let report = validate_all(dir.path(), MAX_AGE_DAYS).unwrap();

    assert_eq!(report.files().len(), 2);
    assert_eq!(report.invalid_count(), 1);
    assert!(!report.all_valid());
    // Sorted by file name: the bad file comes first yet the good one was
    // still validated.
    assert!(!report.files()[0].is_valid());
    assert!(report.files()[1].is_valid());
}

#[test]
fn missing_directory_yields_an_empty_report() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let report = validate_all(&missing, MAX_AGE_DAYS).unwrap();

    assert!(report.is_empty());
}

#[test]
fn report_display_lists_violations() {
    let dir = tempdir().unwrap();
    write(dir.path(), "BAD.csv", "time,close\n1704240000,42\n1704067200,57\n");

    let report = validate_all(dir.path(), MAX_AGE_DAYS).unwrap();
    let rendered = report.to_string();

    assert!(rendered.contains("BAD.csv: INVALID"));
    assert!(rendered.contains("timestamps must be strictly ascending"));
    assert!(rendered.contains("Files validated: 1, valid: 0, invalid: 1"));
}
