//! CSV ingest: the cached data file → typed `DataPoint`s.
//!
//! Design goals:
//! - **Row-level isolation**: one malformed row is recorded and skipped;
//!   it never aborts the ingest and never produces a partial `DataPoint`.
//! - **File order preserved** (downstream grouping is order-insensitive,
//!   but the tie-break rule in the aggregator relies on a stable scan).
//! - **Deterministic**: ingesting the same file twice yields the same set.
//!
//! Expected schema after the header row: `date,county,state,fips,cases,deaths`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::DataPoint;
use crate::error::{AppError, cause_chain};

/// A row-level failure encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    /// 1-based line number in the source file.
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed points in file order plus row-level failures.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub points: Vec<DataPoint>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.points.len()
    }
}

/// Load the cached data file.
pub fn load_data_points(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::with_source(
            3,
            format!("Failed to open data file '{}'", path.display()),
            &e,
        )
    })?;
    Ok(ingest_from_reader(file))
}

/// Ingest CSV from any reader. Split out from [`load_data_points`] so the
/// parsing rules are testable without touching the filesystem.
pub fn ingest_from_reader<R: Read>(input: R) -> IngestedData {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after the header
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: cause_chain(&e).join(": "),
                });
                continue;
            }
        };

        match parse_row(&record) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    IngestedData {
        points,
        row_errors,
        rows_read,
    }
}

fn parse_row(record: &StringRecord) -> Result<DataPoint, String> {
    if record.len() < 6 {
        return Err(format!(
            "Expected at least 6 comma-separated fields, got {}",
            record.len()
        ));
    }

    Ok(DataPoint {
        date: parse_date(&record[0])?,
        county: record[1].to_string(),
        state: record[2].to_string(),
        id: parse_id(&record[3])?,
        cases: parse_count(&record[4], "cases")?,
        deaths: parse_count(&record[5], "deaths")?,
    })
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // The published dataset uses ISO dates; `MM/DD/YYYY` shows up in manually
    // re-exported copies, so accept it too. Parsing stays deterministic.
    const FMTS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected YYYY-MM-DD or MM/DD/YYYY."
    ))
}

/// FIPS id; the source leaves it blank for unallocated counties.
fn parse_id(s: &str) -> Result<u32, String> {
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u32>()
        .map_err(|e| format!("Invalid fips id '{s}': {e}"))
}

fn parse_count(s: &str, field: &str) -> Result<u32, String> {
    s.parse::<u32>()
        .map_err(|e| format!("Invalid {field} value '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "date,county,state,fips,cases,deaths\n";

    fn ingest(body: &str) -> IngestedData {
        ingest_from_reader(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn parses_rows_in_file_order() {
        let data = ingest(
            "2021-01-01,Johnson,Kansas,20091,100,2\n\
             2021-01-02,Sedgwick,Kansas,20173,50,1\n",
        );
        assert_eq!(data.rows_read, 2);
        assert_eq!(data.rows_used(), 2);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.points[0].county, "Johnson");
        assert_eq!(data.points[0].date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(data.points[0].cases, 100);
        assert_eq!(data.points[1].county, "Sedgwick");
    }

    #[test]
    fn ingest_is_deterministic() {
        let body = "2021-01-01,Johnson,Kansas,20091,100,2\n\
                    2021-01-02,Johnson,Kansas,20091,150,3\n";
        assert_eq!(ingest(body).points, ingest(body).points);
    }

    #[test]
    fn short_row_is_skipped_without_aborting() {
        let data = ingest(
            "2021-01-01,Johnson,Kansas\n\
             2021-01-02,Sedgwick,Kansas,20173,50,1\n",
        );
        assert_eq!(data.rows_used(), 1);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 2);
        assert!(data.row_errors[0].message.contains("6"));
        assert_eq!(data.points[0].county, "Sedgwick");
    }

    #[test]
    fn non_numeric_counts_are_row_failures() {
        let data = ingest(
            "2021-01-01,Johnson,Kansas,20091,many,2\n\
             2021-01-01,Johnson,Kansas,20091,100,-2\n\
             2021-01-02,Sedgwick,Kansas,20173,50,1\n",
        );
        // Negative counts fail the unsigned parse just like text does.
        assert_eq!(data.rows_used(), 1);
        assert_eq!(data.row_errors.len(), 2);
        assert!(data.row_errors[0].message.contains("cases"));
        assert!(data.row_errors[1].message.contains("deaths"));
    }

    #[test]
    fn empty_id_defaults_to_zero() {
        let data = ingest("2021-01-01,Unknown,Kansas,,10,0\n");
        assert_eq!(data.rows_used(), 1);
        assert_eq!(data.points[0].id, 0);
    }

    #[test]
    fn non_numeric_id_is_a_row_failure() {
        let data = ingest("2021-01-01,Johnson,Kansas,none,10,0\n");
        assert_eq!(data.rows_used(), 0);
        assert_eq!(data.row_errors.len(), 1);
        assert!(data.row_errors[0].message.contains("fips"));
    }

    #[test]
    fn bad_date_is_a_row_failure() {
        let data = ingest("yesterday,Johnson,Kansas,20091,10,0\n");
        assert_eq!(data.rows_used(), 0);
        assert!(data.row_errors[0].message.contains("Invalid date"));
    }
}
