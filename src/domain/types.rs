//! Shared domain types.
//!
//! These types are intentionally lightweight and serializable so they can be:
//!
//! - built once during ingest and passed around by reference
//! - grouped/summed by the report transforms without further parsing

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation row from the county-level dataset.
///
/// Immutable once constructed: the ingestor only produces a `DataPoint` from a
/// syntactically complete row, so a value of this type is always fully parsed.
/// Counts are unsigned because the source publishes cumulative tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub county: String,
    pub state: String,
    /// County FIPS code. The source leaves this blank for some rows
    /// (e.g. "Unknown" counties); those carry 0.
    pub id: u32,
    pub cases: u32,
    pub deaths: u32,
}

/// Per-state totals over each county's latest-dated record.
///
/// Rebuilt fresh on every run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTotal {
    pub state: String,
    pub total_cases: u64,
    pub total_deaths: u64,
}
