//! Formatted terminal output: run summary and the two report tables.
//!
//! Formatting stays in one place so the aggregation code remains clean and
//! the table layout is easy to change (and to snapshot-test).

use crate::app::pipeline::{FetchReport, RunOutput};
use crate::config::Settings;
use crate::domain::{DataPoint, StateTotal};

const DATE_W: usize = 12;
const STATE_W: usize = 32;
const COUNTY_W: usize = 32;
const COUNT_W: usize = 20;

/// Header block printed before the tables: where the data came from, what
/// the fetch did, and how ingest went.
pub fn format_run_summary(settings: &Settings, run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== covex - COVID County Case Explorer ===\n");
    out.push_str(&format!("Source: {}\n", settings.remote_data_source));

    match &run.cache_modified {
        Some(ts) => out.push_str(&format!(
            "Cache: {} (modified {})\n",
            run.data_path.display(),
            ts.format("%Y-%m-%d %H:%M:%S")
        )),
        None => out.push_str(&format!("Cache: {}\n", run.data_path.display())),
    }

    match &run.fetch {
        FetchReport::Downloaded {
            etag,
            last_modified,
        } => {
            out.push_str("Fetch: downloaded\n");
            if let Some(tag) = etag {
                out.push_str(&format!("ETag: {tag}\n"));
            }
            if let Some(lm) = last_modified {
                out.push_str(&format!("Last-Modified: {lm}\n"));
            }
        }
        FetchReport::NotModified => {
            out.push_str("Fetch: data file in cache is the latest available\n");
        }
        FetchReport::StaleFallback { .. } => {
            out.push_str("Fetch: failed; reporting from the cached copy\n");
        }
    }

    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        run.ingest.rows_read,
        run.ingest.rows_used(),
        run.ingest.row_errors.len()
    ));
    out.push_str(&format!(
        "Selected: {} rows across {} county groups\n",
        run.filtered_count,
        run.snapshot.len()
    ));

    if settings.state_filter.is_empty() {
        out.push_str("States included: all\n");
    } else {
        out.push_str(&format!(
            "States included: {}\n",
            settings.state_filter.join(", ")
        ));
    }

    out
}

/// Per-state totals, ranked by total cases.
pub fn format_state_totals(totals: &[StateTotal]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<STATE_W$} {:>COUNT_W$} {:>COUNT_W$}\n",
        "State", "Cases", "Deaths"
    ));
    out.push_str(&format!(
        "{} {} {}\n",
        dashes(STATE_W),
        dashes(COUNT_W),
        dashes(COUNT_W)
    ));

    for t in totals {
        out.push_str(&format!(
            "{:<STATE_W$} {:>COUNT_W$} {:>COUNT_W$}\n",
            truncate(&t.state, STATE_W),
            group_thousands(t.total_cases),
            group_thousands(t.total_deaths),
        ));
    }

    out
}

/// Per-(state, county) latest-snapshot rows, ranked by cases.
pub fn format_county_rows(rows: &[DataPoint]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<DATE_W$} {:<STATE_W$} {:<COUNTY_W$} {:>COUNT_W$} {:>COUNT_W$}\n",
        "Date", "State", "County", "Cases", "Deaths"
    ));
    out.push_str(&format!(
        "{} {} {} {} {}\n",
        dashes(DATE_W),
        dashes(STATE_W),
        dashes(COUNTY_W),
        dashes(COUNT_W),
        dashes(COUNT_W)
    ));

    for r in rows {
        out.push_str(&format!(
            "{:<DATE_W$} {:<STATE_W$} {:<COUNTY_W$} {:>COUNT_W$} {:>COUNT_W$}\n",
            r.date.format("%m/%d/%y").to_string(),
            truncate(&r.state, STATE_W),
            truncate(&r.county, COUNTY_W),
            group_thousands(u64::from(r.cases)),
            group_thousands(u64::from(r.deaths)),
        ));
    }

    out
}

fn dashes(width: usize) -> String {
    "-".repeat(width)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
