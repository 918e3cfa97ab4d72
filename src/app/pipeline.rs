//! Shared reporting pipeline used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! conditional fetch -> CSV ingest -> state filter -> snapshot/totals
//!
//! The subcommands then focus on presentation (which tables to print).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::Settings;
use crate::data::{CacheClient, FetchOutcome, FetchStatus};
use crate::domain::{DataPoint, StateTotal};
use crate::error::AppError;
use crate::filter::filter_by_states;
use crate::io::ingest::{self, IngestedData};
use crate::report;

/// How the data on disk relates to the remote resource for this run.
#[derive(Debug, Clone)]
pub enum FetchReport {
    /// Fresh download; the cache was replaced.
    Downloaded {
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// Server answered 304; the cache is current.
    NotModified,
    /// The fetch failed but a previously cached file exists; the run
    /// continues against the stale copy. The error chain is kept for
    /// diagnostics.
    StaleFallback { error: AppError },
}

/// All computed outputs of a single reporting run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data_path: PathBuf,
    pub fetch: FetchReport,
    pub cache_modified: Option<DateTime<Local>>,
    pub ingest: IngestedData,
    pub filtered_count: usize,
    pub snapshot: Vec<DataPoint>,
    pub totals: Vec<StateTotal>,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_report(settings: &Settings) -> Result<RunOutput, AppError> {
    // 1) Refresh the cache (or fall back to a stale copy).
    let (data_path, fetch) = fetch_data(settings)?;

    // 2) Parse the cached CSV, isolating row failures.
    let ingest = ingest::load_data_points(&data_path)?;

    // 3) Narrow to the configured states.
    let filtered = filter_by_states(&ingest.points, &settings.state_filter);
    let filtered_count = filtered.len();

    // 4) Latest record per (state, county), then per-state totals.
    let snapshot = report::latest_snapshot(&filtered);
    let totals = report::state_totals(&snapshot);

    let cache_modified = modified_time(&data_path);

    Ok(RunOutput {
        data_path,
        fetch,
        cache_modified,
        ingest,
        filtered_count,
        snapshot,
        totals,
    })
}

/// Fetch step with the fallback policy: a failed fetch aborts the run only
/// when there is no previously cached file to report from.
pub fn fetch_data(settings: &Settings) -> Result<(PathBuf, FetchReport), AppError> {
    let client = CacheClient::new()?;
    let outcome = client.fetch(
        &settings.remote_data_source,
        &settings.output_directory,
        &settings.output_file_name,
    );

    match outcome {
        Ok(FetchOutcome { path, status }) => {
            let fetch = match status {
                FetchStatus::Downloaded {
                    etag,
                    last_modified,
                } => FetchReport::Downloaded {
                    etag,
                    last_modified,
                },
                FetchStatus::NotModified => FetchReport::NotModified,
            };
            Ok((path, fetch))
        }
        Err(error) => {
            let path = settings.data_file_path();
            if path.exists() {
                Ok((path, FetchReport::StaleFallback { error }))
            } else {
                Err(error)
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<DateTime<Local>> {
    let meta = std::fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    Some(modified.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unreachable_settings(dir: PathBuf) -> Settings {
        Settings {
            output_directory: dir,
            output_file_name: "us-counties.csv".to_string(),
            // Discard port on loopback: refused immediately, no network needed.
            remote_data_source: "http://127.0.0.1:9/us-counties.csv".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn failed_fetch_without_cache_aborts_with_exit_code_one() {
        let dir = std::env::temp_dir().join(format!("covex-nocache-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let err = fetch_data(&unreachable_settings(dir.clone())).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_fetch_with_cache_falls_back_to_stale_copy() {
        let dir = std::env::temp_dir().join(format!("covex-stale-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let cached = dir.join("us-counties.csv");
        fs::write(
            &cached,
            "date,county,state,fips,cases,deaths\n2021-01-01,Johnson,Kansas,20091,100,2\n",
        )
        .unwrap();

        let (path, fetch) = fetch_data(&unreachable_settings(dir.clone())).unwrap();
        assert_eq!(path, cached);
        assert!(matches!(fetch, FetchReport::StaleFallback { .. }));

        fs::remove_dir_all(&dir).unwrap();
    }
}
