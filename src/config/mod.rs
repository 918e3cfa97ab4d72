//! Run settings: a JSON settings file with environment overrides.
//!
//! Precedence, highest first: CLI flags (applied by the app layer) >
//! environment (`COVEX_*`, with `.env` honored) > settings file > built-in
//! defaults. The settings file is optional at the default path but an
//! explicitly requested path must exist.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_CONFIG_PATH: &str = "covex.json";

const DEFAULT_OUTPUT_DIR: &str = "data";
const DEFAULT_OUTPUT_FILE: &str = "us-counties.csv";
const DEFAULT_SOURCE: &str =
    "https://raw.githubusercontent.com/nytimes/covid-19-data/master/us-counties.csv";
const DEFAULT_EXIT_DELAY_MS: u64 = 15_000;

/// Resolved settings handed to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the cached CSV and its ETag sidecar.
    pub output_directory: PathBuf,
    /// File name of the cached CSV inside `output_directory`.
    pub output_file_name: String,
    /// URL of the published dataset.
    pub remote_data_source: String,
    /// States to report on; empty means no filtering.
    pub state_filter: Vec<String>,
    /// Upper bound for the interactive "press any key" pause.
    pub exit_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_file_name: DEFAULT_OUTPUT_FILE.to_string(),
            remote_data_source: DEFAULT_SOURCE.to_string(),
            state_filter: Vec::new(),
            exit_delay_ms: DEFAULT_EXIT_DELAY_MS,
        }
    }
}

impl Settings {
    /// Path of the cached data file.
    pub fn data_file_path(&self) -> PathBuf {
        self.output_directory.join(&self.output_file_name)
    }
}

/// Load settings from `path` (or the default location) and apply environment
/// overrides.
pub fn load(path: Option<&Path>) -> Result<Settings, AppError> {
    let mut settings = match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|e| {
                AppError::with_source(
                    2,
                    format!("Failed to read settings file '{}'", path.display()),
                    &e,
                )
            })?;
            parse(&raw, path)?
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            match fs::read_to_string(default) {
                Ok(raw) => parse(&raw, default)?,
                // No file at the default location is fine; run on defaults.
                Err(_) => Settings::default(),
            }
        }
    };

    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn parse(raw: &str, path: &Path) -> Result<Settings, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::with_source(
            2,
            format!("Invalid settings file '{}'", path.display()),
            &e,
        )
    })
}

fn apply_env_overrides(settings: &mut Settings) {
    dotenvy::dotenv().ok();

    if let Ok(source) = env::var("COVEX_SOURCE") {
        if !source.trim().is_empty() {
            settings.remote_data_source = source;
        }
    }
    if let Ok(dir) = env::var("COVEX_OUTPUT_DIR") {
        if !dir.trim().is_empty() {
            settings.output_directory = PathBuf::from(dir);
        }
    }
}
