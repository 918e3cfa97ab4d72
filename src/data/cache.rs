//! Conditional retrieval of the published dataset.
//!
//! The upstream file is republished on a schedule, so most runs see an
//! unchanged resource. We keep the last download on disk together with the
//! server's validation tag (ETag) in a sidecar file, and revalidate with
//! `If-None-Match` on every fetch:
//!
//! - `304 Not Modified`: the cached file is left untouched and stays
//!   authoritative.
//! - `2xx`: the body replaces the cached file and the new tag is persisted.
//! - anything else: an error carrying the full cause chain; the caller
//!   decides whether a stale cache can stand in.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ETAG, HeaderName, IF_NONE_MATCH, LAST_MODIFIED};

use crate::error::AppError;

const ETAG_FILE: &str = "ETag.txt";

/// The upstream publisher has no SLA; a request that hangs must not hang
/// the whole run.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// What a fetch did to the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Full body downloaded; the cache file was replaced.
    Downloaded {
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// Server confirmed the cached copy is current.
    NotModified,
}

/// Where the data ended up, and how it got there.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub path: PathBuf,
    pub status: FetchStatus,
}

pub struct CacheClient {
    client: Client,
}

impl CacheClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| AppError::with_source(1, "Failed to build HTTP client", &e))?;
        Ok(Self { client })
    }

    /// Fetch `source_url` into `output_dir/file_name`, revalidating the
    /// cached copy when possible.
    pub fn fetch(
        &self,
        source_url: &str,
        output_dir: &Path,
        file_name: &str,
    ) -> Result<FetchOutcome, AppError> {
        fs::create_dir_all(output_dir).map_err(|e| {
            AppError::with_source(
                1,
                format!(
                    "Failed to create output directory '{}'",
                    output_dir.display()
                ),
                &e,
            )
        })?;

        let path = output_dir.join(file_name);

        let mut request = self.client.get(source_url);
        if let Some(tag) = conditional_tag(read_cached_etag(output_dir).as_deref(), &path) {
            request = request.header(IF_NONE_MATCH, tag);
        }

        let mut response = request
            .send()
            .map_err(|e| AppError::with_source(1, format!("Request to '{source_url}' failed"), &e))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome {
                path,
                status: FetchStatus::NotModified,
            });
        }
        if !response.status().is_success() {
            return Err(AppError::new(
                1,
                format!(
                    "Request to '{source_url}' returned status {}",
                    response.status()
                ),
            ));
        }

        let etag = header_string(&response, ETAG);
        let last_modified = header_string(&response, LAST_MODIFIED);

        let mut file = File::create(&path).map_err(|e| {
            AppError::with_source(
                1,
                format!("Failed to create cache file '{}'", path.display()),
                &e,
            )
        })?;
        response.copy_to(&mut file).map_err(|e| {
            AppError::with_source(
                1,
                format!("Failed to write cache file '{}'", path.display()),
                &e,
            )
        })?;

        // The sidecar must only ever describe the file we just wrote.
        match &etag {
            Some(tag) => write_etag(output_dir, tag)?,
            None => {
                let _ = fs::remove_file(output_dir.join(ETAG_FILE));
            }
        }

        Ok(FetchOutcome {
            path,
            status: FetchStatus::Downloaded {
                etag,
                last_modified,
            },
        })
    }
}

/// Last-seen validation tag, if one is stored alongside the cache.
pub fn read_cached_etag(output_dir: &Path) -> Option<String> {
    let raw = fs::read_to_string(output_dir.join(ETAG_FILE)).ok()?;
    let tag = raw.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

fn write_etag(output_dir: &Path, tag: &str) -> Result<(), AppError> {
    let path = output_dir.join(ETAG_FILE);
    fs::write(&path, tag).map_err(|e| {
        AppError::with_source(
            1,
            format!("Failed to persist validation tag '{}'", path.display()),
            &e,
        )
    })
}

/// Decide whether to send `If-None-Match`: a 304 is only usable if the body
/// it refers to is still on disk.
fn conditional_tag<'a>(etag: Option<&'a str>, cached_file: &Path) -> Option<&'a str> {
    let tag = etag?;
    if cached_file.exists() { Some(tag) } else { None }
}

fn header_string(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
