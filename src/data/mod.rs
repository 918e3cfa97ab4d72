//! Remote data acquisition.

mod cache;

pub use cache::{CacheClient, FetchOutcome, FetchStatus, read_cached_etag};
