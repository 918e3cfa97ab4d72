//! Aggregation and formatted terminal output.
//!
//! Both transforms here are pure, read-only reductions over the filtered
//! point set; formatting is kept separate so output changes stay localized.

pub mod aggregate;
pub mod format;

pub use aggregate::{latest_snapshot, state_totals};
pub use format::{format_county_rows, format_run_summary, format_state_totals};
