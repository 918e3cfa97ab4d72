//! Shared domain types for the reporting pipeline.

mod types;

pub use types::{DataPoint, StateTotal};
