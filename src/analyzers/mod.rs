//! Aggregation engine: pure derivations over a category-filtered row set.
//!
//! The viewer perspective asks "which countries supply content to market T";
//! the producer perspective asks "which markets does country T's content
//! reach". All functions recompute from scratch on every call and never
//! mutate shared state.

pub mod producer;
pub mod types;
pub mod utility;
pub mod viewer;

#[cfg(test)]
pub(crate) mod test_rows;

use thiserror::Error;

/// Feature-level analysis failures. These are reported inline by the caller;
/// they never abort unrelated computations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("{country} never appears as a charting market in this dataset")]
    MarketNotFound { country: String },
    #[error("{country} never appears as a producing country in this dataset")]
    ProducerNotFound { country: String },
    #[error("dataset has no `{column}` column; genre analysis unavailable")]
    MissingColumn { column: &'static str },
}
