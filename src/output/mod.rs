//! Output module for persisting harvested leads
//!
//! This module handles:
//! - Incremental, resumable per-category lead files
//! - The failed-URL list of a category run
//! - Merging per-category files into one consolidated file
//! - Run statistics printed at the end of a harvest

mod consolidate;
mod failed;
pub mod stats;
mod store;
pub mod tabular;

pub use consolidate::{consolidate, ConsolidationReport};
pub use failed::write_failed_urls;
pub use stats::{print_statistics, RunStatistics};
pub use store::ResultStore;
pub use tabular::{CsvStore, LeadRow, TabularStore, COLUMNS, COLUMN_WIDTHS};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
