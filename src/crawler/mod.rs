//! Crawler module for listing walks and detail fetching
//!
//! This module contains the core harvesting logic, including:
//! - Listing page parsing and the pagination walk
//! - The per-URL fetch state machine with block detection and retries
//! - Batch scheduling over a fixed pool of browsing contexts
//! - Overall category run coordination

mod block;
mod coordinator;
mod enumerator;
mod fetcher;
mod parser;
mod scheduler;

pub use block::BlockDetector;
pub use coordinator::{run_category, CategoryReport, Harvester};
pub use enumerator::{enumerate, Enumeration, ListingPolicy};
pub use fetcher::{AttemptOutcome, FetchPolicy, FetchResult, Fetcher};
pub use parser::{detail_links, parse_listing, total_pages, ListingPage};
pub use scheduler::{BatchSummary, Scheduler};
