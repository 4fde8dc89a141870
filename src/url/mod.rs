//! URL handling module for Lead-Harvest
//!
//! This module builds listing-page URLs and derives human labels and file
//! names from category listing URLs.

mod label;
mod paging;

// Re-export main functions
pub use label::{category_label, file_stem};
pub use paging::page_url;
