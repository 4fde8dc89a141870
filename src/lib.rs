//! Lead-Harvest: a directory lead extractor
//!
//! This crate walks the paginated listing pages of a business directory,
//! visits every provider detail page through a small pool of hardened
//! browsing contexts, extracts contact records with text/DOM heuristics and
//! persists them incrementally to a tabular file that can be resumed.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod render;
pub mod session;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Lead-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Listing page {url} could not be walked: {message}")]
    Listing { url: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}' for {field}")]
    InvalidSelector { field: &'static str, selector: String },
}

/// Result type alias for Lead-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlUnit};
pub use crawler::{run_category, Harvester};
pub use extract::{Extractor, Lead, PageExtractor, ProviderType};
pub use state::{RunPhase, RunStatus, StatusReporter};
