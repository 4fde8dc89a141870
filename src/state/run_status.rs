use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Phase of a category run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    /// Walking listing pages
    #[default]
    CollectingUrls,

    /// Fetching detail pages
    Scraping,

    // ===== Terminal States =====
    Completed,
    Error,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CollectingUrls => "collecting-urls",
            Self::Scraping => "scraping",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Progress snapshot of the current category run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub phase: RunPhase,
    pub category: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub urls_collected: usize,
    pub total_urls: usize,
    pub items_done: usize,
    pub items_failed: usize,
    pub last_item_name: Option<String>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl RunStatus {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            phase: RunPhase::CollectingUrls,
            category: category.into(),
            current_page: 0,
            total_pages: 0,
            urls_collected: 0,
            total_urls: 0,
            items_done: 0,
            items_failed: 0,
            last_item_name: None,
            error: None,
            updated_at: Utc::now(),
        }
    }
}

/// Receives every published status
pub trait StatusSink: Send {
    fn publish(&mut self, status: &RunStatus) -> std::io::Result<()>;
}

/// Overwrites a JSON file with the latest status
#[derive(Debug, Clone)]
pub struct JsonStatusFile {
    path: PathBuf,
}

impl JsonStatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusSink for JsonStatusFile {
    fn publish(&mut self, status: &RunStatus) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(status)?;
        std::fs::write(&self.path, json)
    }
}

/// Sink that drops every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn publish(&mut self, _status: &RunStatus) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sink forwarding to a closure
pub struct CallbackSink<F>(pub F);

impl<F> StatusSink for CallbackSink<F>
where
    F: FnMut(&RunStatus) + Send,
{
    fn publish(&mut self, status: &RunStatus) -> std::io::Result<()> {
        (self.0)(status);
        Ok(())
    }
}

/// Owns the run status and publishes it on every change
///
/// Publishing is best-effort: a failing sink is logged and the run goes on.
pub struct StatusReporter {
    status: RunStatus,
    sink: Box<dyn StatusSink>,
}

impl StatusReporter {
    pub fn new(sink: impl StatusSink + 'static) -> Self {
        Self {
            status: RunStatus::new(""),
            sink: Box::new(sink),
        }
    }

    /// Reporter that publishes nowhere
    pub fn silent() -> Self {
        Self::new(NullSink)
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// Starts a new category run
    pub fn reset(&mut self, category: &str) {
        self.status = RunStatus::new(category);
        self.publish();
    }

    /// A listing page was walked
    pub fn listing_page(&mut self, current_page: u32, total_pages: u32, urls_collected: usize) {
        self.status.phase = RunPhase::CollectingUrls;
        self.status.current_page = current_page;
        self.status.total_pages = total_pages;
        self.status.urls_collected = urls_collected;
        self.publish();
    }

    /// Detail fetching begins for `total_urls` URLs
    pub fn begin_scraping(&mut self, total_urls: usize) {
        self.status.phase = RunPhase::Scraping;
        self.status.total_urls = total_urls;
        self.publish();
    }

    /// A batch finished with `done` records and `failed` URLs
    pub fn batch_finished(&mut self, done: usize, failed: usize, last_item_name: Option<&str>) {
        self.status.items_done += done;
        self.status.items_failed += failed;
        if let Some(name) = last_item_name {
            self.status.last_item_name = Some(name.to_string());
        }
        self.publish();
    }

    pub fn complete(&mut self) {
        self.status.phase = RunPhase::Completed;
        self.publish();
    }

    pub fn fail(&mut self, error: &str) {
        self.status.phase = RunPhase::Error;
        self.status.error = Some(error.to_string());
        self.publish();
    }

    fn publish(&mut self) {
        self.status.updated_at = Utc::now();
        if let Err(e) = self.sink.publish(&self.status) {
            tracing::warn!("Failed to publish run status: {}", e);
        }
    }
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
