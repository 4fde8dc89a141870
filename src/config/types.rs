use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Lead-Harvest
///
/// Every table is optional. `Config::default()` is the tuning used for the
/// directory out of the box: two contexts, 800ms between batches, 45s
/// navigation timeout and three attempts per detail page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub session: SessionConfig,
    pub site: SiteProfile,
    pub output: OutputConfig,
    #[serde(rename = "category")]
    pub categories: Vec<CategoryEntry>,
}

/// Inclusive millisecond range a delay is drawn from uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DelayRange {
    #[serde(rename = "min-ms")]
    pub min_ms: u64,
    #[serde(rename = "max-ms")]
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }

    /// Draws a duration from the range
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::random_range(self.min_ms..=self.max_ms))
    }

    /// Sleeps for a sampled duration; a zero range returns immediately
    pub async fn wait(&self) {
        if self.is_zero() {
            return;
        }
        tokio::time::sleep(self.sample()).await;
    }
}

/// How long a navigation waits before the page is considered loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitPolicy {
    /// Wait for the load to finish, then until no resource has completed
    /// for half a second
    #[default]
    NetworkIdle,
    /// Return as soon as the initial document content is available
    InitialContent,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of browsing contexts, which is also the batch size
    pub concurrency: u32,

    /// Maximum attempts per detail page (block or transport failures)
    pub max_attempts: u32,

    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,

    pub wait_policy: WaitPolicy,

    /// Backoff base after a block signature; the wait is `attempt * base`
    pub block_backoff_ms: u64,

    /// Backoff base after a transport failure; the wait is `attempt * base`
    pub transport_backoff_ms: u64,

    pub pre_navigation_delay: DelayRange,
    pub settle_delay: DelayRange,
    pub max_scroll_px: u32,

    /// Pause between batches (fixed part plus jitter)
    pub batch_delay: DelayRange,

    pub listing_settle_delay: DelayRange,

    /// Hard cap on the number of listing pages walked per category
    pub max_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            max_attempts: 3,
            navigation_timeout_ms: 45_000,
            wait_policy: WaitPolicy::NetworkIdle,
            block_backoff_ms: 3_000,
            transport_backoff_ms: 2_000,
            pre_navigation_delay: DelayRange::new(500, 1_500),
            settle_delay: DelayRange::new(800, 1_200),
            max_scroll_px: 500,
            batch_delay: DelayRange::new(800, 1_300),
            listing_settle_delay: DelayRange::new(1_000, 1_500),
            max_pages: 500,
        }
    }
}

impl CrawlerConfig {
    /// Configuration with every artificial delay removed
    pub fn without_delays(mut self) -> Self {
        self.block_backoff_ms = 0;
        self.transport_backoff_ms = 0;
        self.pre_navigation_delay = DelayRange::zero();
        self.settle_delay = DelayRange::zero();
        self.batch_delay = DelayRange::zero();
        self.listing_settle_delay = DelayRange::zero();
        self
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

/// Browser viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Identity presented by every browsing context
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    pub user_agents: Vec<String>,
    pub accept_language: String,
    pub viewports: Vec<Viewport>,

    /// Install the page-load script hiding automation markers
    pub mask_automation: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
            ],
            accept_language: "es-ES,es;q=0.9,en;q=0.8".to_string(),
            viewports: vec![
                Viewport { width: 1920, height: 1080 },
                Viewport { width: 1366, height: 768 },
                Viewport { width: 1440, height: 900 },
                Viewport { width: 1536, height: 864 },
            ],
            mask_automation: true,
        }
    }
}

/// Markup conventions of the directory being harvested
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteProfile {
    /// Container holding the provider's main profile block
    pub primary_container: String,
    pub heading: String,

    /// Anchor selector of provider links on listing pages
    pub detail_link: String,

    /// List item carrying the WhatsApp number
    pub whatsapp_item: String,

    /// List items carrying inline contact details
    pub contact_item: String,

    /// URL segment of provider-type taxonomy links
    pub type_link_segment: String,

    /// Site name that marks a generic (non-provider) page title
    pub site_name: String,
    pub title_separator: char,

    /// Text signatures of a bot-mitigation block page
    pub block_markers: Vec<String>,

    /// Elements present only on a block page
    pub block_selectors: Vec<String>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            primary_container: "div.flex-1".to_string(),
            heading: "h1".to_string(),
            detail_link: "a.duration-200".to_string(),
            whatsapp_item: "li.cwhats-small".to_string(),
            contact_item: "li.custom-inline-list".to_string(),
            type_link_segment: "_t/".to_string(),
            site_name: "proveedores.com".to_string(),
            title_separator: '|',
            block_markers: vec![
                "Error 1015".to_string(),
                "Access denied".to_string(),
                "Ray ID".to_string(),
            ],
            block_selectors: vec![".cf-error-details".to_string()],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving per-category lead files
    pub directory: PathBuf,

    /// JSON status file polled by external observers
    pub status_path: PathBuf,

    /// Suffix of the per-category failed URL list
    pub failed_urls_file: String,

    /// File name of the merged output produced by `--consolidate`
    pub consolidated_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            status_path: PathBuf::from("output/status.json"),
            failed_urls_file: "failed_urls.txt".to_string(),
            consolidated_file: "consolidated.csv".to_string(),
        }
    }
}

/// One configured category
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryEntry {
    pub label: String,
    pub url: String,

    /// Output file name; derived from the label when absent
    #[serde(default)]
    pub file: Option<String>,
}

/// One category to harvest: immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlUnit {
    pub label: String,
    pub listing_url: String,
    pub output: PathBuf,
}

impl CrawlUnit {
    /// Path of the newline-delimited list of URLs that produced no record
    pub fn failed_urls_path(&self, suffix: &str) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("leads");
        self.output.with_file_name(format!("{}_{}", stem, suffix))
    }
}
