//! Detail page fetch state machine
//!
//! Each detail URL gets a bounded number of attempts. An attempt is:
//! - a randomized pause before navigating
//! - navigation with the configured wait policy and timeout
//! - a short random scroll and a settle pause
//! - a snapshot, checked for block signatures before anything is extracted
//!
//! Block pages and transport failures are retried with linear backoff;
//! a clean page without a provider name is final.

use crate::config::{CrawlerConfig, DelayRange};
use crate::crawler::block::BlockDetector;
use crate::extract::{Lead, PageExtractor};
use crate::render::{NavigateOptions, RenderContext, RenderedPage};
use std::sync::Arc;
use std::time::Duration;

/// Timing and retry budget of detail fetches
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    pub navigate: NavigateOptions,
    pub pre_navigation_delay: DelayRange,
    pub settle_delay: DelayRange,
    pub max_scroll_px: u32,

    /// Wait after the n-th blocked attempt is `n * block_backoff`
    pub block_backoff: Duration,

    /// Wait after the n-th failed navigation is `n * transport_backoff`
    pub transport_backoff: Duration,
}

impl From<&CrawlerConfig> for FetchPolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            navigate: NavigateOptions::new(config.wait_policy, config.navigation_timeout()),
            pre_navigation_delay: config.pre_navigation_delay,
            settle_delay: config.settle_delay,
            max_scroll_px: config.max_scroll_px,
            block_backoff: Duration::from_millis(config.block_backoff_ms),
            transport_backoff: Duration::from_millis(config.transport_backoff_ms),
        }
    }
}

/// Outcome of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The page yielded a lead
    Extracted(Lead),

    /// The page loaded cleanly but carries no provider name
    Empty,

    /// A block signature was found
    Blocked(String),

    /// Navigation or snapshot failed
    Transient(String),
}

/// Final result of fetching one detail URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success { lead: Lead, attempts: u32 },
    Empty { attempts: u32 },
    Failed { attempts: u32, reason: String },
}

impl FetchResult {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Empty { attempts } | Self::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_lead(self) -> Option<Lead> {
        match self {
            Self::Success { lead, .. } => Some(lead),
            _ => None,
        }
    }
}

/// Fetches detail pages through a browsing context
pub struct Fetcher {
    policy: FetchPolicy,
    detector: BlockDetector,
    extractor: Arc<dyn PageExtractor>,
}

impl Fetcher {
    pub fn new(policy: FetchPolicy, detector: BlockDetector, extractor: Arc<dyn PageExtractor>) -> Self {
        Self {
            policy,
            detector,
            extractor,
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetches `url` and extracts its lead, retrying blocks and transport
    /// failures up to the attempt budget
    ///
    /// Never fails: every problem ends up in the returned [`FetchResult`].
    pub async fn fetch_one<C>(&self, context: &mut C, url: &str, category: &str) -> FetchResult
    where
        C: RenderContext + ?Sized,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (reason, backoff) = match self.attempt(context, url).await {
                AttemptOutcome::Extracted(mut lead) => {
                    lead.category = category.to_string();
                    lead.source_url = url.to_string();
                    tracing::debug!("{} -> {} (attempt {})", url, lead.name, attempt);
                    return FetchResult::Success {
                        lead,
                        attempts: attempt,
                    };
                }
                AttemptOutcome::Empty => {
                    tracing::debug!("No provider name on {}", url);
                    return FetchResult::Empty { attempts: attempt };
                }
                AttemptOutcome::Blocked(signature) => (
                    format!("blocked ({})", signature),
                    self.policy.block_backoff * attempt,
                ),
                AttemptOutcome::Transient(message) => {
                    (message, self.policy.transport_backoff * attempt)
                }
            };

            if attempt >= self.policy.max_attempts {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt, reason);
                return FetchResult::Failed {
                    attempts: attempt,
                    reason,
                };
            }

            tracing::warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt,
                self.policy.max_attempts,
                url,
                reason,
                backoff
            );
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }
    }

    async fn attempt<C>(&self, context: &mut C, url: &str) -> AttemptOutcome
    where
        C: RenderContext + ?Sized,
    {
        self.policy.pre_navigation_delay.wait().await;

        if let Err(e) = context.navigate(url, self.policy.navigate).await {
            return AttemptOutcome::Transient(e.to_string());
        }

        if self.policy.max_scroll_px > 0 {
            let pixels = rand::random_range(0..=self.policy.max_scroll_px);
            if let Err(e) = context.scroll_by(pixels).await {
                tracing::debug!("Scroll failed on {}: {}", url, e);
            }
        }
        self.policy.settle_delay.wait().await;

        match context.snapshot().await {
            Ok(page) => self.classify(&page),
            Err(e) => AttemptOutcome::Transient(e.to_string()),
        }
    }

    /// Block check first; only a clean page reaches the extractor
    pub fn classify(&self, page: &RenderedPage) -> AttemptOutcome {
        if let Some(signature) = self.detector.signature(page) {
            return AttemptOutcome::Blocked(signature);
        }

        match self.extractor.extract(page) {
            Some(lead) if !lead.name.trim().is_empty() => AttemptOutcome::Extracted(lead),
            _ => AttemptOutcome::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, SiteProfile};
    use crate::crawler::testing::{detail_html, Script, ScriptedContext, Step, BLOCK_HTML};
    use crate::extract::Extractor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "https://dir.example/acme-foods/";

    fn fetcher_with(extractor: Arc<dyn PageExtractor>) -> Fetcher {
        let crawler = Config::default().crawler.without_delays();
        Fetcher::new(
            FetchPolicy::from(&crawler),
            BlockDetector::new(&SiteProfile::default()).unwrap(),
            extractor,
        )
    }

    fn fetcher() -> Fetcher {
        fetcher_with(Arc::new(Extractor::new(&SiteProfile::default()).unwrap()))
    }

    /// Counts the pages it is shown
    struct CountingExtractor {
        inner: Extractor,
        calls: AtomicUsize,
    }

    impl PageExtractor for CountingExtractor {
        fn extract(&self, page: &RenderedPage) -> Option<Lead> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.extract(page)
        }
    }

    #[tokio::test]
    async fn test_blocked_twice_then_clean() {
        let script = Script::new();
        script.route(
            URL,
            vec![
                Step::Page(BLOCK_HTML.to_string()),
                Step::Page(BLOCK_HTML.to_string()),
                Step::Page(detail_html("Acme Foods")),
            ],
        );
        let mut context = ScriptedContext::new(script.clone());

        let result = fetcher().fetch_one(&mut context, URL, "Miel").await;

        assert_eq!(result.attempts(), 3);
        let lead = result.into_lead().unwrap();
        assert_eq!(lead.name, "Acme Foods");
        assert_eq!(lead.category, "Miel");
        assert_eq!(lead.source_url, URL);
        assert_eq!(script.navigation_count(URL), 3);
    }

    #[tokio::test]
    async fn test_block_check_runs_before_extraction() {
        let script = Script::new();
        script.route(
            URL,
            vec![Step::Page(BLOCK_HTML.to_string()), Step::Page(detail_html("Acme Foods"))],
        );
        let counting = Arc::new(CountingExtractor {
            inner: Extractor::new(&SiteProfile::default()).unwrap(),
            calls: AtomicUsize::new(0),
        });
        let mut context = ScriptedContext::new(script);

        let result = fetcher_with(counting.clone()).fetch_one(&mut context, URL, "Miel").await;

        assert!(result.is_success());
        assert_eq!(result.attempts(), 2);
        // the block page carries an h1 but never reached the extractor
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_persistent_block_fails_after_budget() {
        let script = Script::new();
        script.route(URL, vec![Step::Page(BLOCK_HTML.to_string())]);
        let mut context = ScriptedContext::new(script.clone());

        let result = fetcher().fetch_one(&mut context, URL, "Miel").await;

        assert!(matches!(
            result,
            FetchResult::Failed { attempts: 3, ref reason } if reason.contains("Error 1015")
        ));
        assert_eq!(script.navigation_count(URL), 3);
    }

    #[tokio::test]
    async fn test_transport_failure_then_success() {
        let script = Script::new();
        script.route(URL, vec![Step::Fail, Step::Page(detail_html("Acme Foods"))]);
        let mut context = ScriptedContext::new(script);

        let result = fetcher().fetch_one(&mut context, URL, "Miel").await;

        assert!(result.is_success());
        assert_eq!(result.attempts(), 2);
    }

    #[tokio::test]
    async fn test_unnamed_page_is_not_retried() {
        let script = Script::new();
        script.page(URL, "<html><body><p>Sin datos</p></body></html>");
        let mut context = ScriptedContext::new(script.clone());

        let result = fetcher().fetch_one(&mut context, URL, "Miel").await;

        assert_eq!(result, FetchResult::Empty { attempts: 1 });
        assert_eq!(script.navigation_count(URL), 1);
    }

    /// Fetcher with no pacing but the default 3s/2s backoff bases
    fn backoff_fetcher() -> Fetcher {
        let mut crawler = Config::default().crawler.without_delays();
        crawler.block_backoff_ms = 3_000;
        crawler.transport_backoff_ms = 2_000;
        Fetcher::new(
            FetchPolicy::from(&crawler),
            BlockDetector::new(&SiteProfile::default()).unwrap(),
            Arc::new(Extractor::new(&SiteProfile::default()).unwrap()),
        )
    }

    // each scripted navigation sleeps 2ms
    const NAVIGATION_SLACK: Duration = Duration::from_millis(50);

    #[tokio::test(start_paused = true)]
    async fn test_block_backoff_grows_linearly() {
        let script = Script::new();
        script.route(
            URL,
            vec![
                Step::Page(BLOCK_HTML.to_string()),
                Step::Page(BLOCK_HTML.to_string()),
                Step::Page(detail_html("Acme Foods")),
            ],
        );
        let mut context = ScriptedContext::new(script.clone());
        let start = tokio::time::Instant::now();

        let result = backoff_fetcher().fetch_one(&mut context, URL, "Miel").await;

        let elapsed = start.elapsed();
        assert!(result.is_success());
        assert_eq!(script.navigation_count(URL), 3);
        // 3s after the first block, 6s after the second
        assert!(elapsed >= Duration::from_secs(9), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(9) + NAVIGATION_SLACK, "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_last_transport_failure() {
        let script = Script::new();
        script.route(URL, vec![Step::Fail]);
        let mut context = ScriptedContext::new(script.clone());
        let start = tokio::time::Instant::now();

        let result = backoff_fetcher().fetch_one(&mut context, URL, "Miel").await;

        let elapsed = start.elapsed();
        assert!(matches!(result, FetchResult::Failed { attempts: 3, .. }));
        assert_eq!(script.navigation_count(URL), 3);
        // 2s then 4s, nothing after the third attempt
        assert!(elapsed >= Duration::from_secs(6), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(6) + NAVIGATION_SLACK, "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page_does_not_wait() {
        let script = Script::new();
        script.page(URL, "<html><body><p>Sin datos</p></body></html>");
        let mut context = ScriptedContext::new(script);
        let start = tokio::time::Instant::now();

        let result = backoff_fetcher().fetch_one(&mut context, URL, "Miel").await;

        assert_eq!(result, FetchResult::Empty { attempts: 1 });
        assert!(start.elapsed() < NAVIGATION_SLACK);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = FetchPolicy::from(&CrawlerConfig::default());
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.block_backoff, Duration::from_secs(3));
        assert_eq!(policy.transport_backoff, Duration::from_secs(2));
        assert_eq!(policy.navigate.timeout, Duration::from_secs(45));
    }
}
