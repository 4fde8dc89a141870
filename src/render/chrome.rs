//! Headless Chrome render backend
//!
//! One Chrome process per backend, one tab per context. `headless_chrome`
//! is a blocking client, so every protocol call runs on the blocking
//! thread pool and the crawler's task only awaits its completion.

use crate::config::{Viewport, WaitPolicy};
use crate::render::{
    NavigateOptions, RenderBackend, RenderContext, RenderError, RenderResult, RenderedPage,
};
use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Launch flags that keep the automation banner and blink markers off
const LAUNCH_ARGS: &[&str] = &[
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-web-security",
    "--disable-features=IsolateOrigins,site-per-process",
    "--disable-blink-features=AutomationControlled",
];

/// Expression returning the page's rendered text
const INNER_TEXT: &str = "document.body ? document.body.innerText : ''";

/// Expression counting the resources the page has finished loading
const RESOURCE_COUNT: &str = "performance.getEntriesByType('resource').length";

/// How long the resource count must stay unchanged to call the network idle
const NETWORK_QUIET: Duration = Duration::from_millis(500);

const NETWORK_POLL: Duration = Duration::from_millis(100);

/// Tracks how long a resource counter has stayed unchanged
#[derive(Debug)]
struct QuietWindow {
    quiet_for: Duration,
    last: Option<(u64, Instant)>,
}

impl QuietWindow {
    fn new(quiet_for: Duration) -> Self {
        Self {
            quiet_for,
            last: None,
        }
    }

    /// Records a reading; true once the count has held for the whole window
    fn observe(&mut self, count: u64, now: Instant) -> bool {
        match self.last {
            Some((last, since)) if last == count => now.duration_since(since) >= self.quiet_for,
            _ => {
                self.last = Some((count, now));
                false
            }
        }
    }
}

/// Polls the resource count until it settles or `deadline` passes
fn wait_for_network_idle(tab: &Tab, deadline: Instant) -> anyhow::Result<()> {
    let mut window = QuietWindow::new(NETWORK_QUIET);
    loop {
        let count = tab
            .evaluate(RESOURCE_COUNT, false)?
            .value
            .and_then(|value| value.as_u64())
            .unwrap_or(0);
        let now = Instant::now();
        if window.observe(count, now) {
            return Ok(());
        }
        if now >= deadline {
            anyhow::bail!("Timeout waiting for the network to go idle");
        }
        std::thread::sleep(NETWORK_POLL);
    }
}

/// How to launch the browser process
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub headless: bool,
    pub sandbox: bool,
    pub chrome_path: Option<PathBuf>,

    /// Chrome is shut down after this long without any protocol event
    pub idle_timeout: Duration,
}

impl ChromeOptions {
    /// Options for the current environment
    ///
    /// The sandbox is disabled inside containers (detected via `/.dockerenv`
    /// or `LEAD_HARVEST_CONTAINER`); `CHROME_PATH` selects the binary.
    pub fn from_env() -> Self {
        let is_container = std::env::var("LEAD_HARVEST_CONTAINER").is_ok()
            || Path::new("/.dockerenv").exists();

        Self {
            headless: true,
            sandbox: !is_container,
            chrome_path: std::env::var("CHROME_PATH").ok().map(PathBuf::from),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Backend owning a single Chrome process
pub struct ChromeBackend {
    browser: Browser,
}

impl ChromeBackend {
    /// Launches Chrome; failure here aborts the run
    pub fn launch(options: &ChromeOptions) -> RenderResult<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(options.headless)
            .sandbox(options.sandbox)
            .path(options.chrome_path.clone())
            .idle_browser_timeout(options.idle_timeout)
            .args(LAUNCH_ARGS.iter().map(|arg| OsStr::new(*arg)).collect())
            .build()
            .map_err(|e| RenderError::Launch(format!("invalid launch options: {}", e)))?;

        let browser = Browser::new(launch_options).map_err(|e| RenderError::Launch(e.to_string()))?;
        tracing::info!("Headless Chrome launched (sandbox: {})", options.sandbox);

        Ok(Self { browser })
    }
}

#[async_trait]
impl RenderBackend for ChromeBackend {
    type Context = ChromeContext;

    async fn new_context(&self) -> RenderResult<ChromeContext> {
        let browser = self.browser.clone();
        let tab = tokio::task::spawn_blocking(move || browser.new_tab())
            .await?
            .map_err(|e| RenderError::Protocol(format!("failed to open tab: {}", e)))?;
        Ok(ChromeContext { tab })
    }
}

/// A Chrome tab
pub struct ChromeContext {
    tab: Arc<Tab>,
}

impl ChromeContext {
    /// Runs a blocking tab operation off the async executor
    async fn with_tab<T, F>(&self, operation: F) -> RenderResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || operation(&tab))
            .await?
            .map_err(|e| RenderError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl RenderContext for ChromeContext {
    async fn set_user_agent(&mut self, user_agent: &str, accept_language: &str) -> RenderResult<()> {
        let user_agent = user_agent.to_string();
        let accept_language = accept_language.to_string();
        self.with_tab(move |tab| {
            tab.set_user_agent(&user_agent, Some(&accept_language), None)?;
            Ok(())
        })
        .await
    }

    async fn set_extra_headers(&mut self, headers: &[(String, String)]) -> RenderResult<()> {
        let headers = headers.to_vec();
        self.with_tab(move |tab| {
            let map: HashMap<&str, &str> = headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            tab.set_extra_http_headers(map)?;
            Ok(())
        })
        .await
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> RenderResult<()> {
        self.with_tab(move |tab| {
            tab.set_bounds(Bounds::Normal {
                left: None,
                top: None,
                width: Some(f64::from(viewport.width)),
                height: Some(f64::from(viewport.height)),
            })?;
            Ok(())
        })
        .await
    }

    async fn add_init_script(&mut self, source: &str) -> RenderResult<()> {
        let source = source.to_string();
        self.with_tab(move |tab| {
            tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
                source,
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            })?;
            Ok(())
        })
        .await
    }

    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> RenderResult<()> {
        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let deadline = Instant::now() + options.timeout;
            tab.set_default_timeout(options.timeout);
            tab.navigate_to(&target)?;
            match options.wait {
                WaitPolicy::NetworkIdle => {
                    tab.wait_until_navigated()?;
                    wait_for_network_idle(&tab, deadline)?;
                }
                WaitPolicy::InitialContent => {
                    tab.wait_for_element("body")?;
                }
            }
            Ok(())
        })
        .await?;

        outcome.map_err(|e| classify_navigation_error(url, &e))
    }

    async fn scroll_by(&mut self, pixels: u32) -> RenderResult<()> {
        self.with_tab(move |tab| {
            tab.evaluate(&format!("window.scrollBy(0, {})", pixels), false)?;
            Ok(())
        })
        .await
    }

    async fn snapshot(&mut self) -> RenderResult<RenderedPage> {
        self.with_tab(|tab| {
            let html = tab.get_content()?;
            let text = tab
                .evaluate(INNER_TEXT, false)?
                .value
                .and_then(|value| value.as_str().map(str::to_string))
                .unwrap_or_default();
            Ok(RenderedPage::new(tab.get_url(), html, text))
        })
        .await
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.with_tab(|tab| {
            tab.close(true)?;
            Ok(())
        })
        .await
    }
}

fn classify_navigation_error(url: &str, error: &anyhow::Error) -> RenderError {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("timed out") {
        RenderError::Timeout {
            url: url.to_string(),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_timeout() {
        let error = anyhow::anyhow!("The event waited for never came: Timeout");
        let classified = classify_navigation_error("https://example.com/", &error);
        assert!(classified.is_timeout());
    }

    #[test]
    fn test_classify_other_failure() {
        let error = anyhow::anyhow!("net::ERR_NAME_NOT_RESOLVED");
        let classified = classify_navigation_error("https://example.com/", &error);
        assert!(matches!(
            classified,
            RenderError::Navigation { ref message, .. } if message.contains("ERR_NAME_NOT_RESOLVED")
        ));
    }

    #[test]
    fn test_quiet_window_needs_a_full_quiet_period() {
        let start = Instant::now();
        let mut window = QuietWindow::new(Duration::from_millis(500));

        assert!(!window.observe(3, start));
        assert!(!window.observe(3, start + Duration::from_millis(400)));
        // a new resource restarts the window
        assert!(!window.observe(4, start + Duration::from_millis(450)));
        assert!(!window.observe(4, start + Duration::from_millis(900)));
        assert!(window.observe(4, start + Duration::from_millis(950)));
    }

    #[test]
    fn test_idle_timeout_is_classified_as_timeout() {
        let error = anyhow::anyhow!("Timeout waiting for the network to go idle");
        assert!(classify_navigation_error("https://example.com/", &error).is_timeout());
    }

    #[test]
    fn test_launch_args_hide_automation() {
        assert!(LAUNCH_ARGS.contains(&"--disable-blink-features=AutomationControlled"));
    }
}
