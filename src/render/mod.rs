//! Render capability consumed by the crawler
//!
//! The crawler never talks to a browser directly. It asks a
//! [`RenderBackend`] for isolated [`RenderContext`]s, navigates them, and
//! takes [`RenderedPage`] snapshots that the extractor and the block check
//! query. Two backends ship with the crate:
//!
//! - [`chrome::ChromeBackend`], a headless Chrome with one tab per context
//! - [`http::HttpBackend`], a plain HTTP client without JavaScript

pub mod chrome;
pub mod http;
mod page;

pub use page::{visible_text, RenderedPage};

use crate::config::{Viewport, WaitPolicy};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a render backend
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} timed out")]
    Timeout { url: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Browser protocol error: {0}")]
    Protocol(String),

    #[error("No page has been loaded in this context")]
    NoPage,

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Background browser task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl RenderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Options applied to a single navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigateOptions {
    pub wait: WaitPolicy,
    pub timeout: Duration,
}

impl NavigateOptions {
    pub fn new(wait: WaitPolicy, timeout: Duration) -> Self {
        Self { wait, timeout }
    }
}

impl Default for NavigateOptions {
    fn default() -> Self {
        Self::new(WaitPolicy::NetworkIdle, Duration::from_secs(45))
    }
}

/// A source of browsing contexts
///
/// Creating the backend is the only step allowed to fail the whole run;
/// everything a context does afterwards is contained per item.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    type Context: RenderContext;

    /// Opens a fresh, isolated browsing context
    async fn new_context(&self) -> RenderResult<Self::Context>;
}

/// One isolated browsing session
///
/// Methods take `&mut self`: a context serves exactly one navigation at a
/// time.
#[async_trait]
pub trait RenderContext: Send {
    /// Sets the identity string and the `Accept-Language` it advertises
    async fn set_user_agent(&mut self, user_agent: &str, accept_language: &str)
        -> RenderResult<()>;

    /// Adds headers sent with every subsequent request
    async fn set_extra_headers(&mut self, headers: &[(String, String)]) -> RenderResult<()>;

    async fn set_viewport(&mut self, viewport: Viewport) -> RenderResult<()>;

    /// Registers a script evaluated before any page script on every load
    async fn add_init_script(&mut self, source: &str) -> RenderResult<()>;

    /// Loads `url`, waiting according to `options`
    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> RenderResult<()>;

    /// Scrolls the current page down by `pixels`
    async fn scroll_by(&mut self, pixels: u32) -> RenderResult<()>;

    /// Captures the current document and its visible text
    async fn snapshot(&mut self) -> RenderResult<RenderedPage>;

    async fn close(&mut self) -> RenderResult<()>;
}
