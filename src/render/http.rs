//! Plain HTTP render backend
//!
//! Fetches documents with `reqwest` and derives the visible text from the
//! markup. There is no JavaScript engine: viewports and init scripts are
//! accepted and ignored, scrolling is a no-op. Suitable for directories
//! that render server-side and for tests against mock servers.

use crate::config::Viewport;
use crate::render::{NavigateOptions, RenderContext, RenderError, RenderResult, RenderedPage};
use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT,
};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Backend handing out HTTP contexts that share one connection pool
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    /// Builds the backend's HTTP client
    ///
    /// Redirects are followed like a browser would; per-navigation timeouts
    /// come from [`NavigateOptions`].
    pub fn new() -> RenderResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl crate::render::RenderBackend for HttpBackend {
    type Context = HttpContext;

    async fn new_context(&self) -> RenderResult<HttpContext> {
        Ok(HttpContext {
            client: self.client.clone(),
            headers: HeaderMap::new(),
            current: None,
        })
    }
}

/// A single HTTP "tab": its own identity headers and last loaded document
#[derive(Debug)]
pub struct HttpContext {
    client: Client,
    headers: HeaderMap,
    current: Option<RenderedPage>,
}

impl HttpContext {
    fn insert_header(&mut self, name: &str, value: &str) -> RenderResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| RenderError::Protocol(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| RenderError::Protocol(format!("invalid value for header '{}': {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(())
    }
}

#[async_trait]
impl RenderContext for HttpContext {
    async fn set_user_agent(&mut self, user_agent: &str, accept_language: &str) -> RenderResult<()> {
        self.insert_header(USER_AGENT.as_str(), user_agent)?;
        self.insert_header(ACCEPT_LANGUAGE.as_str(), accept_language)
    }

    async fn set_extra_headers(&mut self, headers: &[(String, String)]) -> RenderResult<()> {
        for (name, value) in headers {
            // the client negotiates compression itself
            if name.eq_ignore_ascii_case(ACCEPT_ENCODING.as_str()) {
                continue;
            }
            self.insert_header(name, value)?;
        }
        Ok(())
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> RenderResult<()> {
        tracing::trace!("HTTP backend ignores viewport {}x{}", viewport.width, viewport.height);
        Ok(())
    }

    async fn add_init_script(&mut self, _source: &str) -> RenderResult<()> {
        tracing::trace!("HTTP backend ignores init scripts");
        Ok(())
    }

    async fn navigate(&mut self, url: &str, options: NavigateOptions) -> RenderResult<()> {
        self.current = None;

        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if is_transport_failure(status) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            // 403/429 bodies are kept so block banners can be detected
            tracing::debug!("{} answered HTTP {}", url, status.as_u16());
        }

        let body = response.text().await.map_err(|e| classify_error(url, e))?;
        self.current = Some(RenderedPage::from_html(final_url, body));
        Ok(())
    }

    async fn scroll_by(&mut self, _pixels: u32) -> RenderResult<()> {
        Ok(())
    }

    async fn snapshot(&mut self) -> RenderResult<RenderedPage> {
        self.current.clone().ok_or(RenderError::NoPage)
    }

    async fn close(&mut self) -> RenderResult<()> {
        self.current = None;
        Ok(())
    }
}

/// Statuses that mean the page itself was not served
fn is_transport_failure(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

fn classify_error(url: &str, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout {
            url: url.to_string(),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
