//! Browsing context hardening
//!
//! Every context gets a randomly drawn identity (user agent and viewport),
//! the header set of a real top-level navigation and, optionally, a
//! page-load script hiding the usual automation markers. All of it is
//! best-effort: a setting the backend rejects is logged and skipped.

use crate::config::{SessionConfig, Viewport};
use crate::render::RenderContext;

/// Script evaluated before any page script on every document
///
/// Installing it twice on the same document is a no-op, and every property
/// stays configurable so page scripts that redefine them keep working.
pub const STEALTH_SCRIPT: &str = r#"(() => {
  if (window.__leadHarvestMasked) return;
  Object.defineProperty(window, '__leadHarvestMasked', { value: true, configurable: true });
  const mask = (target, name, value) =>
    Object.defineProperty(target, name, { get: () => value, configurable: true });
  mask(navigator, 'webdriver', false);
  mask(navigator, 'plugins', [1, 2, 3, 4, 5]);
  mask(navigator, 'languages', ['es-ES', 'es', 'en-US', 'en']);
  window.chrome = window.chrome || { runtime: {} };
  if (navigator.permissions && navigator.permissions.query) {
    const originalQuery = navigator.permissions.query.bind(navigator.permissions);
    navigator.permissions.query = (parameters) =>
      parameters.name === 'notifications'
        ? Promise.resolve({ state: Notification.permission })
        : originalQuery(parameters);
  }
})();
"#;

/// Headers a browser sends on a user-initiated top-level navigation
const NAVIGATION_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("Accept-Encoding", "gzip, deflate, br"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Cache-Control", "max-age=0"),
];

/// Pools and switches the configurator draws from
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub user_agents: Vec<String>,
    pub accept_language: String,
    pub viewports: Vec<Viewport>,
    pub mask_automation: bool,
}

impl From<&SessionConfig> for SessionPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            user_agents: config.user_agents.clone(),
            accept_language: config.accept_language.clone(),
            viewports: config.viewports.clone(),
            mask_automation: config.mask_automation,
        }
    }
}

impl SessionPolicy {
    /// Full header set: `Accept-Language` followed by the navigation headers
    pub fn headers(&self) -> Vec<(String, String)> {
        std::iter::once(("Accept-Language".to_string(), self.accept_language.clone()))
            .chain(
                NAVIGATION_HEADERS
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string())),
            )
            .collect()
    }
}

/// Identity drawn for one context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: Option<String>,
    pub viewport: Option<Viewport>,
}

fn pick<T: Clone>(pool: &[T]) -> Option<T> {
    if pool.is_empty() {
        return None;
    }
    pool.get(rand::random_range(0..pool.len())).cloned()
}

/// Applies the session policy to a fresh context
///
/// Never fails. Calling it again draws a new identity, re-applies the same
/// headers and registers the mask script once more; the script itself
/// only runs its body once per document.
pub async fn configure<C>(context: &mut C, policy: &SessionPolicy) -> Identity
where
    C: RenderContext + ?Sized,
{
    let user_agent = pick(&policy.user_agents);
    let viewport = pick(&policy.viewports);

    if let Some(ua) = &user_agent {
        if let Err(e) = context.set_user_agent(ua, &policy.accept_language).await {
            tracing::warn!("Failed to set user agent: {}", e);
        }
    }

    if let Err(e) = context.set_extra_headers(&policy.headers()).await {
        tracing::warn!("Failed to set navigation headers: {}", e);
    }

    if let Some(viewport) = viewport {
        if let Err(e) = context.set_viewport(viewport).await {
            tracing::warn!("Failed to set viewport {}x{}: {}", viewport.width, viewport.height, e);
        }
    }

    if policy.mask_automation {
        if let Err(e) = context.add_init_script(STEALTH_SCRIPT).await {
            tracing::warn!("Failed to install automation mask: {}", e);
        }
    }

    tracing::debug!(
        "Context configured (user agent: {}, viewport: {})",
        user_agent.as_deref().unwrap_or("default"),
        viewport
            .map(|v| format!("{}x{}", v.width, v.height))
            .unwrap_or_else(|| "default".to_string())
    );

    Identity {
        user_agent,
        viewport,
    }
}
