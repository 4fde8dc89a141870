//! Bot-mitigation block page detection

use crate::config::SiteProfile;
use crate::extract::parse_selector;
use crate::render::RenderedPage;
use crate::ConfigResult;
use scraper::Selector;

/// Recognizes the interstitial a bot-mitigation layer serves instead of
/// the requested page
#[derive(Debug, Clone)]
pub struct BlockDetector {
    markers: Vec<String>,
    selectors: Vec<(String, Selector)>,
}

impl BlockDetector {
    pub fn new(profile: &SiteProfile) -> ConfigResult<Self> {
        let selectors = profile
            .block_selectors
            .iter()
            .map(|source| {
                parse_selector("block_selectors", source).map(|selector| (source.clone(), selector))
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self {
            markers: profile.block_markers.clone(),
            selectors,
        })
    }

    /// Returns the first block signature found on the page
    ///
    /// Text markers are checked before selectors, which need a parsed DOM.
    pub fn signature(&self, page: &RenderedPage) -> Option<String> {
        if let Some(marker) = self.markers.iter().find(|m| page.text.contains(m.as_str())) {
            return Some(marker.clone());
        }
        if self.selectors.is_empty() {
            return None;
        }

        let document = page.document();
        self.selectors
            .iter()
            .find(|(_, selector)| document.select(selector).next().is_some())
            .map(|(source, _)| source.clone())
    }

    pub fn is_blocked(&self, page: &RenderedPage) -> bool {
        self.signature(page).is_some()
    }
}
