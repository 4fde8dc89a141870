//! Listing walk
//!
//! Page 1 of a category tells how many listing pages exist; every page
//! contributes its detail links in document order.

use crate::config::{Config, CrawlUnit, DelayRange};
use crate::crawler::parser::{parse_listing, ListingPage};
use crate::extract::parse_selector;
use crate::render::{NavigateOptions, RenderContext, RenderResult};
use crate::state::StatusReporter;
use crate::url::page_url;
use crate::{ConfigResult, HarvestError, Result};
use scraper::Selector;
use url::Url;

/// How listing pages are loaded and read
#[derive(Debug, Clone)]
pub struct ListingPolicy {
    pub navigate: NavigateOptions,
    pub settle_delay: DelayRange,
    pub max_pages: u32,
    pub detail_link: Selector,
}

impl ListingPolicy {
    pub fn new(config: &Config) -> ConfigResult<Self> {
        Ok(Self {
            navigate: NavigateOptions::new(
                config.crawler.wait_policy,
                config.crawler.navigation_timeout(),
            ),
            settle_delay: config.crawler.listing_settle_delay,
            max_pages: config.crawler.max_pages,
            detail_link: parse_selector("detail_link", &config.site.detail_link)?,
        })
    }
}

/// Detail URLs of one category, in listing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    pub urls: Vec<String>,

    /// Pages the pagination advertised, capped by the policy
    pub total_pages: u32,

    /// Pages actually walked
    pub pages_walked: u32,
}

/// Walks the listing pages of `unit` and collects their detail links
///
/// Fails only when the first listing page cannot be loaded. A later page
/// that fails to load, or that has no detail links, ends the walk.
pub async fn enumerate<C>(
    context: &mut C,
    unit: &CrawlUnit,
    policy: &ListingPolicy,
    status: &mut StatusReporter,
) -> Result<Enumeration>
where
    C: RenderContext + ?Sized,
{
    tracing::info!("Collecting provider URLs for {} from {}", unit.label, unit.listing_url);

    let first = load_listing(context, &unit.listing_url, policy)
        .await
        .map_err(|e| HarvestError::Listing {
            url: unit.listing_url.clone(),
            message: e.to_string(),
        })?;

    let total_pages = first.total_pages.min(policy.max_pages).max(1);
    let mut urls = first.links;
    let mut pages_walked = 1;
    tracing::info!("Page 1/{}: {} provider links", total_pages, urls.len());
    status.listing_page(1, total_pages, urls.len());

    if urls.is_empty() {
        tracing::warn!("No provider links on the first listing page of {}", unit.label);
    } else {
        for page in 2..=total_pages {
            let url = page_url(&unit.listing_url, page)?;
            let listing = match load_listing(context, &url, policy).await {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::warn!("Listing page {} failed, stopping the walk: {}", page, e);
                    break;
                }
            };

            if listing.links.is_empty() {
                tracing::info!("Page {}/{} has no provider links, stopping", page, total_pages);
                break;
            }

            pages_walked = page;
            urls.extend(listing.links);
            tracing::info!("Page {}/{}: {} URLs so far", page, total_pages, urls.len());
            status.listing_page(page, total_pages, urls.len());
        }
    }

    Ok(Enumeration {
        urls,
        total_pages,
        pages_walked,
    })
}

async fn load_listing<C>(context: &mut C, url: &str, policy: &ListingPolicy) -> RenderResult<ListingPage>
where
    C: RenderContext + ?Sized,
{
    context.navigate(url, policy.navigate).await?;
    policy.settle_delay.wait().await;
    let page = context.snapshot().await?;

    let base = Url::parse(&page.url)
        .or_else(|_| Url::parse(url))
        .map_err(|e| crate::render::RenderError::Navigation {
            url: url.to_string(),
            message: format!("unusable page URL: {}", e),
        })?;
    Ok(parse_listing(&page.html, &base, &policy.detail_link))
}
