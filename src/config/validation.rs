use crate::config::types::{Config, CrawlerConfig, DelayRange, OutputConfig, SessionConfig, SiteProfile};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_session_config(&config.session)?;
    validate_site_profile(&config.site)?;
    validate_output_config(&config.output)?;

    for entry in &config.categories {
        if entry.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category for '{}' must have a label",
                entry.url
            )));
        }
        validate_listing_url(&entry.url)?;
    }

    Ok(())
}

/// Validates a category listing URL: absolute, HTTP or HTTPS
pub fn validate_listing_url(listing_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(listing_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing URL '{}': {}", listing_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Listing URL '{}' must use HTTP or HTTPS",
            listing_url
        )));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 16 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 16, got {}",
            config.concurrency
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.navigation_timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be >= 1000ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    for (name, range) in [
        ("pre_navigation_delay", config.pre_navigation_delay),
        ("settle_delay", config.settle_delay),
        ("batch_delay", config.batch_delay),
        ("listing_settle_delay", config.listing_settle_delay),
    ] {
        validate_delay_range(name, range)?;
    }

    Ok(())
}

fn validate_delay_range(name: &str, range: DelayRange) -> Result<(), ConfigError> {
    if range.min_ms > range.max_ms {
        return Err(ConfigError::Validation(format!(
            "{} min-ms ({}) must not exceed max-ms ({})",
            name, range.min_ms, range.max_ms
        )));
    }
    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() || config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents must contain at least one non-empty entry".to_string(),
        ));
    }

    if config.viewports.is_empty() {
        return Err(ConfigError::Validation(
            "viewports must contain at least one entry".to_string(),
        ));
    }

    if let Some(viewport) = config
        .viewports
        .iter()
        .find(|v| v.width < 320 || v.height < 240)
    {
        return Err(ConfigError::Validation(format!(
            "viewport {}x{} is too small",
            viewport.width, viewport.height
        )));
    }

    Ok(())
}

fn validate_site_profile(site: &SiteProfile) -> Result<(), ConfigError> {
    for (field, selector) in [
        ("primary_container", &site.primary_container),
        ("heading", &site.heading),
        ("detail_link", &site.detail_link),
        ("whatsapp_item", &site.whatsapp_item),
        ("contact_item", &site.contact_item),
    ] {
        validate_selector(field, selector)?;
    }

    for selector in &site.block_selectors {
        validate_selector("block_selectors", selector)?;
    }

    if site.block_markers.iter().any(|m| m.is_empty()) {
        return Err(ConfigError::Validation(
            "block_markers cannot contain empty strings".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector(field: &'static str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })?;
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.status_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "status_path cannot be empty".to_string(),
        ));
    }

    if config.failed_urls_file.is_empty() || config.consolidated_file.is_empty() {
        return Err(ConfigError::Validation(
            "failed_urls_file and consolidated_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}
