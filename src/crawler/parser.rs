//! Listing page parser
//!
//! This module handles parsing listing pages to extract:
//! - Links to provider detail pages
//! - The number of listing pages the pagination advertises

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static PAGE_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"page=(\d+)").expect("page pattern"));

/// Extracted information from a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Highest page number found in the pagination, at least 1
    pub total_pages: u32,

    /// Detail links in document order (absolute URLs)
    pub links: Vec<String>,
}

/// Parses a listing page
///
/// # Arguments
///
/// * `html` - The serialized listing document
/// * `base_url` - The listing URL, for resolving relative links
/// * `detail_link` - Selector matching provider detail anchors
pub fn parse_listing(html: &str, base_url: &Url, detail_link: &Selector) -> ListingPage {
    let document = Html::parse_document(html);
    ListingPage {
        total_pages: total_pages(&document),
        links: detail_links(&document, base_url, detail_link),
    }
}

/// Highest page number advertised by the pagination
///
/// Both `page=N` in anchor targets and anchors whose whole text is a
/// number count. Pages without any pagination report 1.
pub fn total_pages(document: &Html) -> u32 {
    let Ok(anchor) = Selector::parse("a") else {
        return 1;
    };

    let mut max_page = 1;
    for element in document.select(&anchor) {
        if let Some(href) = element.value().attr("href") {
            for capture in PAGE_PARAM.captures_iter(href) {
                if let Ok(page) = capture[1].parse::<u32>() {
                    max_page = max_page.max(page);
                }
            }
        }

        let text = element.text().collect::<String>();
        let text = text.trim();
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(page) = text.parse::<u32>() {
                max_page = max_page.max(page);
            }
        }
    }

    max_page
}

/// Absolute HTTP(S) targets of every anchor matching `detail_link`
///
/// Not de-duplicated: a provider linked twice appears twice.
pub fn detail_links(document: &Html, base_url: &Url, detail_link: &Selector) -> Vec<String> {
    document
        .select(detail_link)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    // Skip empty hrefs
    if href.is_empty() {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    // Skip fragment-only links (same page anchors)
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://www.proveedores.com/miel/").unwrap()
    }

    fn detail() -> Selector {
        Selector::parse("a.duration-200").unwrap()
    }

    #[test]
    fn test_total_pages_from_hrefs() {
        let html = r#"<body><nav>
            <a href="/miel/?page=2">Siguiente</a>
            <a href="/miel/?page=7">Última</a>
        </nav></body>"#;
        assert_eq!(parse_listing(html, &base_url(), &detail()).total_pages, 7);
    }

    #[test]
    fn test_total_pages_from_link_text() {
        let html = r#"<body><a href="a">1</a><a href="b">2</a><a href="c"> 3 </a><a href="d">4x</a></body>"#;
        assert_eq!(parse_listing(html, &base_url(), &detail()).total_pages, 3);
    }

    #[test]
    fn test_total_pages_defaults_to_one() {
        let html = r#"<body><a href="/contacto">Contacto</a></body>"#;
        assert_eq!(parse_listing(html, &base_url(), &detail()).total_pages, 1);
    }

    #[test]
    fn test_detail_links_resolved() {
        let html = r#"<body>
            <a class="duration-200" href="/acme-foods/">Acme</a>
            <a class="duration-200" href="https://www.proveedores.com/miel-sur/">Miel Sur</a>
            <a class="duration-200" href="javascript:void(0)">Ver</a>
            <a class="duration-200" href="mailto:info@x.es">Mail</a>
            <a class="other" href="/ignored/">Other</a>
            <a class="duration-200" href="/acme-foods/">Acme again</a>
        </body>"#;
        let links = parse_listing(html, &base_url(), &detail()).links;
        assert_eq!(
            links,
            vec![
                "https://www.proveedores.com/acme-foods/",
                "https://www.proveedores.com/miel-sur/",
                "https://www.proveedores.com/acme-foods/",
            ]
        );
    }

    #[test]
    fn test_resolve_link_rules() {
        let base = base_url();
        assert_eq!(resolve_link("", &base), None);
        assert_eq!(resolve_link("#top", &base), None);
        assert_eq!(resolve_link("tel:976000000", &base), None);
        assert_eq!(resolve_link("ftp://x.example/f", &base), None);
        assert_eq!(
            resolve_link("acme/", &base),
            Some("https://www.proveedores.com/miel/acme/".to_string())
        );
    }
}
