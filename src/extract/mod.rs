//! Lead extraction from rendered detail pages
//!
//! The [`Extractor`] turns a [`RenderedPage`] into a [`Lead`] using the
//! markup conventions of a [`SiteProfile`]. A page without a recognizable
//! provider name yields nothing; every other field is optional.

mod fields;
pub mod regions;
pub mod taxonomy;

pub use fields::{normalize_phone, NameStrategy, NAME_STRATEGIES};
pub use taxonomy::ProviderType;

use crate::config::SiteProfile;
use crate::render::RenderedPage;
use crate::{ConfigError, ConfigResult};
use scraper::Selector;
use serde::{Deserialize, Serialize};

/// One extracted provider record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Never empty
    pub name: String,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub other_contacts: Vec<String>,
    pub region: Option<String>,

    /// Sorted in taxonomy order, without duplicates
    pub provider_types: Vec<ProviderType>,
    pub category: String,

    /// Detail page the lead was extracted from; unique within a store
    pub source_url: String,
}

impl Lead {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            whatsapp: None,
            other_contacts: Vec::new(),
            region: None,
            provider_types: Vec::new(),
            category: String::new(),
            source_url: source_url.into(),
        }
    }

    /// Contacts in their flat form, joined with `" | "`
    pub fn joined_contacts(&self) -> String {
        self.other_contacts.join(" | ")
    }

    /// Provider types in their flat form, joined with `", "`
    pub fn joined_provider_types(&self) -> String {
        taxonomy::join_tags(&self.provider_types)
    }
}

/// Turns a rendered page into a lead
pub trait PageExtractor: Send + Sync {
    /// Returns `None` when the page carries no provider name
    fn extract(&self, page: &RenderedPage) -> Option<Lead>;
}

/// Selectors and markers of a [`SiteProfile`], parsed once
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub(crate) primary_heading: Selector,
    pub(crate) heading: Selector,
    pub(crate) title: Selector,
    pub(crate) list_item: Selector,
    pub(crate) whatsapp_item: Selector,
    pub(crate) whatsapp_link: Selector,
    pub(crate) contact_item: Selector,
    pub(crate) type_link: Selector,

    /// Lower-cased
    pub(crate) site_name: String,
    pub(crate) title_separator: char,
}

impl CompiledProfile {
    pub fn new(profile: &SiteProfile) -> ConfigResult<Self> {
        Ok(Self {
            primary_heading: parse_selector(
                "primary_container",
                &format!("{} {}", profile.primary_container, profile.heading),
            )?,
            heading: parse_selector("heading", &profile.heading)?,
            title: parse_selector("title", "title")?,
            list_item: parse_selector("list_item", "li")?,
            whatsapp_item: parse_selector("whatsapp_item", &profile.whatsapp_item)?,
            whatsapp_link: parse_selector(
                "whatsapp_link",
                r#"a[href*="wa.me"], a[href*="whatsapp"]"#,
            )?,
            contact_item: parse_selector("contact_item", &profile.contact_item)?,
            type_link: parse_selector(
                "type_link_segment",
                &format!(r#"a[href*="{}"]"#, profile.type_link_segment),
            )?,
            site_name: profile.site_name.to_lowercase(),
            title_separator: profile.title_separator,
        })
    }
}

pub(crate) fn parse_selector(field: &'static str, selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}

/// Heuristic extractor for provider detail pages
#[derive(Debug, Clone)]
pub struct Extractor {
    profile: CompiledProfile,
}

impl Extractor {
    pub fn new(profile: &SiteProfile) -> ConfigResult<Self> {
        Ok(Self {
            profile: CompiledProfile::new(profile)?,
        })
    }
}

impl PageExtractor for Extractor {
    fn extract(&self, page: &RenderedPage) -> Option<Lead> {
        let document = page.document();
        let name = fields::name(&document, &self.profile)?;

        let email = fields::email(&document, &page.text, &self.profile);
        let whatsapp = fields::whatsapp(&document, &self.profile);
        let other_contacts =
            fields::other_contacts(&document, &page.text, email.as_deref(), &self.profile);
        let region = regions::find_region(&page.text).map(str::to_string);
        let provider_types = fields::provider_types(&document, &page.text, &self.profile);

        Some(Lead {
            name,
            email,
            whatsapp,
            other_contacts,
            region,
            provider_types,
            category: String::new(),
            source_url: page.url.clone(),
        })
    }
}
