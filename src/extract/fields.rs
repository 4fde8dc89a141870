//! Field heuristics
//!
//! Each function looks at one facet of a detail page. They are pure: the
//! same document and text always produce the same value.

use crate::extract::taxonomy::{self, ProviderType};
use crate::extract::CompiledProfile;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
});

static PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+34\s?)?[96]\d{2}\s?\d{2}\s?\d{2}\s?\d{2}").expect("phone pattern")
});

static WHATSAPP_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d{10,15}").expect("whatsapp pattern"));

/// Phone numbers taken from free text per page
const MAX_TEXT_PHONES: usize = 3;

/// A name strategy: one way of finding the provider's name
pub type NameStrategy = fn(&Html, &CompiledProfile) -> Option<String>;

/// Name strategies in the order they are tried
pub const NAME_STRATEGIES: &[NameStrategy] = &[
    name_from_primary_heading,
    name_from_any_heading,
    name_from_title,
];

/// Runs the name strategies in order until one yields a value
pub fn name(document: &Html, profile: &CompiledProfile) -> Option<String> {
    NAME_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(document, profile))
}

fn name_from_primary_heading(document: &Html, profile: &CompiledProfile) -> Option<String> {
    document
        .select(&profile.primary_heading)
        .next()
        .and_then(element_text)
}

fn name_from_any_heading(document: &Html, profile: &CompiledProfile) -> Option<String> {
    document.select(&profile.heading).next().and_then(element_text)
}

/// Title up to the first separator; a title still naming the site is generic
fn name_from_title(document: &Html, profile: &CompiledProfile) -> Option<String> {
    let title = document.select(&profile.title).next().and_then(element_text)?;
    let name = title
        .split(profile.title_separator)
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())?;

    if name.to_lowercase().contains(&profile.site_name) {
        return None;
    }
    Some(name.to_string())
}

/// First e-mail address in the text, else the first list item with an `@`
pub fn email(document: &Html, text: &str, profile: &CompiledProfile) -> Option<String> {
    if let Some(found) = EMAIL.find(text) {
        return Some(found.as_str().to_string());
    }

    document
        .select(&profile.list_item)
        .filter_map(element_text)
        .find(|item| item.contains('@'))
}

/// WhatsApp number from the dedicated list item, else from chat links
pub fn whatsapp(document: &Html, profile: &CompiledProfile) -> Option<String> {
    let from_item = document
        .select(&profile.whatsapp_item)
        .filter_map(element_text)
        .find_map(|item| normalize_phone(&item));
    if from_item.is_some() {
        return from_item;
    }

    document
        .select(&profile.whatsapp_link)
        .filter_map(|link| link.value().attr("href"))
        .find_map(longest_number_run)
}

/// Keeps the digits and a leading `+`; valid numbers have 10 to 15 digits
pub fn normalize_phone(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(10..=15).contains(&digits.len()) {
        return None;
    }

    if raw.starts_with('+') {
        Some(format!("+{}", digits))
    } else {
        Some(digits)
    }
}

fn longest_number_run(target: &str) -> Option<String> {
    WHATSAPP_RUN
        .find_iter(target)
        .map(|m| m.as_str())
        .fold(None, |best: Option<&str>, run| match best {
            Some(current) if current.len() >= run.len() => Some(current),
            _ => Some(run),
        })
        .map(str::to_string)
}

/// Inline contact items plus phone numbers mentioned in the text
///
/// Items mentioning an address or a link are skipped, duplicates keep their
/// first position and the e-mail value never appears in the result.
pub fn other_contacts(
    document: &Html,
    text: &str,
    email: Option<&str>,
    profile: &CompiledProfile,
) -> Vec<String> {
    let items = document
        .select(&profile.contact_item)
        .filter_map(element_text)
        .filter(|item| !item.contains('@') && !item.contains("https"));

    let phones = PHONE
        .find_iter(text)
        .take(MAX_TEXT_PHONES)
        .map(|m| m.as_str().trim().to_string());

    let mut contacts: Vec<String> = Vec::new();
    for contact in items.chain(phones) {
        if Some(contact.as_str()) == email || contacts.contains(&contact) {
            continue;
        }
        contacts.push(contact);
    }
    contacts
}

/// Provider tags from the text keywords and the type-taxonomy links
pub fn provider_types(document: &Html, text: &str, profile: &CompiledProfile) -> Vec<ProviderType> {
    let mut tags = taxonomy::tags_from_text(&text.to_lowercase());
    tags.extend(
        document
            .select(&profile.type_link)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(taxonomy::tag_from_href),
    );
    taxonomy::normalize_tags(&mut tags);
    tags
}

/// Trimmed text content, `None` when blank
fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
