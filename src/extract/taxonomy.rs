use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Business role a provider advertises
///
/// Variants are declared in taxonomy order; sorting a tag list with `Ord`
/// yields the order tags are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    Distributor,
    Dropshipping,
    Manufacturer,
    Exporter,
    Importer,
}

impl ProviderType {
    pub const ALL: [ProviderType; 5] = [
        ProviderType::Distributor,
        ProviderType::Dropshipping,
        ProviderType::Manufacturer,
        ProviderType::Exporter,
        ProviderType::Importer,
    ];

    /// Label written to the output
    pub fn label(self) -> &'static str {
        match self {
            ProviderType::Distributor => "Distribuidores mayoristas",
            ProviderType::Dropshipping => "Dropshipping",
            ProviderType::Manufacturer => "Fabricantes",
            ProviderType::Exporter => "Exportadores",
            ProviderType::Importer => "Importadores",
        }
    }

    /// Slug used by the directory's type-taxonomy links
    pub fn slug(self) -> &'static str {
        match self {
            ProviderType::Distributor => "distribuidores-mayoristas",
            ProviderType::Dropshipping => "dropshipping",
            ProviderType::Manufacturer => "fabricantes",
            ProviderType::Exporter => "exportadores",
            ProviderType::Importer => "importadores",
        }
    }

    /// Lower-case words whose presence in the page text implies the tag
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            ProviderType::Distributor => &["distribuidor", "mayorista"],
            ProviderType::Dropshipping => &["dropshipping"],
            ProviderType::Manufacturer => &["fabricante", "fabricamos", "elaboramos"],
            ProviderType::Exporter => &["exportador", "exportamos"],
            ProviderType::Importer => &["importador", "importamos"],
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ProviderType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s) || t.slug() == s)
            .ok_or_else(|| format!("unknown provider type '{}'", s))
    }
}

/// Tags implied by the page text
pub fn tags_from_text(lowered_text: &str) -> Vec<ProviderType> {
    ProviderType::ALL
        .into_iter()
        .filter(|t| t.keywords().iter().any(|k| lowered_text.contains(k)))
        .collect()
}

/// Tag named by a type-taxonomy link target, if any
pub fn tag_from_href(href: &str) -> Option<ProviderType> {
    let href = href.to_lowercase();
    ProviderType::ALL
        .into_iter()
        .find(|t| href.contains(t.slug()))
}

/// Sorts tags into taxonomy order and drops duplicates
pub fn normalize_tags(tags: &mut Vec<ProviderType>) {
    tags.sort();
    tags.dedup();
}

/// Flat representation: labels joined with `", "`
pub fn join_tags(tags: &[ProviderType]) -> String {
    tags.iter().map(|t| t.label()).collect::<Vec<_>>().join(", ")
}

/// Parses the flat representation back, ignoring unknown labels
pub fn split_tags(joined: &str) -> Vec<ProviderType> {
    let mut tags: Vec<ProviderType> = joined
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    normalize_tags(&mut tags);
    tags
}
