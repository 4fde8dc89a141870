//! Tabular file access
//!
//! Leads are stored one row per lead with a fixed column set. The
//! [`TabularStore`] trait is the seam to the file format; [`CsvStore`] is
//! the shipped implementation.

use crate::extract::{taxonomy, Lead};
use crate::output::OutputResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Column headers, in file order
pub const COLUMNS: [&str; 8] = [
    "Name",
    "Email",
    "WhatsApp",
    "Contacts",
    "Region",
    "ProviderType",
    "Category",
    "URL",
];

/// Display width of each column, for formats that support it
pub const COLUMN_WIDTHS: [u16; 8] = [40, 35, 18, 30, 20, 45, 20, 55];

/// One lead in its flat, stored form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "WhatsApp", default)]
    pub whatsapp: String,
    #[serde(rename = "Contacts", default)]
    pub contacts: String,
    #[serde(rename = "Region", default)]
    pub region: String,
    #[serde(rename = "ProviderType", default)]
    pub provider_type: String,
    #[serde(rename = "Category", default)]
    pub category: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl From<&Lead> for LeadRow {
    fn from(lead: &Lead) -> Self {
        Self {
            name: lead.name.clone(),
            email: lead.email.clone().unwrap_or_default(),
            whatsapp: lead.whatsapp.clone().unwrap_or_default(),
            contacts: lead.joined_contacts(),
            region: lead.region.clone().unwrap_or_default(),
            provider_type: lead.joined_provider_types(),
            category: lead.category.clone(),
            url: lead.source_url.clone(),
        }
    }
}

impl LeadRow {
    /// Parses the row back into a lead; rows without a name or URL are dropped
    pub fn into_lead(self) -> Option<Lead> {
        let name = self.name.trim().to_string();
        let url = self.url.trim().to_string();
        if name.is_empty() || url.is_empty() {
            return None;
        }

        Some(Lead {
            name,
            email: non_empty(self.email),
            whatsapp: non_empty(self.whatsapp),
            other_contacts: self
                .contacts
                .split(" | ")
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            region: non_empty(self.region),
            provider_types: taxonomy::split_tags(&self.provider_type),
            category: self.category,
            source_url: url,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Reads and writes whole sheets of lead rows
pub trait TabularStore: Send + Sync {
    fn read_sheet(&self, path: &Path) -> OutputResult<Vec<LeadRow>>;

    /// Replaces the file at `path` with a header row followed by `rows`
    fn write_sheet(&self, path: &Path, rows: &[LeadRow], column_widths: &[u16]) -> OutputResult<()>;
}

/// Comma-separated values with a header row
///
/// CSV has no notion of column width, so widths are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvStore;

impl TabularStore for CsvStore {
    fn read_sheet(&self, path: &Path) -> OutputResult<Vec<LeadRow>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    fn write_sheet(&self, path: &Path, rows: &[LeadRow], _column_widths: &[u16]) -> OutputResult<()> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
