//! Configuration module for Lead-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning configured or ad-hoc categories into crawl units.
//!
//! # Example
//!
//! ```no_run
//! use lead_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Contexts per batch: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CategoryEntry, Config, CrawlUnit, CrawlerConfig, DelayRange, OutputConfig, SessionConfig,
    SiteProfile, Viewport, WaitPolicy,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_listing_url};

impl Config {
    /// Builds the crawl unit for a listing URL given on the command line
    pub fn unit_for_url(&self, listing_url: &str, label: Option<&str>) -> CrawlUnit {
        let label = label
            .map(str::to_string)
            .unwrap_or_else(|| crate::url::category_label(listing_url));
        let file = format!("{}.csv", crate::url::file_stem(&label));
        CrawlUnit {
            listing_url: listing_url.to_string(),
            output: self.output.directory.join(file),
            label,
        }
    }

    /// Crawl units for every configured `[[category]]`, in file order
    pub fn configured_units(&self) -> Vec<CrawlUnit> {
        self.categories
            .iter()
            .map(|entry| {
                let file = entry
                    .file
                    .clone()
                    .unwrap_or_else(|| format!("{}.csv", crate::url::file_stem(&entry.label)));
                CrawlUnit {
                    label: entry.label.clone(),
                    listing_url: entry.url.clone(),
                    output: self.output.directory.join(file),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_unit_for_url_derives_label_and_file() {
        let config = Config::default();
        let unit = config.unit_for_url("https://www.proveedores.com/chocolate-y-dulces/", None);

        assert_eq!(unit.label, "Chocolate Y Dulces");
        assert_eq!(unit.output, PathBuf::from("output/chocolate_y_dulces.csv"));
    }

    #[test]
    fn test_unit_for_url_with_label_override() {
        let config = Config::default();
        let unit = config.unit_for_url("https://www.proveedores.com/miel/", Some("Miel Cruda"));

        assert_eq!(unit.label, "Miel Cruda");
        assert_eq!(unit.output, PathBuf::from("output/miel_cruda.csv"));
    }

    #[test]
    fn test_failed_urls_path_uses_output_stem() {
        let config = Config::default();
        let unit = config.unit_for_url("https://www.proveedores.com/frutas/", None);

        assert_eq!(
            unit.failed_urls_path("failed_urls.txt"),
            PathBuf::from("output/frutas_failed_urls.txt")
        );
    }

    #[test]
    fn test_configured_units_keep_order_and_explicit_files() {
        let mut config = Config::default();
        config.categories = vec![
            CategoryEntry {
                label: "Carne".to_string(),
                url: "https://www.proveedores.com/carne/".to_string(),
                file: Some("11_carne.csv".to_string()),
            },
            CategoryEntry {
                label: "Té e Infusiones".to_string(),
                url: "https://www.proveedores.com/te-e-infusiones/".to_string(),
                file: None,
            },
        ];

        let units = config.configured_units();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].output, PathBuf::from("output/11_carne.csv"));
        assert_eq!(units[1].output, PathBuf::from("output/te_e_infusiones.csv"));
    }
}
