//! Run statistics from category reports
//!
//! This module provides functionality for summarizing one or more category
//! runs and displaying the totals.

use crate::crawler::CategoryReport;
use std::time::Duration;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Number of categories that completed
    pub categories: usize,

    /// Leads extracted during this run
    pub leads: usize,

    /// Leads held by the destination files after the run
    pub total_leads: usize,

    /// URLs that produced no record
    pub failures: usize,

    /// URLs skipped because an earlier run already stored them
    pub skipped: usize,

    pub duplicates: usize,

    pub elapsed: Duration,
}

impl RunStatistics {
    /// Sums the reports of the completed categories
    ///
    /// # Arguments
    ///
    /// * `reports` - Reports of the categories that completed
    /// * `elapsed` - Wall time of the whole run
    pub fn from_reports<'a>(
        reports: impl IntoIterator<Item = &'a CategoryReport>,
        elapsed: Duration,
    ) -> Self {
        let mut stats = Self {
            elapsed,
            ..Self::default()
        };

        for report in reports {
            stats.categories += 1;
            stats.leads += report.records;
            stats.total_leads += report.total_leads;
            stats.failures += report.failed_urls.len();
            stats.skipped += report.skipped;
            stats.duplicates += report.duplicates;
        }

        stats
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    /// Extraction rate; zero when no time has passed
    pub fn leads_per_minute(&self) -> f64 {
        let minutes = self.elapsed_minutes();
        if minutes > 0.0 {
            self.leads as f64 / minutes
        } else {
            0.0
        }
    }

    /// Share of fetched URLs that produced a lead, in percent
    pub fn success_rate(&self) -> f64 {
        let fetched = self.leads + self.failures;
        if fetched > 0 {
            (self.leads as f64 / fetched as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Categories completed: {}", stats.categories);
    println!("  New leads: {}", stats.leads);
    println!("  Leads stored: {}", stats.total_leads);
    println!("  Failed URLs: {}", stats.failures);
    println!("  Skipped (already stored): {}", stats.skipped);
    println!("  Duplicate links: {}", stats.duplicates);
    println!();

    println!("Elapsed: {:.1} minutes", stats.elapsed_minutes());
    println!("Rate: {:.1} leads/minute", stats.leads_per_minute());
    println!(
        "Success Rate: {:.1}% ({} / {} URLs produced a lead)",
        stats.success_rate(),
        stats.leads,
        stats.leads + stats.failures
    );
}
