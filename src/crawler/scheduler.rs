//! Scheduler for fanning detail URLs out over a fixed context pool
//!
//! This module handles:
//! - Splitting the URL list into batches of one URL per context
//! - Running a batch concurrently and waiting for all of it
//! - Persisting and publishing progress after every batch
//! - Pausing between batches

use crate::config::DelayRange;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::output::ResultStore;
use crate::render::RenderContext;
use crate::state::StatusReporter;
use crate::{ConfigError, Result};
use futures::future::join_all;

/// Totals of a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Leads appended to the store
    pub records: usize,

    /// URLs that produced no lead, in scheduling order
    pub failed_urls: Vec<String>,

    pub batches: usize,
}

/// Drives fetches in fixed-size batches
///
/// Each batch holds at most one URL per context, so no context ever serves
/// two fetches at once and at most `contexts.len()` fetches are outstanding.
/// Failed URLs are recorded, never re-queued.
#[derive(Debug, Clone)]
pub struct Scheduler {
    batch_delay: DelayRange,
}

impl Scheduler {
    pub fn new(batch_delay: DelayRange) -> Self {
        Self { batch_delay }
    }

    /// Fetches every URL, flushing `store` after each batch
    ///
    /// Only a failed flush aborts the run.
    pub async fn run<C>(
        &self,
        contexts: &mut [C],
        urls: &[String],
        fetcher: &Fetcher,
        category: &str,
        store: &mut ResultStore,
        status: &mut StatusReporter,
    ) -> Result<BatchSummary>
    where
        C: RenderContext,
    {
        let mut summary = BatchSummary::default();
        if urls.is_empty() {
            return Ok(summary);
        }
        if contexts.is_empty() {
            return Err(ConfigError::Validation(
                "at least one browsing context is required".to_string(),
            )
            .into());
        }

        let batch_size = contexts.len();
        let total_batches = urls.len().div_ceil(batch_size);

        for (index, batch) in urls.chunks(batch_size).enumerate() {
            let fetches = contexts
                .iter_mut()
                .zip(batch)
                .map(|(context, url)| fetcher.fetch_one(context, url, category));
            let results = join_all(fetches).await;

            let mut done = 0;
            let mut failed = 0;
            let mut last_name = None;
            for (url, result) in batch.iter().zip(results) {
                match result {
                    FetchResult::Success { lead, .. } => {
                        tracing::info!("Scraped {}", lead.name);
                        last_name = Some(lead.name.clone());
                        store.append(lead);
                        done += 1;
                    }
                    FetchResult::Empty { .. } => {
                        tracing::debug!("No provider data on {}", url);
                        summary.failed_urls.push(url.clone());
                        failed += 1;
                    }
                    FetchResult::Failed { reason, .. } => {
                        tracing::debug!("Failed {}: {}", url, reason);
                        summary.failed_urls.push(url.clone());
                        failed += 1;
                    }
                }
            }

            store.flush_all()?;
            summary.records += done;
            summary.batches += 1;
            status.batch_finished(done, failed, last_name.as_deref());
            tracing::info!(
                "Batch {}/{}: {} ok, {} failed ({} leads stored)",
                index + 1,
                total_batches,
                done,
                failed,
                store.len()
            );

            if index + 1 < total_batches {
                self.batch_delay.wait().await;
            }
        }

        Ok(summary)
    }
}
