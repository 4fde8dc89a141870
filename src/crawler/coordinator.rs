//! Category run coordinator
//!
//! The coordinator ties together all harvesting components:
//! - Loads prior output so an interrupted category resumes
//! - Walks the listing pages in a dedicated context
//! - Drops duplicate and already stored URLs
//! - Fans the rest out over the context pool through the scheduler
//! - Persists the final snapshot and the failed URL list
//! - Keeps the run status current from start to finish

use crate::config::{validate, validate_listing_url, Config, CrawlUnit};
use crate::crawler::block::BlockDetector;
use crate::crawler::enumerator::{enumerate, ListingPolicy};
use crate::crawler::fetcher::{FetchPolicy, Fetcher};
use crate::crawler::scheduler::Scheduler;
use crate::extract::Extractor;
use crate::output::{write_failed_urls, CsvStore, ResultStore, TabularStore};
use crate::render::{RenderBackend, RenderContext};
use crate::session::{configure, SessionPolicy};
use crate::state::StatusReporter;
use crate::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a finished category run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub label: String,
    pub output: PathBuf,

    /// Detail links found on the listing pages, duplicates included
    pub urls_found: usize,

    pub duplicates: usize,

    /// URLs not fetched because the destination already held them
    pub skipped: usize,

    /// Leads extracted in this run
    pub records: usize,

    pub failed_urls: Vec<String>,

    /// Leads in the destination after the run
    pub total_leads: usize,

    pub elapsed: Duration,
}

/// Runs categories against one render backend
pub struct Harvester<B: RenderBackend> {
    config: Config,
    backend: B,
    store: Arc<dyn TabularStore>,
    fetcher: Fetcher,
    listing: ListingPolicy,
    session: SessionPolicy,
    scheduler: Scheduler,
    fresh: bool,
}

impl<B: RenderBackend> Harvester<B> {
    /// Creates a harvester from a validated configuration
    ///
    /// Every selector of the site profile is compiled here, so a bad
    /// profile fails before any page is requested.
    pub fn new(config: Config, backend: B) -> Result<Self> {
        validate(&config)?;

        let extractor = Extractor::new(&config.site)?;
        let detector = BlockDetector::new(&config.site)?;
        let fetcher = Fetcher::new(
            FetchPolicy::from(&config.crawler),
            detector,
            Arc::new(extractor),
        );

        Ok(Self {
            listing: ListingPolicy::new(&config)?,
            session: SessionPolicy::from(&config.session),
            scheduler: Scheduler::new(config.crawler.batch_delay),
            store: Arc::new(CsvStore),
            fresh: false,
            fetcher,
            backend,
            config,
        })
    }

    /// Replaces the tabular format results are read from and written to
    pub fn with_store(mut self, store: Arc<dyn TabularStore>) -> Self {
        self.store = store;
        self
    }

    /// Ignore prior results instead of resuming from them
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Harvests one category
    ///
    /// The status ends in `completed` on success and in `error` otherwise.
    pub async fn run_category(
        &self,
        unit: &CrawlUnit,
        status: &mut StatusReporter,
    ) -> Result<CategoryReport> {
        status.reset(&unit.label);

        match self.harvest(unit, status).await {
            Ok(report) => {
                status.complete();
                tracing::info!(
                    "{}: {} new leads, {} failed, {} skipped, {} total in {}",
                    report.label,
                    report.records,
                    report.failed_urls.len(),
                    report.skipped,
                    report.total_leads,
                    report.output.display()
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Category {} failed: {}", unit.label, e);
                status.fail(&e.to_string());
                Err(e)
            }
        }
    }

    /// Harvests every unit in order, carrying on past failed categories
    pub async fn run_all(
        &self,
        units: &[CrawlUnit],
        status: &mut StatusReporter,
    ) -> Vec<(CrawlUnit, Result<CategoryReport>)> {
        let mut results = Vec::with_capacity(units.len());
        for (index, unit) in units.iter().enumerate() {
            tracing::info!("Category {}/{}: {}", index + 1, units.len(), unit.label);
            let result = self.run_category(unit, status).await;
            results.push((unit.clone(), result));
        }
        results
    }

    async fn harvest(&self, unit: &CrawlUnit, status: &mut StatusReporter) -> Result<CategoryReport> {
        let start_time = Instant::now();
        validate_listing_url(&unit.listing_url)?;

        let mut store = if self.fresh {
            ResultStore::new(&unit.output, Arc::clone(&self.store))
        } else {
            ResultStore::load(&unit.output, Arc::clone(&self.store))?
        };
        if !store.is_empty() {
            tracing::info!(
                "Resuming {} with {} leads already in {}",
                unit.label,
                store.len(),
                unit.output.display()
            );
        }

        let mut listing_context = self.open_context().await?;
        let enumeration = enumerate(&mut listing_context, unit, &self.listing, status).await;
        close_context(&mut listing_context).await;
        let enumeration = enumeration?;

        let urls_found = enumeration.urls.len();
        let mut seen = HashSet::with_capacity(urls_found);
        let unique: Vec<String> = enumeration
            .urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();
        let duplicates = urls_found - unique.len();

        let pending: Vec<String> = unique
            .into_iter()
            .filter(|url| !store.contains(url))
            .collect();
        let skipped = urls_found - duplicates - pending.len();

        tracing::info!(
            "{} provider URLs ({} duplicates, {} already stored), {} to fetch",
            urls_found,
            duplicates,
            skipped,
            pending.len()
        );
        status.begin_scraping(pending.len());

        let pool_size = self.config.crawler.concurrency as usize;
        let mut contexts = Vec::with_capacity(pool_size);
        if !pending.is_empty() {
            for _ in 0..pool_size {
                match self.open_context().await {
                    Ok(context) => contexts.push(context),
                    Err(e) => {
                        close_all(&mut contexts).await;
                        return Err(e);
                    }
                }
            }
        }

        let summary = self
            .scheduler
            .run(
                &mut contexts,
                &pending,
                &self.fetcher,
                &unit.label,
                &mut store,
                status,
            )
            .await;
        close_all(&mut contexts).await;
        let summary = summary?;

        store.flush_all()?;
        write_failed_urls(
            &unit.failed_urls_path(&self.config.output.failed_urls_file),
            &summary.failed_urls,
        )?;

        Ok(CategoryReport {
            label: unit.label.clone(),
            output: unit.output.clone(),
            urls_found,
            duplicates,
            skipped,
            records: summary.records,
            failed_urls: summary.failed_urls,
            total_leads: store.len(),
            elapsed: start_time.elapsed(),
        })
    }

    async fn open_context(&self) -> Result<B::Context> {
        let mut context = self.backend.new_context().await?;
        configure(&mut context, &self.session).await;
        Ok(context)
    }
}

/// Builds a harvester and runs a single category with it
pub async fn run_category<B: RenderBackend>(
    config: Config,
    backend: B,
    unit: &CrawlUnit,
    status: &mut StatusReporter,
) -> Result<CategoryReport> {
    match Harvester::new(config, backend) {
        Ok(harvester) => harvester.run_category(unit, status).await,
        Err(e) => {
            status.reset(&unit.label);
            status.fail(&e.to_string());
            Err(e)
        }
    }
}

async fn close_context<C: RenderContext>(context: &mut C) {
    if let Err(e) = context.close().await {
        tracing::debug!("Failed to close context: {}", e);
    }
}

async fn close_all<C: RenderContext>(contexts: &mut [C]) {
    for context in contexts.iter_mut() {
        close_context(context).await;
    }
}
