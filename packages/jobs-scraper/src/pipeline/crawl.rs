//! Listing page crawler - paginate, extract, normalize, persist.
//!
//! One crawl advances strictly page by page:
//!
//! ```text
//! navigate ─► settle ─► query listings ─► batch extract ─► report ─► load more
//!    ▲                                                                   │
//!    └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The run stops when the target is reached, when the source is exhausted
//! (no load-more control, or no new listings after loading more), or when
//! navigation fails after the retry budget.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::error::{DriverError, DriverResult, NavigationError, Result, ScraperError};
use crate::extractors::build_extractor;
use crate::pipeline::context::{RunContext, RunStats};
use crate::pipeline::normalize::normalize_listing;
use crate::pipeline::progress::ProgressReporter;
use crate::pipeline::search_request::build_search_request;
use crate::traits::driver::{ConsoleLevel, ElementHandle, Expr, PageDriver};
use crate::traits::extractor::RecordExtractor;
use crate::traits::runtime::Runtime;
use crate::traits::sink::Sink;
use crate::types::config::ScraperSettings;
use crate::types::listing::NormalizedJob;
use crate::types::progress::RunStatus;
use crate::types::search::SearchSpec;

/// Result of one crawl.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Records handed to the sink, in discovery order.
    pub jobs: Vec<NormalizedJob>,
    pub status: RunStatus,
    /// The fatal error when `status` is `Failed`.
    pub error: Option<ScraperError>,
    pub target: u32,
    pub stats: RunStats,
}

/// Drives one page through pagination and extraction.
pub struct ListingPageCrawler<'a> {
    driver: &'a dyn PageDriver,
    sink: &'a dyn Sink,
    /// Overrides the strategy named in the settings.
    extractor: Option<Box<dyn RecordExtractor>>,
    settings: ScraperSettings,
}

impl<'a> ListingPageCrawler<'a> {
    /// Create a crawler. The extraction strategy from the settings is built
    /// when the run starts, so a bad selector fails the run like any other
    /// setup error.
    pub fn new(driver: &'a dyn PageDriver, sink: &'a dyn Sink, settings: ScraperSettings) -> Self {
        Self {
            driver,
            sink,
            extractor: None,
            settings,
        }
    }

    /// Use this extractor instead of the configured strategy.
    pub fn with_extractor(mut self, extractor: Box<dyn RecordExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Crawl until a stop condition fires.
    ///
    /// Always closes the driver and emits exactly one terminal progress
    /// event. Records appended before a failure stay in the outcome.
    pub async fn run<R: Runtime + ?Sized>(&self, spec: &SearchSpec, runtime: &R) -> CrawlOutcome {
        let target = self.settings.effective_target(spec.target);
        if target < spec.target {
            warn!(
                requested = spec.target,
                cap = self.settings.max_jobs_per_run,
                "Requested job count exceeds per-run cap, lowering target"
            );
        }

        let ctx = RunContext::new(target);
        let reporter = ProgressReporter::new(runtime, target);
        let mut jobs = Vec::new();

        let result = self.start(spec, &ctx, &reporter, &mut jobs).await;

        if let Err(e) = self.driver.close().await {
            warn!(driver = self.driver.name(), error = %e, "Failed to close page");
        }

        let (status, error) = match result {
            Ok(()) => (RunStatus::Done, None),
            Err(e) => {
                error!(error = %e, jobs_scraped = ctx.emitted(), "Crawl failed");
                (RunStatus::Failed, Some(e))
            }
        };
        reporter.finish(status, ctx.emitted()).await;

        let stats = ctx.stats();
        info!(
            status = ?status,
            jobs_scraped = stats.jobs_scraped,
            extraction_failures = stats.extraction_failures,
            duration_ms = stats.duration.as_millis() as u64,
            "Crawl finished"
        );

        CrawlOutcome {
            jobs,
            status,
            error,
            target,
            stats,
        }
    }

    async fn start<R: Runtime + ?Sized>(
        &self,
        spec: &SearchSpec,
        ctx: &RunContext,
        reporter: &ProgressReporter<'_, R>,
        jobs: &mut Vec<NormalizedJob>,
    ) -> Result<()> {
        let built;
        let extractor = match &self.extractor {
            Some(extractor) => extractor.as_ref(),
            None => {
                built = build_extractor(&self.settings)?;
                built.as_ref()
            }
        };
        self.crawl(extractor, spec, ctx, reporter, jobs).await
    }

    async fn crawl<R: Runtime + ?Sized>(
        &self,
        extractor: &dyn RecordExtractor,
        spec: &SearchSpec,
        ctx: &RunContext,
        reporter: &ProgressReporter<'_, R>,
        jobs: &mut Vec<NormalizedJob>,
    ) -> Result<()> {
        let request = build_search_request(&self.settings.search_url, spec);
        let url = request
            .to_url()
            .map_err(|source| NavigationError::Exhausted {
                url: self.settings.search_url.clone(),
                attempts: 0,
                source,
            })?;

        info!(
            url = %url,
            target = ctx.target(),
            strategy = extractor.name(),
            driver = self.driver.name(),
            "Starting crawl"
        );

        self.load(&url).await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut page = 0usize;

        loop {
            let listings = self
                .driver
                .query_all(&self.settings.selectors.card)
                .await
                .map_err(NavigationError::Query)?;
            let fresh: Vec<ElementHandle> = listings
                .into_iter()
                .filter(|handle| seen.insert(handle.id().to_string()))
                .collect();

            if fresh.is_empty() {
                if page == 0 {
                    warn!(url = %url, "No results found for search");
                } else {
                    info!(page, "No new listings after loading more, source exhausted");
                }
                return Ok(());
            }
            debug!(page, listings = fresh.len(), "Found new listings");

            for batch in fresh.chunks(self.settings.batch_size.max(1)) {
                if ctx.target_reached() {
                    break;
                }
                self.process_batch(extractor, batch, spec, ctx, jobs).await?;
                reporter.in_progress(ctx.emitted()).await;
            }

            if ctx.target_reached() {
                info!(jobs_scraped = ctx.emitted(), "Target reached");
                return Ok(());
            }

            if !self.load_more().await? {
                info!(page, "No more results to load");
                return Ok(());
            }
            page += 1;
        }
    }

    /// Extract, normalize and persist one batch, in listing order.
    async fn process_batch(
        &self,
        extractor: &dyn RecordExtractor,
        batch: &[ElementHandle],
        spec: &SearchSpec,
        ctx: &RunContext,
        jobs: &mut Vec<NormalizedJob>,
    ) -> Result<()> {
        let concurrency = if extractor.is_isolated() {
            self.settings.max_concurrent_pages.max(1)
        } else {
            1
        };
        let driver = self.driver;

        let mut extracted = stream::iter(batch)
            .map(|handle| async move {
                if ctx.target_reached() {
                    return (handle, None);
                }
                (handle, Some(extractor.extract(driver, handle).await))
            })
            .buffered(concurrency);

        while let Some((handle, result)) = extracted.next().await {
            let raw = match result {
                None => break,
                Some(Ok(raw)) => raw,
                Some(Err(e)) => {
                    warn!(listing = handle.id(), error = %e, "Skipping listing");
                    ctx.record_extraction_failure();
                    continue;
                }
            };

            if !ctx.try_reserve() {
                break;
            }

            let normalized = normalize_listing(raw, spec, ctx.scraped_at());
            ctx.record_fallbacks(normalized.date_fallback, normalized.salary_fallback);

            if let Err(e) = self.sink.append(&normalized.job).await {
                ctx.release();
                error!(sink = self.sink.name(), error = %e, "Failed to persist job");
                return Err(e.into());
            }
            jobs.push(normalized.job);
        }

        Ok(())
    }

    /// Load the search page, retrying transient failures.
    async fn load(&self, url: &str) -> std::result::Result<(), NavigationError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = match self.driver.navigate(url).await {
                Ok(()) => self.settle().await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(e) if self.should_retry(attempt, &e) => {
                    warn!(url = %url, attempt, error = %e, "Navigation failed, retrying");
                    self.pause().await;
                }
                Err(source) => {
                    return Err(NavigationError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    /// Advance to the next result set. Returns false when there is none.
    ///
    /// A control with an `href` is followed; otherwise it is clicked.
    async fn load_more(&self) -> std::result::Result<bool, NavigationError> {
        let controls = self
            .driver
            .query_all(&self.settings.selectors.load_more)
            .await
            .map_err(NavigationError::Query)?;
        let Some(control) = controls.into_iter().next() else {
            return Ok(false);
        };

        let href = self
            .driver
            .evaluate(Some(&control), &Expr::own_attr("href"))
            .await
            .ok()
            .flatten();

        self.pause().await;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = match &href {
                Some(href) => self.driver.navigate(href).await,
                None => self.driver.click(&control).await,
            };
            let result = match result {
                Ok(()) => self.settle().await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => return Ok(true),
                Err(e) if self.should_retry(attempt, &e) => {
                    warn!(attempt, error = %e, "Loading more results failed, retrying");
                    self.pause().await;
                }
                Err(source) => {
                    return Err(NavigationError::Pagination {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    async fn settle(&self) -> DriverResult<()> {
        let result = self
            .driver
            .wait_until_settled(self.settings.settle_timeout())
            .await;

        for message in self.driver.drain_console() {
            match message.level {
                ConsoleLevel::Info => debug!(console = %message.text, "Page console"),
                ConsoleLevel::Error => warn!(console = %message.text, "Page error"),
            }
        }

        result
    }

    fn should_retry(&self, attempt: u32, error: &DriverError) -> bool {
        attempt <= self.settings.max_retries && error.is_transient()
    }

    async fn pause(&self) {
        let delay = self.settings.paced_delay();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Pausing");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemorySink;
    use crate::testing::{MockDriver, MockListing, MockRuntime};
    use crate::types::config::Selectors;
    use crate::types::progress::ProgressStatus;

    fn settings() -> ScraperSettings {
        ScraperSettings::default()
            .with_delays(0, 0)
            .with_animation_frame_delay_ms(0)
            .with_batch_size(2)
    }

    fn spec(target: u32) -> SearchSpec {
        SearchSpec::new(["rust"], "Berlin")
            .unwrap()
            .with_target(target)
            .unwrap()
    }

    fn listings(n: usize) -> Vec<MockListing> {
        (1..=n)
            .map(|i| MockListing::new(i.to_string()).with_title(format!("Job {i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_emits_in_discovery_order() {
        let driver = MockDriver::new(listings(5)).with_page_size(3);
        let sink = MemorySink::new();
        let runtime = MockRuntime::new();

        let crawler = ListingPageCrawler::new(&driver, &sink, settings());
        let outcome = crawler.run(&spec(10), &runtime).await;

        assert_eq!(outcome.status, RunStatus::Done);
        let ids: Vec<_> = sink.jobs().iter().filter_map(|j| j.id.clone()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
        assert_eq!(outcome.jobs, sink.jobs());
        assert!(driver.was_closed());
    }

    #[tokio::test]
    async fn test_progress_after_each_batch() {
        let driver = MockDriver::new(listings(5)).with_page_size(10);
        let sink = MemorySink::new();
        let runtime = MockRuntime::new();

        let crawler = ListingPageCrawler::new(&driver, &sink, settings());
        crawler.run(&spec(10), &runtime).await;

        let events = runtime.events();
        let counts: Vec<_> = events.iter().map(|e| e.jobs_scraped).collect();
        assert_eq!(counts, vec![2, 4, 5, 5]);
        assert_eq!(events.last().unwrap().status, ProgressStatus::Done);
        assert!(events.iter().all(|e| e.target == 10));
    }

    #[tokio::test]
    async fn test_target_cap_lowers_target() {
        let driver = MockDriver::new(listings(10)).with_page_size(10);
        let sink = MemorySink::new();
        let runtime = MockRuntime::new();

        let crawler =
            ListingPageCrawler::new(&driver, &sink, settings().with_max_jobs_per_run(3));
        let outcome = crawler.run(&spec(100), &runtime).await;

        assert_eq!(outcome.target, 3);
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn test_no_results_is_done() {
        let driver = MockDriver::new(Vec::new());
        let sink = MemorySink::new();
        let runtime = MockRuntime::new();

        let crawler = ListingPageCrawler::new(&driver, &sink, settings());
        let outcome = crawler.run(&spec(10), &runtime).await;

        assert_eq!(outcome.status, RunStatus::Done);
        assert!(outcome.jobs.is_empty());
        assert_eq!(runtime.events().len(), 1);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let driver = MockDriver::new(listings(3))
            .with_page_size(1)
            .without_load_more_href()
            .rejecting_load_more();
        let sink = MemorySink::new();
        let runtime = MockRuntime::new();

        let crawler = ListingPageCrawler::new(&driver, &sink, settings());
        let outcome = crawler.run(&spec(10), &runtime).await;

        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(matches!(
            outcome.error,
            Some(ScraperError::Navigation(NavigationError::Pagination { attempts: 1, .. }))
        ));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_extraction_keeps_order_and_target() {
        let driver = MockDriver::new(listings(12)).with_page_size(12);
        let sink = MemorySink::new();
        let runtime = MockRuntime::new();

        let crawler = ListingPageCrawler::new(
            &driver,
            &sink,
            settings().with_batch_size(6).with_concurrency(4),
        );
        let outcome = crawler.run(&spec(7), &runtime).await;

        let ids: Vec<_> = outcome.jobs.iter().filter_map(|j| j.id.clone()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(sink.len(), 7);
    }

    #[tokio::test]
    async fn test_extractor_setup_failure_closes_driver() {
        let driver = MockDriver::new(listings(3));
        let sink = MemorySink::new();
        let runtime = MockRuntime::new();

        let selectors = Selectors {
            salary: "[[".into(),
            ..Selectors::default()
        };
        let crawler = ListingPageCrawler::new(&driver, &sink, settings().with_selectors(selectors));
        let outcome = crawler.run(&spec(10), &runtime).await;

        assert_eq!(outcome.status, RunStatus::Failed);
        assert!(matches!(
            outcome.error,
            Some(ScraperError::Driver(DriverError::InvalidSelector(_)))
        ));
        assert!(driver.was_closed());
        assert!(driver.navigations().is_empty());

        let events = runtime.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ProgressStatus::Error);
    }
}
