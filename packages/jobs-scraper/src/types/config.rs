//! Configuration types for crawling and extraction.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which extraction strategy the crawler uses for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Selector-based extraction from a parsed HTML snapshot of each card.
    #[default]
    Static,
    /// Expand each card (click-to-reveal) and read the detail pane.
    Interactive,
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" | "bulk" | "html" => Ok(ExtractionStrategy::Static),
            "interactive" | "click" => Ok(ExtractionStrategy::Interactive),
            other => Err(format!("unknown extraction strategy: {other}")),
        }
    }
}

/// CSS selectors for the listing index.
///
/// Card-scoped selectors are resolved inside one listing element; detail
/// selectors are page-scoped and only populated after click-to-reveal (or
/// when the card itself carries the detail markup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    pub card: String,
    pub id_attribute: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted_date: String,
    pub url: String,
    pub description: String,
    pub salary: String,
    pub work_type: String,
    pub load_more: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            card: ".job-card-container".into(),
            id_attribute: "data-job-id".into(),
            title: ".job-card-list__title".into(),
            company: ".job-card-container__company-name".into(),
            location: ".job-card-container__metadata-item".into(),
            posted_date: "time".into(),
            url: "a.job-card-list__title".into(),
            description: ".show-more-less-html__markup".into(),
            salary: ".compensation-metadata".into(),
            work_type: ".workplace-type".into(),
            load_more: "button.see-more-jobs".into(),
        }
    }
}

/// Settings for one crawl run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperSettings {
    /// Search endpoint the request is built against.
    pub search_url: String,

    /// Hard cap on records per run, applied on top of the requested target.
    pub max_jobs_per_run: u32,

    /// Listings extracted concurrently within a batch. Default: 1.
    pub max_concurrent_pages: usize,

    /// Listings per batch between progress reports.
    pub batch_size: usize,

    /// Retries after the first failed navigation or pagination attempt.
    pub max_retries: u32,

    /// Base delay before pagination and between retries.
    pub request_delay_ms: u64,

    /// Upper bound of the random delay added to `request_delay_ms`.
    pub jitter_ms: u64,

    /// How long to wait for a page to settle.
    pub settle_timeout_ms: u64,

    /// Pause after click-to-reveal before reading detail fields.
    pub animation_frame_delay_ms: u64,

    pub strategy: ExtractionStrategy,

    #[serde(default)]
    pub selectors: Selectors,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            search_url: "https://www.linkedin.com/jobs/search/".into(),
            max_jobs_per_run: 150,
            max_concurrent_pages: 1,
            batch_size: 25,
            max_retries: 3,
            request_delay_ms: 5_000,
            jitter_ms: 2_000,
            settle_timeout_ms: 10_000,
            animation_frame_delay_ms: 500,
            strategy: ExtractionStrategy::Static,
            selectors: Selectors::default(),
        }
    }
}

impl ScraperSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    pub fn with_strategy(mut self, strategy: ExtractionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_max_jobs_per_run(mut self, max: u32) -> Self {
        self.max_jobs_per_run = max;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.max_concurrent_pages = concurrency.max(1);
        self
    }

    /// Set the pagination delay and its jitter bound.
    pub fn with_delays(mut self, request_delay_ms: u64, jitter_ms: u64) -> Self {
        self.request_delay_ms = request_delay_ms;
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn with_animation_frame_delay_ms(mut self, ms: u64) -> Self {
        self.animation_frame_delay_ms = ms;
        self
    }

    pub fn with_settle_timeout_ms(mut self, ms: u64) -> Self {
        self.settle_timeout_ms = ms;
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn animation_frame_delay(&self) -> Duration {
        Duration::from_millis(self.animation_frame_delay_ms)
    }

    /// Base delay plus a random jitter in `0..=jitter_ms`.
    pub fn paced_delay(&self) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            fastrand::u64(0..=self.jitter_ms)
        };
        Duration::from_millis(self.request_delay_ms + jitter)
    }

    /// Requested target clamped to the per-run cap.
    pub fn effective_target(&self, requested: u32) -> u32 {
        if self.max_jobs_per_run == 0 {
            requested
        } else {
            requested.min(self.max_jobs_per_run)
        }
    }
}
