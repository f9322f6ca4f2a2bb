//! Job Listing Scraper
//!
//! Crawls a paginated job-listing search, extracts the fields of every
//! listing card, normalizes dates, salaries and work types into a canonical
//! record, and hands each record to a sink while reporting progress.
//!
//! # Usage
//!
//! ```rust,ignore
//! use jobs_scraper::{run_actor, HttpDriver, LocalRuntime, JsonLinesSink, ScraperSettings};
//!
//! let runtime = LocalRuntime::new("storage/output.json").with_input("input.json");
//! let sink = JsonLinesSink::create("storage/dataset.jsonl").await?;
//! let driver = HttpDriver::new()?;
//!
//! let output = run_actor(&runtime, &driver, &sink, ScraperSettings::default()).await?;
//! println!("{} jobs", output.metadata.jobs_scraped);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (PageDriver, RecordExtractor, Sink, Runtime)
//! - [`types`] - Search, listing, progress and configuration types
//! - [`pipeline`] - Search request, crawl loop, normalization, progress
//! - [`extractors`] - Static HTML and click-to-reveal extraction strategies
//! - [`drivers`] - Page driver implementations (HttpDriver)
//! - [`stores`] - Sink and runtime implementations (memory, JSON lines, Apify)
//! - [`testing`] - Mock implementations for testing

pub mod config;
pub mod dom;
pub mod drivers;
pub mod error;
pub mod extractors;
pub mod input;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use config::Config;
pub use error::{
    DriverError, ExtractionError, NavigationError, Result, RuntimeError, ScraperError, SinkError,
    ValidationError,
};
pub use input::parse_run_input;
pub use traits::{
    driver::{ConsoleLevel, ConsoleMessage, ElementHandle, Expr, PageDriver},
    extractor::RecordExtractor,
    runtime::Runtime,
    sink::Sink,
};
pub use types::{
    config::{ExtractionStrategy, ScraperSettings, Selectors},
    listing::{NormalizedJob, PostedAt, RawListing, Salary, SalaryPeriod},
    progress::{ProgressEvent, ProgressStatus, RunMetadata, RunOutput, RunStatus},
    search::{SearchSpec, WorkType, DEFAULT_TARGET},
};

pub use pipeline::{
    build_search_request, run_actor, CrawlOutcome, ListingPageCrawler, ProgressReporter,
    RunContext, SearchRequest,
};

pub use drivers::HttpDriver;
pub use extractors::{build_extractor, InteractiveExtractor, StaticHtmlExtractor};
pub use stores::{ApifyRuntime, ApifySink, JsonLinesSink, LocalRuntime, MemorySink};
