//! Crawl pipeline: request construction, crawl loop, normalization, progress.

pub mod actor;
pub mod context;
pub mod crawl;
pub mod normalize;
pub mod progress;
pub mod search_request;

pub use actor::run_actor;
pub use context::{RunContext, RunStats};
pub use crawl::{CrawlOutcome, ListingPageCrawler};
pub use normalize::{
    extract_salary, normalize_listing, normalize_work_type, parse_date, parse_date_at, Normalized,
};
pub use progress::ProgressReporter;
pub use search_request::{build_search_request, keyword_expression, SearchRequest};
