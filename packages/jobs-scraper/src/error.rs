//! Typed errors for the scraper library.
//!
//! Uses `thiserror` for library errors (not `anyhow`); the binary wraps
//! them with context at the process boundary.

use thiserror::Error;

/// Run input rejected before any browsing starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// No usable mandatory keyword was supplied
    #[error("at least one mandatory keyword is required")]
    MissingKeywords,

    /// Location missing or blank
    #[error("location is required")]
    MissingLocation,

    /// Work type label is not one of REMOTE, HYBRID, ON_SITE, ANY
    #[error("unknown work type: {0}")]
    InvalidWorkType(String),

    /// Result count must be a positive integer
    #[error("max results must be a positive integer, got {0}")]
    InvalidMaxResults(String),

    /// Input record has the wrong shape
    #[error("malformed run input: {0}")]
    Malformed(String),
}

/// Failures reported by a page driver collaborator.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Transport failure while loading a page
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Page answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Rate limited by the source
    #[error("Rate limit exceeded at {url}")]
    RateLimited { url: String },

    /// Page did not settle within the timeout
    #[error("timed out after {timeout_ms}ms waiting for page to settle")]
    Timeout { timeout_ms: u64 },

    /// No page has been loaded yet
    #[error("no page loaded")]
    NotLoaded,

    /// The element behind a handle no longer exists
    #[error("element {id} is detached from the page")]
    Detached { id: String },

    /// CSS selector could not be parsed
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// URL could not be parsed or resolved
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The driver cannot perform this interaction
    #[error("unsupported interaction: {0}")]
    Unsupported(String),
}

/// A single listing could not be read at all.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Listing element vanished or could not be interacted with
    #[error("listing {id} unavailable: {source}")]
    Unavailable {
        id: String,
        #[source]
        source: DriverError,
    },

    /// Listing snapshot was empty
    #[error("listing {id} has no content")]
    Empty { id: String },
}

/// Page load or pagination failed after the retry budget was spent.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Loading the search page failed
    #[error("navigation to {url} failed after {attempts} attempts: {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: DriverError,
    },

    /// Advancing to the next result set failed
    #[error("pagination failed after {attempts} attempts: {source}")]
    Pagination {
        attempts: u32,
        #[source]
        source: DriverError,
    },

    /// Listing query on a loaded page failed
    #[error("could not query listings: {0}")]
    Query(#[source] DriverError),
}

/// Sink collaborator failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Write(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("sink serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Runtime collaborator failure (input, progress, output plumbing).
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("runtime JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("platform error: {0}")]
    Platform(#[from] apify_client::ApifyError),
}

/// Umbrella error for a whole actor run.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    #[error("driver setup failed: {0}")]
    Driver(#[from] DriverError),

    #[error("sink failed: {0}")]
    Sink(#[from] SinkError),

    #[error("runtime failed: {0}")]
    Runtime(#[from] RuntimeError),
}

impl DriverError {
    /// Whether a retry might succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            DriverError::InvalidSelector(_) | DriverError::InvalidUrl(_) | DriverError::Unsupported(_)
        )
    }
}

/// Result type alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Result type alias for listing extraction.
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

/// Result type alias for whole-run operations.
pub type Result<T> = std::result::Result<T, ScraperError>;
