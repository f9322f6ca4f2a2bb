//! Record extraction trait: one listing element in, one raw record out.

use async_trait::async_trait;

use crate::error::ExtractionResult;
use crate::traits::driver::{ElementHandle, PageDriver};
use crate::types::listing::RawListing;

/// Reads the fields of one listing element into a `RawListing`.
///
/// Missing sub-elements yield `None` fields; an error means the listing as a
/// whole could not be read and the crawler skips it.
#[async_trait]
pub trait RecordExtractor: Send + Sync {
    async fn extract(
        &self,
        driver: &dyn PageDriver,
        listing: &ElementHandle,
    ) -> ExtractionResult<RawListing>;

    /// Whether two listings can be extracted concurrently on one page.
    ///
    /// Strategies that change page state (click-to-reveal) are not.
    fn is_isolated(&self) -> bool {
        true
    }

    /// Extractor name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}
