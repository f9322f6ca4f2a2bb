//! Append-only persistence for normalized records.

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::types::listing::NormalizedJob;

/// Receives each normalized record exactly once, in discovery order.
///
/// There is no update or delete: a record handed to `append` is final.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn append(&self, job: &NormalizedJob) -> SinkResult<()>;

    /// Sink name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}
