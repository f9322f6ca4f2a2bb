//! In-memory sink for testing and development.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::{SinkError, SinkResult};
use crate::traits::sink::Sink;
use crate::types::listing::NormalizedJob;

/// Keeps appended records in memory.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on exit.
pub struct MemorySink {
    jobs: RwLock<Vec<NormalizedJob>>,
    capacity: Option<usize>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(Vec::new()),
            capacity: None,
        }
    }

    /// Reject every append once `capacity` records are stored.
    pub fn failing_after(capacity: usize) -> Self {
        Self {
            jobs: RwLock::new(Vec::new()),
            capacity: Some(capacity),
        }
    }

    /// Records appended so far, in order.
    pub fn jobs(&self) -> Vec<NormalizedJob> {
        self.jobs.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn append(&self, job: &NormalizedJob) -> SinkResult<()> {
        let mut jobs = self.jobs.write().unwrap();
        if self.capacity.is_some_and(|capacity| jobs.len() >= capacity) {
            return Err(SinkError::Write(Box::new(std::io::Error::other(
                "memory sink is full",
            ))));
        }
        jobs.push(job.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
