//! Progress reporting onto the runtime channel.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::traits::runtime::Runtime;
use crate::types::progress::{ProgressEvent, ProgressStatus, RunStatus};

/// Emits progress events for one run.
///
/// Counts never go backwards and at most one terminal event is sent.
/// Push failures are logged and swallowed: progress is best-effort.
pub struct ProgressReporter<'a, R: Runtime + ?Sized> {
    runtime: &'a R,
    target: u32,
    high_water: AtomicUsize,
    finished: AtomicBool,
}

impl<'a, R: Runtime + ?Sized> ProgressReporter<'a, R> {
    pub fn new(runtime: &'a R, target: u32) -> Self {
        Self {
            runtime,
            target,
            high_water: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        }
    }

    /// Report an intermediate count.
    pub async fn in_progress(&self, jobs_scraped: usize) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        self.push(ProgressStatus::InProgress, jobs_scraped).await;
    }

    /// Report the terminal event. Later calls are ignored.
    pub async fn finish(&self, status: RunStatus, jobs_scraped: usize) {
        if self.finished.swap(true, Ordering::SeqCst) {
            return;
        }
        self.push(status.progress_status(), jobs_scraped).await;
    }

    async fn push(&self, status: ProgressStatus, jobs_scraped: usize) {
        let previous = self.high_water.fetch_max(jobs_scraped, Ordering::SeqCst);
        let event = ProgressEvent {
            status,
            jobs_scraped: previous.max(jobs_scraped),
            target: self.target,
        };

        debug!(
            status = ?event.status,
            jobs_scraped = event.jobs_scraped,
            target = event.target,
            "Progress"
        );
        if let Err(e) = self.runtime.push_progress(&event).await {
            warn!(error = %e, "Failed to push progress event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRuntime;

    #[tokio::test]
    async fn test_counts_never_decrease() {
        let runtime = MockRuntime::new();
        let reporter = ProgressReporter::new(&runtime, 100);
        reporter.in_progress(25).await;
        reporter.in_progress(10).await;
        reporter.finish(RunStatus::Done, 40).await;

        let counts: Vec<_> = runtime.events().iter().map(|e| e.jobs_scraped).collect();
        assert_eq!(counts, vec![25, 25, 40]);
    }

    #[tokio::test]
    async fn test_single_terminal_event() {
        let runtime = MockRuntime::new();
        let reporter = ProgressReporter::new(&runtime, 10);
        reporter.finish(RunStatus::Failed, 3).await;
        reporter.finish(RunStatus::Done, 3).await;
        reporter.in_progress(4).await;

        let events = runtime.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, ProgressStatus::Error);
    }

    #[tokio::test]
    async fn test_push_failure_is_not_fatal() {
        let runtime = MockRuntime::new().failing_progress();
        let reporter = ProgressReporter::new(&runtime, 10);
        reporter.in_progress(1).await;
        reporter.finish(RunStatus::Done, 1).await;
        assert!(runtime.events().is_empty());
    }
}
