//! Per-run shared state.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Counters and clocks for one crawl run.
///
/// The emitted count is the only value concurrent extraction tasks race on;
/// `try_reserve` makes the check-and-increment a single step so the target
/// can never be overshot.
#[derive(Debug)]
pub struct RunContext {
    target: usize,
    emitted: AtomicUsize,
    extraction_failures: AtomicUsize,
    date_fallbacks: AtomicUsize,
    salary_fallbacks: AtomicUsize,
    last_scraped_at: Mutex<Option<DateTime<Utc>>>,
    started: Instant,
}

impl RunContext {
    pub fn new(target: u32) -> Self {
        Self {
            target: target as usize,
            emitted: AtomicUsize::new(0),
            extraction_failures: AtomicUsize::new(0),
            date_fallbacks: AtomicUsize::new(0),
            salary_fallbacks: AtomicUsize::new(0),
            last_scraped_at: Mutex::new(None),
            started: Instant::now(),
        }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    pub fn target_reached(&self) -> bool {
        self.emitted() >= self.target
    }

    /// Claim one emission slot. Returns false once the target is reached.
    pub fn try_reserve(&self) -> bool {
        self.emitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.target).then_some(n + 1)
            })
            .is_ok()
    }

    /// Give back a slot whose record never reached the sink.
    pub fn release(&self) {
        let _ = self
            .emitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn record_extraction_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallbacks(&self, date: bool, salary: bool) {
        if date {
            self.date_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
        if salary {
            self.salary_fallbacks.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Timestamp for the next record; never earlier than the previous one.
    pub fn scraped_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let mut last = self
            .last_scraped_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let stamp = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            jobs_scraped: self.emitted(),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            date_fallbacks: self.date_fallbacks.load(Ordering::Relaxed),
            salary_fallbacks: self.salary_fallbacks.load(Ordering::Relaxed),
            duration: self.elapsed(),
        }
    }
}

/// Snapshot of run counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub jobs_scraped: usize,
    pub extraction_failures: usize,
    pub date_fallbacks: usize,
    pub salary_fallbacks: usize,
    pub duration: Duration,
}
