//! Progress events and the final run record.

use serde::{Deserialize, Serialize};

use super::listing::NormalizedJob;
use super::search::SearchSpec;

/// Status carried by a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Done,
    Error,
}

/// Incremental or final progress for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub jobs_scraped: usize,
    pub target: u32,
}

impl ProgressEvent {
    /// Short human-readable form, used as a platform status message.
    pub fn message(&self) -> String {
        match self.status {
            ProgressStatus::InProgress => {
                format!("Scraped {}/{} jobs", self.jobs_scraped, self.target)
            }
            ProgressStatus::Done => format!("Finished: {} jobs scraped", self.jobs_scraped),
            ProgressStatus::Error => {
                format!("Failed after scraping {} jobs", self.jobs_scraped)
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status != ProgressStatus::InProgress
    }
}

/// Terminal state of a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Done,
    Failed,
}

impl RunStatus {
    pub fn progress_status(&self) -> ProgressStatus {
        match self {
            RunStatus::Done => ProgressStatus::Done,
            RunStatus::Failed => ProgressStatus::Error,
        }
    }
}

/// Summary block of the final output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub jobs_scraped: usize,
    pub duration_seconds: f64,
    pub search_params: SearchSpec,
    pub status: RunStatus,
    #[serde(default)]
    pub extraction_failures: usize,
    #[serde(default)]
    pub date_fallbacks: usize,
    #[serde(default)]
    pub salary_fallbacks: usize,
}

/// Final persisted record: `{ jobs, metadata }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub jobs: Vec<NormalizedJob>,
    pub metadata: RunMetadata,
}
