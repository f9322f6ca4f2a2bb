//! Local file adapters: JSON-lines dataset and a file-backed runtime.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{RuntimeResult, SinkError, SinkResult};
use crate::traits::runtime::Runtime;
use crate::traits::sink::Sink;
use crate::types::listing::NormalizedJob;
use crate::types::progress::{ProgressEvent, RunOutput};

/// Appends one JSON object per line.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Create (or truncate) the dataset file.
    pub async fn create(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)
            .await
            .map_err(|e| SinkError::Write(Box::new(e)))?;
        let file = File::create(&path)
            .await
            .map_err(|e| SinkError::Write(Box::new(e)))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonLinesSink {
    async fn append(&self, job: &NormalizedJob) -> SinkResult<()> {
        let mut line = serde_json::to_vec(job)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .map_err(|e| SinkError::Write(Box::new(e)))?;
        file.flush()
            .await
            .map_err(|e| SinkError::Write(Box::new(e)))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Runtime for local runs: input from a JSON file, progress to the log,
/// final output to a JSON file.
pub struct LocalRuntime {
    input_path: Option<PathBuf>,
    output_path: PathBuf,
}

impl LocalRuntime {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: None,
            output_path: output_path.into(),
        }
    }

    pub fn with_input(mut self, input_path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(input_path.into());
        self
    }
}

#[async_trait]
impl Runtime for LocalRuntime {
    async fn get_run_input(&self) -> RuntimeResult<serde_json::Value> {
        let Some(path) = &self.input_path else {
            debug!("No input file, using empty input");
            return Ok(serde_json::json!({}));
        };
        let raw = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn push_progress(&self, event: &ProgressEvent) -> RuntimeResult<()> {
        info!(
            status = ?event.status,
            jobs_scraped = event.jobs_scraped,
            target = event.target,
            "{}",
            event.message()
        );
        Ok(())
    }

    async fn set_final_output(&self, output: &RunOutput) -> RuntimeResult<()> {
        ensure_parent(&self.output_path).await?;
        let json = serde_json::to_vec_pretty(output)?;
        fs::write(&self.output_path, json).await?;
        info!(path = %self.output_path.display(), "Wrote final output");
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
