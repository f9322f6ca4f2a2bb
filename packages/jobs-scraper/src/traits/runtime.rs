//! Hosted-runtime plumbing: run input, progress channel, final output.

use async_trait::async_trait;

use crate::error::RuntimeResult;
use crate::types::progress::{ProgressEvent, RunOutput};

#[async_trait]
pub trait Runtime: Send + Sync {
    /// Raw run parameters. A runtime with no input returns an empty object.
    async fn get_run_input(&self) -> RuntimeResult<serde_json::Value>;

    /// Push one event onto the ordered progress channel.
    async fn push_progress(&self, event: &ProgressEvent) -> RuntimeResult<()>;

    /// Persist the final output record.
    async fn set_final_output(&self, output: &RunOutput) -> RuntimeResult<()>;
}
