//! Apify platform adapters: dataset sink and actor runtime.

use apify_client::{ActorEnv, ApifyClient};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::{RuntimeResult, SinkError, SinkResult};
use crate::traits::runtime::Runtime;
use crate::traits::sink::Sink;
use crate::types::listing::NormalizedJob;
use crate::types::progress::{ProgressEvent, RunOutput};

/// Key-value store key holding the run input.
pub const INPUT_KEY: &str = "INPUT";

/// Key-value store key the final output is written to.
pub const OUTPUT_KEY: &str = "OUTPUT";

/// Pushes each record to the run's default dataset.
pub struct ApifySink {
    client: Arc<ApifyClient>,
    dataset_id: String,
}

impl ApifySink {
    pub fn new(client: Arc<ApifyClient>, dataset_id: impl Into<String>) -> Self {
        Self {
            client,
            dataset_id: dataset_id.into(),
        }
    }
}

#[async_trait]
impl Sink for ApifySink {
    async fn append(&self, job: &NormalizedJob) -> SinkResult<()> {
        self.client
            .push_items(&self.dataset_id, job)
            .await
            .map_err(|e| SinkError::Write(Box::new(e)))
    }

    fn name(&self) -> &str {
        "apify_dataset"
    }
}

/// Run input from the `INPUT` record, progress as the run status message,
/// final output to the `OUTPUT` record.
pub struct ApifyRuntime {
    client: Arc<ApifyClient>,
    env: ActorEnv,
}

impl ApifyRuntime {
    pub fn new(client: Arc<ApifyClient>, env: ActorEnv) -> Self {
        Self { client, env }
    }
}

#[async_trait]
impl Runtime for ApifyRuntime {
    async fn get_run_input(&self) -> RuntimeResult<serde_json::Value> {
        let input = self
            .client
            .get_record(&self.env.default_key_value_store_id, INPUT_KEY)
            .await?;
        Ok(input.unwrap_or_else(|| serde_json::json!({})))
    }

    async fn push_progress(&self, event: &ProgressEvent) -> RuntimeResult<()> {
        let Some(run_id) = &self.env.actor_run_id else {
            debug!(message = %event.message(), "No run id, progress not published");
            return Ok(());
        };
        self.client
            .update_status_message(run_id, &event.message(), event.is_terminal())
            .await?;
        Ok(())
    }

    async fn set_final_output(&self, output: &RunOutput) -> RuntimeResult<()> {
        self.client
            .set_record(&self.env.default_key_value_store_id, OUTPUT_KEY, output)
            .await?;
        Ok(())
    }
}
