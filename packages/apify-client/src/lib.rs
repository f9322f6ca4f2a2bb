//! Pure Apify REST API client.
//!
//! A minimal client for the storage side of an actor run: reading the run
//! input record, pushing dataset items, writing key-value store records and
//! updating the run's status message.
//!
//! # Example
//!
//! ```rust,ignore
//! use apify_client::{ActorEnv, ApifyClient};
//!
//! let env = ActorEnv::from_env()?;
//! let client = ApifyClient::new(env.token.clone());
//!
//! let input: Option<serde_json::Value> = client
//!     .get_record(&env.default_key_value_store_id, "INPUT")
//!     .await?;
//! client.push_items(&env.default_dataset_id, &serde_json::json!({"id": 1})).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{ActorEnv, RunData, StatusMessageUpdate};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (e.g. a local platform emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn record_url(&self, store_id: &str, key: &str) -> String {
        format!(
            "{}/key-value-stores/{}/records/{}",
            self.base_url, store_id, key
        )
    }

    /// Read a JSON record from a key-value store. A missing record is `Ok(None)`.
    pub async fn get_record<T: DeserializeOwned>(
        &self,
        store_id: &str,
        key: &str,
    ) -> Result<Option<T>> {
        let resp = self
            .client
            .get(self.record_url(store_id, key))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 404 {
            tracing::debug!(store_id, key, "Record not found");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Write a JSON record to a key-value store, replacing any previous value.
    pub async fn set_record<T: Serialize + ?Sized>(
        &self,
        store_id: &str,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let resp = self
            .client
            .put(self.record_url(store_id, key))
            .bearer_auth(&self.token)
            .json(value)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::debug!(store_id, key, "Record stored");
        Ok(())
    }

    /// Append one item (or a JSON array of items) to a dataset.
    pub async fn push_items<T: Serialize + ?Sized>(
        &self,
        dataset_id: &str,
        items: &T,
    ) -> Result<()> {
        let url = format!("{}/datasets/{}/items", self.base_url, dataset_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(items)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }

    /// Update the status message shown for a run.
    pub async fn update_status_message(
        &self,
        run_id: &str,
        message: &str,
        is_terminal: bool,
    ) -> Result<RunData> {
        let url = format!("{}/actor-runs/{}", self.base_url, run_id);
        let body = StatusMessageUpdate {
            status_message: message.to_string(),
            is_terminal,
        };
        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        tracing::debug!(run_id, status = %api_resp.data.status, "Status message updated");
        Ok(api_resp.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_url_layout() {
        let client = ApifyClient::new("token".into()).with_base_url("http://localhost:8000/v2/");
        assert_eq!(
            client.record_url("store-1", "OUTPUT"),
            "http://localhost:8000/v2/key-value-stores/store-1/records/OUTPUT"
        );
    }
}
