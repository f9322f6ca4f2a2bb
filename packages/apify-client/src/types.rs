use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApifyError, Result};

/// Storage and run identifiers the platform injects into an actor process.
#[derive(Debug, Clone)]
pub struct ActorEnv {
    pub token: String,
    pub default_dataset_id: String,
    pub default_key_value_store_id: String,
    pub actor_run_id: Option<String>,
}

impl ActorEnv {
    /// Read the actor environment. Fails if any storage id or the token is missing.
    pub fn from_env() -> Result<Self> {
        fn required(name: &'static str) -> Result<String> {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ApifyError::MissingEnv(name))
        }

        Ok(Self {
            token: required("APIFY_TOKEN")?,
            default_dataset_id: required("APIFY_DEFAULT_DATASET_ID")?,
            default_key_value_store_id: required("APIFY_DEFAULT_KEY_VALUE_STORE_ID")?,
            actor_run_id: std::env::var("APIFY_ACTOR_RUN_ID").ok(),
        })
    }

    /// Whether the process looks like it runs on the platform.
    pub fn is_present() -> bool {
        std::env::var("APIFY_TOKEN").is_ok()
            && std::env::var("APIFY_DEFAULT_KEY_VALUE_STORE_ID").is_ok()
    }
}

/// Body for updating a run's status message.
#[derive(Debug, Clone, Serialize)]
pub struct StatusMessageUpdate {
    #[serde(rename = "statusMessage")]
    pub status_message: String,
    #[serde(rename = "isStatusMessageTerminal")]
    pub is_terminal: bool,
}

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "statusMessage")]
    pub status_message: Option<String>,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_serializes_platform_names() {
        let body = StatusMessageUpdate {
            status_message: "Scraped 10/100 jobs".into(),
            is_terminal: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["statusMessage"], "Scraped 10/100 jobs");
        assert_eq!(json["isStatusMessageTerminal"], false);
    }

    #[test]
    fn test_run_data_deserializes() {
        let json = r#"{"id":"r1","status":"RUNNING","defaultDatasetId":"d1","statusMessage":null}"#;
        let run: RunData = serde_json::from_str(json).unwrap();
        assert_eq!(run.id, "r1");
        assert_eq!(run.default_dataset_id, "d1");
        assert!(run.finished_at.is_none());
    }
}
