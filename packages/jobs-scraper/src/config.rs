use anyhow::{anyhow, Context, Result};
use apify_client::ActorEnv;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

use crate::types::config::{ExtractionStrategy, ScraperSettings};

/// Process configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Platform storage ids, when running as a hosted actor
    pub apify: Option<ActorEnv>,
    pub settings: ScraperSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let apify = if ActorEnv::is_present() {
            Some(ActorEnv::from_env().context("Incomplete Apify environment")?)
        } else {
            None
        };

        let mut settings = ScraperSettings::default();
        if let Some(strategy) = var::<ExtractionStrategy>("SCRAPER_STRATEGY")? {
            settings = settings.with_strategy(strategy);
        }
        if let Some(batch_size) = var("SCRAPER_BATCH_SIZE")? {
            settings = settings.with_batch_size(batch_size);
        }
        if let Some(retries) = var("SCRAPER_MAX_RETRIES")? {
            settings = settings.with_max_retries(retries);
        }
        if let Some(concurrency) = var("SCRAPER_MAX_CONCURRENT_PAGES")? {
            settings = settings.with_concurrency(concurrency);
        }
        if let Some(max_jobs) = var("SCRAPER_MAX_JOBS_PER_RUN")? {
            settings = settings.with_max_jobs_per_run(max_jobs);
        }
        let request_delay = var("SCRAPER_REQUEST_DELAY_MS")?.unwrap_or(settings.request_delay_ms);
        let jitter = var("SCRAPER_JITTER_MS")?.unwrap_or(settings.jitter_ms);
        settings = settings.with_delays(request_delay, jitter);

        Ok(Self { apify, settings })
    }
}

/// Optional, parsed environment variable. Blank counts as unset.
fn var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("{name} is invalid: {e}")),
        _ => Ok(None),
    }
}
