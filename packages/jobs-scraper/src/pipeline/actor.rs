//! Actor entry: input → validate → crawl → final output.

use tracing::{error, info};

use crate::error::Result;
use crate::input::parse_run_input;
use crate::pipeline::crawl::{CrawlOutcome, ListingPageCrawler};
use crate::traits::driver::PageDriver;
use crate::traits::runtime::Runtime;
use crate::traits::sink::Sink;
use crate::types::config::ScraperSettings;
use crate::types::progress::{RunMetadata, RunOutput};
use crate::types::search::SearchSpec;

/// Run one actor invocation.
///
/// A validation error aborts before any browsing and produces no output.
/// Otherwise the final output is always persisted, including for a failed
/// crawl; check `metadata.status` to tell them apart.
pub async fn run_actor<R: Runtime + ?Sized>(
    runtime: &R,
    driver: &dyn PageDriver,
    sink: &dyn Sink,
    settings: ScraperSettings,
) -> Result<RunOutput> {
    let input = runtime.get_run_input().await?;
    let spec = parse_run_input(&input).map_err(|e| {
        error!(error = %e, "Invalid run input, aborting");
        e
    })?;

    info!(
        keywords = ?spec.mandatory_keywords,
        optional = ?spec.optional_keywords,
        location = %spec.location,
        work_type = %spec.work_type,
        target = spec.target,
        "Run input accepted"
    );

    let crawler = ListingPageCrawler::new(driver, sink, settings);
    let outcome = crawler.run(&spec, runtime).await;
    let output = build_output(outcome, spec);

    runtime.set_final_output(&output).await?;
    info!(
        status = ?output.metadata.status,
        jobs_scraped = output.metadata.jobs_scraped,
        duration_seconds = output.metadata.duration_seconds,
        "Run complete"
    );
    Ok(output)
}

fn build_output(outcome: CrawlOutcome, search_params: SearchSpec) -> RunOutput {
    let metadata = RunMetadata {
        jobs_scraped: outcome.jobs.len(),
        duration_seconds: outcome.stats.duration.as_secs_f64(),
        search_params,
        status: outcome.status,
        extraction_failures: outcome.stats.extraction_failures,
        date_fallbacks: outcome.stats.date_fallbacks,
        salary_fallbacks: outcome.stats.salary_fallbacks,
    };
    RunOutput {
        jobs: outcome.jobs,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ScraperError, ValidationError};
    use crate::stores::MemorySink;
    use crate::testing::{MockDriver, MockDriverCall, MockListing, MockRuntime};
    use crate::types::config::Selectors;
    use crate::types::progress::{ProgressStatus, RunStatus};
    use serde_json::json;

    fn settings() -> ScraperSettings {
        ScraperSettings::default().with_delays(0, 0)
    }

    #[tokio::test]
    async fn test_output_summarizes_run() {
        let runtime = MockRuntime::new().with_input(json!({
            "mandatoryKeywords": ["rust"],
            "location": "Berlin",
            "maxJobs": 2
        }));
        let driver = MockDriver::new(vec![
            MockListing::new("1").with_posted_date("someday"),
            MockListing::new("2").with_salary("competitive"),
            MockListing::new("3"),
        ]);
        let sink = MemorySink::new();

        let output = run_actor(&runtime, &driver, &sink, settings()).await.unwrap();

        assert_eq!(output.metadata.status, RunStatus::Done);
        assert_eq!(output.metadata.jobs_scraped, 2);
        assert_eq!(output.metadata.date_fallbacks, 1);
        assert_eq!(output.metadata.salary_fallbacks, 1);
        assert_eq!(output.metadata.search_params.target, 2);
        assert_eq!(runtime.output(), Some(output));
    }

    #[tokio::test]
    async fn test_invalid_input_produces_nothing() {
        let runtime = MockRuntime::new().with_input(json!({"location": "Berlin"}));
        let driver = MockDriver::new(vec![MockListing::new("1")]);
        let sink = MemorySink::new();

        let err = run_actor(&runtime, &driver, &sink, settings()).await.unwrap_err();

        assert!(matches!(
            err,
            ScraperError::Validation(ValidationError::MissingKeywords)
        ));
        assert!(runtime.output().is_none());
        assert!(runtime.events().is_empty());
        assert!(driver.calls().is_empty());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_output_failure_surfaces() {
        let runtime = MockRuntime::new()
            .with_input(json!({"mandatoryKeywords": ["rust"], "location": "Berlin"}))
            .failing_output();
        let driver = MockDriver::new(vec![MockListing::new("1")]);
        let sink = MemorySink::new();

        let err = run_actor(&runtime, &driver, &sink, settings()).await.unwrap_err();
        assert!(matches!(err, ScraperError::Runtime(_)));
    }

    #[tokio::test]
    async fn test_bad_selector_fails_run_and_closes_driver() {
        let runtime = MockRuntime::new()
            .with_input(json!({"mandatoryKeywords": ["rust"], "location": "Berlin"}));
        let driver = MockDriver::new(vec![MockListing::new("1")]);
        let sink = MemorySink::new();
        let selectors = Selectors {
            salary: "[[".into(),
            ..Selectors::default()
        };

        let output = run_actor(&runtime, &driver, &sink, settings().with_selectors(selectors))
            .await
            .unwrap();

        assert_eq!(output.metadata.status, RunStatus::Failed);
        assert!(output.jobs.is_empty());
        assert_eq!(driver.calls(), vec![MockDriverCall::Close]);
        assert_eq!(runtime.events().last().unwrap().status, ProgressStatus::Error);
        assert_eq!(runtime.output(), Some(output));
    }
}
