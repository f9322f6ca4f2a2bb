// Actor entry point: crawl a job search and persist normalized listings

use anyhow::{bail, Context, Result};
use apify_client::ApifyClient;
use clap::Parser;
use jobs_scraper::{
    run_actor, ApifyRuntime, ApifySink, Config, ExtractionStrategy, HttpDriver, JsonLinesSink,
    LocalRuntime, Runtime, RunStatus, Sink,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jobs-scraper")]
#[command(about = "Crawl a job-listing search and write normalized records")]
struct Cli {
    /// Run input JSON file. Forces a local run.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Where a local run writes the final output record
    #[arg(long, default_value = "storage/output.json")]
    output: PathBuf,

    /// Where a local run appends records (JSON lines)
    #[arg(long, default_value = "storage/dataset.jsonl")]
    dataset: PathBuf,

    /// Extraction strategy: static or interactive
    #[arg(long, env = "SCRAPER_STRATEGY")]
    strategy: Option<ExtractionStrategy>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jobs_scraper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let mut settings = config.settings;
    if let Some(strategy) = cli.strategy {
        settings = settings.with_strategy(strategy);
    }

    let driver = HttpDriver::new().context("Failed to create page driver")?;

    let (runtime, sink): (Box<dyn Runtime>, Box<dyn Sink>) = match (config.apify, &cli.input) {
        (Some(env), None) => {
            tracing::info!("Running on Apify platform");
            let client = Arc::new(ApifyClient::new(env.token.clone()));
            let sink = ApifySink::new(Arc::clone(&client), env.default_dataset_id.clone());
            (Box::new(ApifyRuntime::new(client, env)), Box::new(sink))
        }
        (_, input) => {
            tracing::info!(dataset = %cli.dataset.display(), "Running locally");
            let mut runtime = LocalRuntime::new(&cli.output);
            if let Some(input) = input {
                runtime = runtime.with_input(input);
            }
            let sink = JsonLinesSink::create(&cli.dataset)
                .await
                .context("Failed to create dataset file")?;
            (Box::new(runtime), Box::new(sink))
        }
    };

    let output = run_actor(runtime.as_ref(), &driver, sink.as_ref(), settings)
        .await
        .context("Run aborted")?;

    if output.metadata.status == RunStatus::Failed {
        bail!(
            "Crawl failed after scraping {} jobs",
            output.metadata.jobs_scraped
        );
    }

    tracing::info!(jobs = output.metadata.jobs_scraped, "Done");
    Ok(())
}
