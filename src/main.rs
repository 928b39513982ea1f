mod config;
mod error;
mod models;
mod output;
mod search;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::AppError;
use crate::search::pipeline::{self, RunSummary};
use crate::search::serpapi::SerpApi;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobscrape=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn execute(config: &Config) -> anyhow::Result<RunSummary> {
    let query = config.search_query();
    query.validate()?;

    let source = SerpApi::new(
        &config.base_url,
        &query.api_key,
        Duration::from_secs(config.timeout_secs),
    )?;

    let summary = pipeline::run(&source, &query, &config.output)
        .await
        .with_context(|| format!("Scrape for '{}' failed", query.search_term))?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(config.log_json);

    match execute(&config).await {
        Ok(summary) => {
            tracing::debug!(
                output = %summary.output.display(),
                written = summary.written,
                "Run complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            let code = err
                .downcast_ref::<AppError>()
                .map(AppError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
