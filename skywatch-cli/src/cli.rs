use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use skywatch_core::{
    analysis::AnalysisEngine, collector::Collector, config::Config, provider::MetNoProvider, store,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skywatch", version, about = "Weather collection and analysis pipeline")]
pub struct Cli {
    /// Path to a JSON config file; defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch forecasts for the configured locations and write the results file.
    Collect,

    /// Analyze persisted location histories and write one analysis file each.
    Analyze,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load(self.config.as_deref())?;
        init_logging(&config.logging.level);

        match self.command {
            Command::Collect => collect(&config).await,
            Command::Analyze => analyze(&config),
        }
    }
}

/// `RUST_LOG` wins when set; otherwise the configured level applies.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn collect(config: &Config) -> anyhow::Result<()> {
    let locations = store::read_locations(&config.files.input_locations)?;
    info!(
        locations = locations.len(),
        input = %config.files.input_locations.display(),
        "loaded collection request"
    );

    let provider = MetNoProvider::new(&config.api).context("Failed to build forecast provider")?;
    let collector = Collector::new(provider, &config.performance);
    let results = collector.collect(&locations).await;

    store::write_results(&config.files.output_results, &results)?;

    let failed = results.iter().filter(|r| !r.success).count();
    info!(
        successful = results.len() - failed,
        failed,
        output = %config.files.output_results.display(),
        "collection results written"
    );
    Ok(())
}

fn analyze(config: &Config) -> anyhow::Result<()> {
    let histories = store::read_location_history(&config.files.timeseries_dir)?;
    info!(
        locations = histories.len(),
        timeseries = %config.files.timeseries_dir.display(),
        "loaded location histories"
    );

    let engine = AnalysisEngine::new();
    let mut written = 0usize;
    let mut failed = 0usize;
    for history in &histories {
        let result = engine.analyze(history);
        match store::write_analysis(&config.files.analysis_dir, &result) {
            Ok(path) => {
                info!(location = %result.location, file = %path.display(), "analysis written");
                written += 1;
            }
            Err(err) => {
                error!(location = %result.location, error = %format!("{err:#}"), "analysis write failed");
                failed += 1;
            }
        }
    }

    info!(written, failed, total = histories.len(), "analysis finished");
    if failed > 0 {
        anyhow::bail!("failed to write {failed} of {} analysis files", histories.len());
    }
    Ok(())
}
