use anyhow::Result;
use clap::Parser;
use statscraper::{
    config::Config,
    csv_file,
    fetch::{Fetcher, HttpSource},
    pipeline::Pipeline,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Dementia prevalence by country and age group, joined with population counts"
)]
struct Args {
    /// YAML config file; built-in defaults otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Output CSV, overriding the config.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    statscraper::init_logging("info");
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(output) = args.output {
        config.output = output;
    }
    let output = config.output.clone();
    info!(
        max_attempts = config.retry.max_attempts,
        delay = ?config.retry.delay(),
        max_wait = ?config.retry.max_wait(),
        "retry policy"
    );

    let source = HttpSource::new(&config.user_agent)?;
    let fetcher = Fetcher::new(source, config.retry.clone());
    let pipeline = Pipeline::new(fetcher, config)?;

    // ─── 3) scrape + merge every country ─────────────────────────────
    let report = pipeline.run().await?;
    for skip in &report.skipped {
        warn!("skipped {}", skip);
    }

    // ─── 4) write the combined table ─────────────────────────────────
    csv_file::write_table(&output, &report.table)?;
    info!(
        path = %output.display(),
        rows = report.table.num_rows(),
        skipped = report.skipped.len(),
        "done"
    );
    Ok(())
}
