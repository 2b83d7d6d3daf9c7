use anyhow::{Context, Result};
use clap::Parser;
use statscraper::{
    config::Config,
    covid,
    fetch::{Fetcher, HttpSource},
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Export every table of the archived COVID-19 statistics page for one day"
)]
struct Args {
    /// Day to fetch, as MMDD.
    date: String,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    statscraper::init_logging("info");

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let day = covid::parse_day(&args.date, config.covid.year)?;
    let url = covid::snapshot_url(&config.covid, day)?;
    info!(%day, %url, "exporting tables");

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let fetcher = Fetcher::new(HttpSource::new(&config.user_agent)?, config.retry.clone());
    let written = covid::export_tables(&fetcher, &url, &args.out_dir, &args.date).await?;
    for path in &written {
        info!(path = %path.display(), "wrote");
    }
    Ok(())
}
