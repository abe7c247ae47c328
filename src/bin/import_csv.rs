//! Load raw microgrid CSV exports, clean them and replace the stored
//! measurement table with the result.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use microgrid_monitor::{config::Config, ingest, repo::Repositories, telemetry};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "import_csv", about = "Clean raw CSV exports and load them into the store")]
struct Args {
    /// Configuration file, defaults to config/default.toml
    #[arg(long, env = "MICROGRID_CONFIG")]
    config: Option<PathBuf>,

    /// Override the ingest delimiter
    #[arg(long)]
    delimiter: Option<char>,

    /// Seed for the random gap filler
    #[arg(long)]
    seed: Option<u64>,

    /// Raw CSV files, processed in the given order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    telemetry::init_tracing();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(d) = args.delimiter {
        cfg.ingest.delimiter = d;
    }
    if args.seed.is_some() {
        cfg.ingest.seed = args.seed;
    }

    let repos = Repositories::new(&cfg).await?;
    let summary = ingest::import_files(&*repos.measurements, &args.files, &cfg.ingest).await?;

    info!(
        files = summary.files,
        rows_read = summary.rows_read,
        rows_persisted = summary.rows_persisted,
        "import finished"
    );
    Ok(())
}
