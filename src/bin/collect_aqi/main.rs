//! Air-quality collector - fetches every configured location once and
//! merges the readings into the CSV dataset

use anyhow::{bail, Result};
use aqi_collector::ingestion::collect;
use aqi_collector::ingestion::config::{select_locations, Config};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting air-quality collection");

    // Load configuration from .env and the environment
    dotenvy::dotenv().ok();
    let mut config = Config::from_env()?;

    // Optional positional args narrow the run to named locations
    let names: Vec<String> = env::args().skip(1).collect();
    config.locations = select_locations(&config.locations, &names);
    if config.locations.is_empty() {
        bail!("No known locations selected");
    }

    info!(
        "Configuration loaded: {} locations, output {:?}",
        config.locations.len(),
        config.output_path
    );

    match collect::run(&config).await {
        Ok(summary) => {
            info!("✓ Collection completed: {}", summary.collect);
            if let Some(merge) = summary.merge {
                info!("✓ Dataset updated: {}", merge);
            }
        }
        Err(e) => {
            error!("✗ Error in data collection: {:#}", e);
            return Err(e);
        }
    }

    info!("Air-quality collection complete");

    Ok(())
}
