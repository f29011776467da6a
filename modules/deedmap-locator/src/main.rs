use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use deedmap_common::FileConfig;
use deedmap_locator::{
    DeedCache, DeedOrchestrator, Geocoder, ManualGeocoder, StreetClusteringValidator, Throttled,
};
use nominatim_client::NominatimClient;

#[derive(Parser)]
#[command(name = "deedmap", about = "Geolocate deeds from the streets they mention")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Geolocate every deed in a `{deed_id: record}` JSON file
    Locate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Ignore and do not write the deed cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Geocode a JSON array of `{id, address}` reference addresses
    GeocodeAddresses {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    let mut config = FileConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Locate {
            input,
            output,
            no_cache,
        } => {
            if no_cache {
                config.cache.enabled = false;
            }
            config.log_summary();

            let geocoder = build_geocoder(&config)?;
            let validator =
                StreetClusteringValidator::new(geocoder, &config.geocoder, config.clustering.clone());
            let orchestrator =
                DeedOrchestrator::new(validator, DeedCache::new(&config.cache), &config.pipeline);

            let stats = orchestrator.run_file(&input, &output).await?;
            info!("{stats}");
            println!("{stats}");
        }
        Command::GeocodeAddresses { input, output } => {
            config.log_summary();
            let client: Arc<dyn Geocoder> = Arc::new(nominatim(&config)?);
            let geocoder = ManualGeocoder::new(client, &config.manual);
            let rows = geocoder.run_file(&input, &output).await?;
            let found = rows.iter().filter(|r| r.latitude.is_some()).count();
            println!("Geocoded {found}/{} addresses -> {}", rows.len(), output.display());
        }
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("deedmap=info".parse()?)
        .add_directive("nominatim_client=info".parse()?);
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn nominatim(config: &FileConfig) -> Result<NominatimClient> {
    let geocoder = &config.geocoder;
    let client = NominatimClient::new(
        &geocoder.user_agent,
        Duration::from_secs(geocoder.timeout_secs),
    )
    .context("Failed to build geocoder HTTP client")?
    .with_base_url(&geocoder.base_url)
    .with_reverse_zoom(geocoder.reverse_zoom);
    Ok(client)
}

fn build_geocoder(config: &FileConfig) -> Result<Arc<dyn Geocoder>> {
    let client = nominatim(config)?;
    let interval = config.geocoder.min_interval_ms;
    if interval > 0 {
        info!(min_interval_ms = interval, "Throttling geocoder requests");
        Ok(Arc::new(Throttled::new(client, Duration::from_millis(interval))))
    } else {
        Ok(Arc::new(client))
    }
}
