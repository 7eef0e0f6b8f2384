//! CLI entry point: a thin presentation layer over the sync core

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tenki::{
    ForecastBundle, ForecastRecord, ForecastStore, HistoryFilter, JmaClient, RegionDirectory,
    SyncOrchestrator, TenkiConfig, TenkiError,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tenki", version, about = "Cache and browse JMA regional weather forecasts")]
struct Cli {
    /// Path to a configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all known forecast regions
    Regions,
    /// Fetch the latest forecast for a region and cache it locally
    Sync {
        /// Region code, e.g. 130000 for Tokyo
        area_code: String,
    },
    /// Show cached forecast history
    History {
        /// Restrict to one region code
        #[arg(long)]
        area: Option<String>,
        /// Earliest forecast date (YYYY-MM-DD), inclusive
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Latest forecast date (YYYY-MM-DD), inclusive
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show the cached snapshot for one region and date
    Snapshot {
        /// Region code, e.g. 130000 for Tokyo
        area_code: String,
        /// Forecast date (YYYY-MM-DD)
        date: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TenkiConfig::load_from_path(cli.config.clone())
        .with_context(|| "Failed to load configuration")?;
    init_tracing(&config)?;

    let client = Arc::new(JmaClient::new(&config.source)?);
    let store = ForecastStore::open(&config.store.path).await?;
    let directory = Arc::new(RegionDirectory::new(client.clone()));
    let orchestrator = SyncOrchestrator::new(directory, client, store);

    match cli.command {
        Command::Regions => {
            let regions = orchestrator.load_regions().await?;
            for region in &regions {
                println!("{}  {}", region.code, region.name);
            }
            println!("{} regions", regions.len());
        }
        Command::Sync { area_code } => {
            // The directory must be populated before a code can resolve
            orchestrator.load_regions().await?;

            match orchestrator.sync_and_load(&area_code).await {
                Ok(bundle) => print_bundle(&bundle),
                Err(TenkiError::SyncPartiallyFailed { bundle, failed }) => {
                    eprintln!("warning: {failed} record(s) could not be cached locally");
                    print_bundle(&bundle);
                }
                Err(err) => {
                    eprintln!("{}", err.user_message());
                    return Err(err.into());
                }
            }
        }
        Command::History { area, start, end } => {
            let filter = HistoryFilter {
                area_code: area,
                start,
                end,
            };
            let records = orchestrator.get_history(&filter).await?;
            if records.is_empty() {
                println!("no cached forecasts match");
            }
            for record in &records {
                print_record(record);
            }
        }
        Command::Snapshot { area_code, date } => match orchestrator
            .get_snapshot(&area_code, date)
            .await?
        {
            Some(record) => print_record(&record),
            None => println!("no cached forecast for {area_code} on {date}"),
        },
    }

    Ok(())
}

fn init_tracing(config: &TenkiConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn print_bundle(bundle: &ForecastBundle) {
    println!("{} - {} day forecast", bundle.region, bundle.len());
    for record in &bundle.records {
        print_record(record);
    }
}

fn print_record(record: &ForecastRecord) {
    println!(
        "{}  {}  code {:>4}  min {:>4}  max {:>4}",
        record.forecast_date,
        record.area_name,
        record.weather_code,
        format_temp(record.temp_min),
        format_temp(record.temp_max),
    );
}

fn format_temp(temp: Option<i64>) -> String {
    match temp {
        Some(value) => format!("{value}°C"),
        None => "--".to_string(),
    }
}
