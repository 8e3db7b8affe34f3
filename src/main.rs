use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use fuel_price_scraper::config::Config;
use fuel_price_scraper::constants::E10;
use fuel_price_scraper::infra::http_client::ReqwestHttp;
use fuel_price_scraper::pipeline::{self, StationOutcome};
use fuel_price_scraper::storage::PriceHistoryStore;
use fuel_price_scraper::view::{self, Granularity, ViewState};
use fuel_price_scraper::{logging, metrics};

#[derive(Parser)]
#[command(name = "fuel_price_scraper")]
#[command(about = "Daily fuel price scraper for gas-station websites")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml or built-in stations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch today's price for every station and append it to the history
    Fetch {
        /// Specific stations to run (comma-separated ids)
        #[arg(long)]
        stations: Option<String>,
        /// Override the price document path
        #[arg(long)]
        data_file: Option<PathBuf>,
        /// Record under this date instead of today's local date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Exit with an error if any station failed (the document is still saved)
        #[arg(long)]
        strict: bool,
    },
    /// Show a bucketed price table for all stations
    View {
        /// Local path or http(s) URL of the price document
        #[arg(long)]
        source: Option<String>,
        #[arg(long, value_enum, default_value_t = Granularity::Week)]
        granularity: Granularity,
        /// Date inside the bucket to show (defaults to today)
        #[arg(long)]
        anchor: Option<NaiveDate>,
        /// Buckets to move from the anchor; negative goes back
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        navigate: i32,
        #[arg(long, default_value = E10)]
        fuel: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Summarize recorded days and latest price per station
    Status {
        /// Local path or http(s) URL of the price document
        #[arg(long)]
        source: Option<String>,
        #[arg(long, default_value = E10)]
        fuel: String,
    },
    /// List configured stations
    Stations,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn http_client(config: &Config) -> anyhow::Result<ReqwestHttp> {
    ReqwestHttp::new(Duration::from_secs(config.timeout_seconds), &config.user_agent)
        .context("Failed to build HTTP client")
}

fn document_source(source: Option<String>, config: &Config) -> String {
    source.unwrap_or_else(|| config.data_file.display().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Fetch {
            stations,
            data_file,
            date,
            strict,
        } => {
            let stations = config.select_stations(stations.as_deref())?;
            let data_file = data_file.unwrap_or_else(|| config.data_file.clone());
            let date = date.unwrap_or_else(today);
            let store = PriceHistoryStore::new(&data_file);
            let http = http_client(&config)?;
            metrics::init_metrics();

            println!("⛽ Fetching {} stations for {}...", stations.len(), date);
            let report = pipeline::run_once(&store, &stations, &http, config.max_entries, date)
                .await
                .with_context(|| format!("Run aborted for {}", data_file.display()))?;
            metrics::push_metrics(&report.run_id.to_string()).await;

            for station in &report.stations {
                match &station.outcome {
                    StationOutcome::Appended { price } => {
                        println!("   ✅ {}: €{}", station.station_name, price)
                    }
                    StationOutcome::AlreadyRecorded => {
                        println!("   ℹ️  {}: already recorded for {}", station.station_name, date)
                    }
                    StationOutcome::Failed { error, .. } => {
                        println!("   ❌ {}: {}", station.station_name, error)
                    }
                }
            }
            println!("💾 Prices saved to {}", store.path().display());

            if strict && report.has_failures() {
                bail!("{} station(s) failed", report.failed_count());
            }
        }
        Commands::View {
            source,
            granularity,
            anchor,
            navigate,
            fuel,
            json,
        } => {
            let source = document_source(source, &config);
            let http = http_client(&config)?;
            let document = match view::load_document(&source, &http).await {
                Ok(document) => document,
                Err(e) => {
                    error!("Failed to load price data from {}: {}", source, e);
                    println!("❌ Could not load price data: {}", e);
                    bail!("could not load {}", source);
                }
            };

            let mut state = ViewState::new(granularity, anchor.unwrap_or_else(today), fuel);
            let series = match state.navigate(navigate).and_then(|_| state.render(&document)) {
                Ok(series) => series,
                Err(e) => {
                    error!("Cannot build {:?} view around {}: {}", granularity, state.anchor, e);
                    println!("❌ Could not build view: {}", e);
                    bail!("navigation by {} buckets is out of range", navigate);
                }
            };
            info!("Rendering {} dates for {} stations", series.dates.len(), series.series.len());

            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                print!("{}", series);
            }
        }
        Commands::Status { source, fuel } => {
            let source = document_source(source, &config);
            let http = http_client(&config)?;
            let document = match view::load_document(&source, &http).await {
                Ok(document) => document,
                Err(e) => {
                    println!("❌ Could not load price data: {}", e);
                    bail!("could not load {}", source);
                }
            };

            let last_updated = document
                .last_updated
                .map(|d| d.to_string())
                .unwrap_or_else(|| "never".to_string());
            println!("✅ {} loaded (last updated: {})", source, last_updated);
            for summary in view::summarize(&document, &fuel) {
                match summary.latest {
                    Some(latest) => println!(
                        "   {}: {} days, latest €{} on {}",
                        summary.name, summary.days, latest.price, latest.date
                    ),
                    None => println!("   {}: {} days", summary.name, summary.days),
                }
            }
        }
        Commands::Stations => {
            for station in &config.stations {
                println!(
                    "{:<32} {:<14} {:<6} {}",
                    station.id,
                    station.rule.type_name(),
                    station.fuel,
                    station.url
                );
            }
        }
    }
    Ok(())
}
