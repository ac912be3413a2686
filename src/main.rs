//! Flood Risk Service - entry point
//!
//! Two modes:
//! 1. One-shot: generate a single report and print it as JSON
//! 2. Endpoint: serve reports over HTTP until stopped
//!
//! Usage:
//!   cargo run --release -- --lat 3.139 --lon 101.687 --probability 0.9
//!   cargo run --release -- --endpoint 8080
//!   cargo run --release -- --config ./floodrisk.toml --endpoint 8080
//!
//! Environment:
//!   RUST_LOG     - log filter (default: info)
//!   DATABASE_URL - PostgreSQL connection string (postgres cache backend only)

use std::env;
use std::process;
use std::sync::Arc;

use floodrisk_service::aggregator::{Aggregator, AggregatorConfig, Sources};
use floodrisk_service::cache::ReadingCache;
use floodrisk_service::cache::store::{DurableStore, FileStore, MemoryStore};
use floodrisk_service::clock::{Clock, SystemClock};
use floodrisk_service::config::{load_config, load_config_from, CacheBackend, ServiceConfig};
use floodrisk_service::db::PgStore;
use floodrisk_service::endpoint;
use floodrisk_service::ingest::elevation::ElevationClient;
use floodrisk_service::ingest::open_meteo::OpenMeteoClient;
use floodrisk_service::location::LocationClassifier;
use floodrisk_service::model::Coordinates;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default)]
struct Args {
    config_path: Option<String>,
    endpoint_port: Option<u16>,
    lat: Option<f64>,
    lon: Option<f64>,
    probability: Option<f64>,
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--config PATH] [--endpoint PORT] [--lat X --lon Y --probability P]",
        program
    )
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("{} requires a value", flag))?;
        match flag {
            "--config" => parsed.config_path = Some(value.clone()),
            "--endpoint" => {
                parsed.endpoint_port = Some(
                    value
                        .parse()
                        .map_err(|_| format!("--endpoint expects a port number, got {}", value))?,
                )
            }
            "--lat" => parsed.lat = Some(parse_number(flag, value)?),
            "--lon" => parsed.lon = Some(parse_number(flag, value)?),
            "--probability" => parsed.probability = Some(parse_number(flag, value)?),
            _ => return Err(format!("Unknown argument: {}", flag)),
        }
        i += 2;
    }

    Ok(parsed)
}

fn parse_number(flag: &str, value: &str) -> Result<f64, String> {
    value
        .parse()
        .map_err(|_| format!("{} expects a number, got {}", flag, value))
}

fn open_store(config: &ServiceConfig) -> Result<Arc<dyn DurableStore>, String> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        CacheBackend::File => FileStore::open(&config.cache.directory)
            .map(|s| Arc::new(s) as Arc<dyn DurableStore>)
            .map_err(|e| format!("cannot open cache directory {}: {}", config.cache.directory, e)),
        CacheBackend::Postgres => PgStore::connect()
            .map(|s| Arc::new(s) as Arc<dyn DurableStore>)
            .map_err(|e| e.to_string()),
    }
}

fn build_aggregator(config: &ServiceConfig) -> Result<Aggregator, String> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(config)?;
    let cache = Arc::new(ReadingCache::new(store, Arc::clone(&clock)));

    let open_meteo = Arc::new(
        OpenMeteoClient::new(&config.sources, config.thresholds.precipitation)
            .map_err(|e| format!("cannot build HTTP client: {}", e))?,
    );
    let elevation = Arc::new(
        ElevationClient::new(&config.sources).map_err(|e| format!("cannot build HTTP client: {}", e))?,
    );

    Ok(Aggregator::new(
        cache,
        Sources {
            weather: open_meteo.clone(),
            river: open_meteo,
            elevation,
        },
        LocationClassifier::new(Arc::clone(&clock)),
        config.thresholds,
        clock,
        AggregatorConfig::from(&config.aggregator),
    ))
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "floodrisk_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let argv: Vec<String> = env::args().collect();
    let program = argv.first().map(String::as_str).unwrap_or("floodrisk_service");
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", usage(program));
            process::exit(1);
        }
    };

    let config = match &args.config_path {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let aggregator = match build_aggregator(&config) {
        Ok(aggregator) => aggregator,
        Err(e) => {
            eprintln!("Initialization failed: {}", e);
            process::exit(1);
        }
    };
    info!(backend = ?config.cache.backend, workers = config.aggregator.workers, "aggregator ready");

    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => {
            let coords = match Coordinates::new(lat, lon) {
                Ok(coords) => coords,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(2);
                }
            };
            let report = aggregator.generate_report(coords, args.probability.unwrap_or(0.5));
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: cannot serialize report: {}", e);
                    process::exit(1);
                }
            }
        }
        (None, None) => {
            let Some(port) = args.endpoint_port else {
                eprintln!("{}", usage(program));
                process::exit(1);
            };
            if let Err(e) = endpoint::start_endpoint_server(port, Arc::new(aggregator)) {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Error: --lat and --lon must be given together");
            eprintln!("{}", usage(program));
            process::exit(1);
        }
    }
}
