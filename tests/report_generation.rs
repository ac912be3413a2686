/// Integration tests for end-to-end report generation
///
/// These exercise the aggregator through its public API only, with stub
/// sources standing in for the upstream providers:
/// 1. Scoring a known scenario end to end
/// 2. Concurrency and the fetch timeout
/// 3. Durable cache reuse across a restart
/// 4. Degradation to synthetic reports
///
/// No network or database is required.
///
/// Run with: cargo test --test report_generation

use chrono::{Duration, TimeZone, Utc};
use floodrisk_service::aggregator::{Aggregator, AggregatorConfig, Sources};
use floodrisk_service::cache::ReadingCache;
use floodrisk_service::cache::store::{DurableStore, FileStore, MemoryStore};
use floodrisk_service::clock::{Clock, ManualClock};
use floodrisk_service::error::{FloodRiskError, SourceKind};
use floodrisk_service::location::LocationClassifier;
use floodrisk_service::model::{
    Coordinates, CurrentConditions, DischargeStatistics, ElevationReading, RainfallAnalysis,
    RiskLevel, RiverReading, WeatherForecast, WeatherReading,
};
use floodrisk_service::sources::{ElevationSource, RiverSource, WeatherSource};
use floodrisk_service::thresholds::{PrecipitationBand, ThresholdTables};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// One stub serving all three domains with a configurable delay per call.
struct StubProvider {
    delay: StdDuration,
    elevation_delay: StdDuration,
    fail_river: bool,
    precipitation: f64,
    percentile: f64,
    elevation_m: f64,
    calls: AtomicUsize,
}

impl StubProvider {
    fn monsoon() -> Self {
        Self {
            delay: StdDuration::ZERO,
            elevation_delay: StdDuration::ZERO,
            fail_river: false,
            precipitation: 25.0,
            percentile: 99.0,
            elevation_m: 8.0,
            calls: AtomicUsize::new(0),
        }
    }

    fn dry_highland() -> Self {
        Self {
            precipitation: 0.0,
            percentile: 20.0,
            elevation_m: 350.0,
            ..Self::monsoon()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for StubProvider {
    fn fetch_weather(&self, _: &Coordinates) -> Result<WeatherReading, FloodRiskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        let raining = self.precipitation > 0.0;
        Ok(WeatherReading {
            current: CurrentConditions {
                temperature_c: 26.0,
                precipitation_mm_h: self.precipitation,
                humidity_pct: if raining { 95.0 } else { 60.0 },
                wind_speed_kmh: 10.0,
                pressure_hpa: if raining { 998.0 } else { 1015.0 },
                conditions: "stub".to_string(),
            },
            forecast: WeatherForecast::default(),
            analysis: RainfallAnalysis {
                description: "stub".to_string(),
                intensity: PrecipitationBand::None,
                duration_hours: if raining { 13.0 } else { 0.0 },
                total_expected_mm: self.precipitation * 13.0,
                periods_count: u32::from(raining),
            },
        })
    }
}

impl RiverSource for StubProvider {
    fn fetch_river_history(&self, _: &Coordinates) -> Result<RiverReading, FloodRiskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        if self.fail_river {
            return Err(FloodRiskError::unavailable(SourceKind::River, "gauge offline"));
        }
        Ok(RiverReading {
            current_discharge_m3s: 150.0,
            statistics: DischargeStatistics {
                percentile: self.percentile,
                average: 150.0,
                median: 150.0,
                min: 40.0,
                max: 600.0,
                status: "stub".to_string(),
                description: "stub".to_string(),
            },
            data_points: vec![],
        })
    }
}

impl ElevationSource for StubProvider {
    fn fetch_elevation(&self, _: &Coordinates) -> Result<ElevationReading, FloodRiskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay.max(self.elevation_delay));
        Ok(ElevationReading {
            elevation_m: self.elevation_m,
        })
    }
}

fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 11, 28, 7, 0, 0).unwrap()))
}

fn build(
    provider: Arc<StubProvider>,
    store: Arc<dyn DurableStore>,
    clock: Arc<ManualClock>,
    config: AggregatorConfig,
) -> Aggregator {
    let clock_dyn: Arc<dyn Clock> = clock;
    Aggregator::new(
        Arc::new(ReadingCache::new(store, Arc::clone(&clock_dyn))),
        Sources {
            weather: provider.clone(),
            river: provider.clone(),
            elevation: provider,
        },
        LocationClassifier::new(Arc::clone(&clock_dyn)),
        ThresholdTables::default(),
        clock_dyn,
        config,
    )
}

fn kuala_lumpur() -> Coordinates {
    Coordinates::new(3.139, 101.687).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_monsoon_in_kuala_lumpur_is_critical() {
    let provider = Arc::new(StubProvider::monsoon());
    let agg = build(provider, Arc::new(MemoryStore::new()), test_clock(), AggregatorConfig::default());

    let report = agg.generate_report(kuala_lumpur(), 0.9);

    assert!(!report.is_mock);
    assert_eq!(report.composite_risk.risk_level, RiskLevel::Critical);
    assert!(report.composite_risk.score >= 85.0);
    assert_eq!(report.location.region, "Kuala Lumpur");
    assert!(report.location.within_service_area);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["weather_conditions"]["severity"], "critical");
    assert_eq!(json["river_status"]["level"], "extreme");
    assert_eq!(json["geographical_factors"]["risk"], "critical");
    assert!(
        report
            .geographical_factors
            .amplifying_factors
            .iter()
            .any(|f| f.contains("Urban")),
        "KL city centre should count as urban surroundings"
    );
}

#[test]
fn test_dry_highland_is_very_low() {
    let provider = Arc::new(StubProvider::dry_highland());
    let agg = build(provider, Arc::new(MemoryStore::new()), test_clock(), AggregatorConfig::default());

    let coords = Coordinates::new(4.47, 101.38).unwrap();
    let report = agg.generate_report(coords, 0.1);

    assert!(!report.is_mock);
    // 0.40 * 0 + 0.35 * 10 + 0.25 * 15
    assert!((report.composite_risk.score - 7.25).abs() < 1e-9);
    assert_eq!(report.composite_risk.risk_level, RiskLevel::VeryLow);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["composite_risk"]["risk_level"], "Very Low");
}

// ---------------------------------------------------------------------------
// 2. Concurrency and timeout
// ---------------------------------------------------------------------------

#[test]
fn test_domains_are_fetched_concurrently() {
    let provider = Arc::new(StubProvider {
        delay: StdDuration::from_millis(300),
        ..StubProvider::monsoon()
    });
    let agg = build(provider, Arc::new(MemoryStore::new()), test_clock(), AggregatorConfig::default());

    let started = Instant::now();
    let report = agg.generate_report(kuala_lumpur(), 0.9);
    let elapsed = started.elapsed();

    assert!(!report.is_mock);
    assert!(
        elapsed < StdDuration::from_millis(800),
        "three 300 ms fetches should overlap, took {:?}",
        elapsed
    );
}

#[test]
fn test_single_worker_setting_still_fetches_concurrently() {
    let provider = Arc::new(StubProvider {
        delay: StdDuration::from_millis(300),
        ..StubProvider::monsoon()
    });
    let config = AggregatorConfig {
        workers: 1,
        ..AggregatorConfig::default()
    };
    let agg = build(provider, Arc::new(MemoryStore::new()), test_clock(), config);

    let started = Instant::now();
    let report = agg.generate_report(kuala_lumpur(), 0.9);
    let elapsed = started.elapsed();

    assert!(!report.is_mock);
    assert!(
        elapsed < StdDuration::from_millis(800),
        "fetches queued behind a single worker, took {:?}",
        elapsed
    );
}

#[test]
fn test_slow_domain_hits_fetch_timeout_and_degrades() {
    let provider = Arc::new(StubProvider {
        elevation_delay: StdDuration::from_secs(2),
        ..StubProvider::monsoon()
    });
    let config = AggregatorConfig {
        fetch_timeout: StdDuration::from_millis(200),
        ..AggregatorConfig::default()
    };
    let agg = build(provider, Arc::new(MemoryStore::new()), test_clock(), config);

    let started = Instant::now();
    let report = agg.generate_report(kuala_lumpur(), 0.9);

    assert!(report.is_mock);
    assert!(started.elapsed() < StdDuration::from_millis(1500));
    assert_eq!(agg.report_cache_len(), 0);
}

// ---------------------------------------------------------------------------
// 3. Durable cache
// ---------------------------------------------------------------------------

#[test]
fn test_file_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = test_clock();

    let first_provider = Arc::new(StubProvider::monsoon());
    let first = build(
        first_provider.clone(),
        Arc::new(FileStore::open(dir.path()).unwrap()),
        clock.clone(),
        AggregatorConfig::default(),
    );
    first.generate_report(kuala_lumpur(), 0.9);
    assert_eq!(first_provider.calls(), 3);
    drop(first);

    // New process, same directory, one minute later: every domain is still
    // inside its tier, so nothing goes upstream.
    clock.advance(Duration::minutes(1));
    let second_provider = Arc::new(StubProvider::monsoon());
    let second = build(
        second_provider.clone(),
        Arc::new(FileStore::open(dir.path()).unwrap()),
        clock.clone(),
        AggregatorConfig::default(),
    );
    let report = second.generate_report(kuala_lumpur(), 0.9);

    assert!(!report.is_mock);
    assert_eq!(second_provider.calls(), 0);
    assert_eq!(second.cache_stats().durable_hits, 3);
}

#[test]
fn test_failing_durable_store_is_absorbed() {
    let store = Arc::new(MemoryStore::new());
    store.set_failing(true);
    let provider = Arc::new(StubProvider::monsoon());
    let agg = build(provider, store, test_clock(), AggregatorConfig::default());

    let report = agg.generate_report(kuala_lumpur(), 0.9);

    assert!(!report.is_mock, "durable I/O errors must not degrade the report");
    assert!(agg.cache_stats().durable_errors > 0);
}

// ---------------------------------------------------------------------------
// 4. Degradation
// ---------------------------------------------------------------------------

#[test]
fn test_single_failed_domain_yields_full_mock_report() {
    let provider = Arc::new(StubProvider {
        fail_river: true,
        ..StubProvider::monsoon()
    });
    let agg = build(provider, Arc::new(MemoryStore::new()), test_clock(), AggregatorConfig::default());

    let report = agg.generate_report(kuala_lumpur(), 0.9);

    assert!(report.is_mock);
    assert_eq!(report.flood_probability, 0.9);
    assert!(!report.weather_conditions.description.is_empty());
    assert!(!report.river_status.description.is_empty());
    assert!(!report.geographical_factors.description.is_empty());
    assert!(!report.composite_risk.summary.is_empty());
    assert_eq!(agg.report_cache_len(), 0);
}
