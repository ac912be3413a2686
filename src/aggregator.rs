//! Report aggregator.
//!
//! For one (coordinates, flood probability) request:
//!
//! 1. Serve a cached report if one younger than the report TTL exists.
//! 2. Otherwise fan out weather, river and elevation lookups on the worker
//!    pool. Each lookup tries the reading cache at its domain's tier and
//!    only calls the upstream source on a miss.
//! 3. Score the three readings and combine them into the composite risk.
//! 4. If any domain failed or did not answer in time, score synthetic
//!    readings instead and mark the report `is_mock`. Mock reports are
//!    never cached.
//!
//! `generate_report` never fails. Invalid coordinates are rejected earlier
//! by `Coordinates::new`.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration as StdDuration, Instant};
use threadpool::ThreadPool;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheTier, ReadingCache};
use crate::clock::Clock;
use crate::config::{AggregatorSettings, MIN_FETCH_WORKERS};
use crate::error::{FloodRiskError, SourceKind};
use crate::location::{terrain_context, LocationClassifier};
use crate::mock::synthetic_readings;
use crate::model::{
    Coordinates, ElevationReading, EnvironmentalReport, Reading, RiverReading, WeatherReading,
};
use crate::scoring::{
    analyze_geography, analyze_river, analyze_weather, clamp_probability, composite_risk,
};
use crate::sources::{ElevationSource, RiverSource, WeatherSource};
use crate::thresholds::ThresholdTables;

pub const WEATHER_TIER: CacheTier = CacheTier::Fresh;
pub const RIVER_TIER: CacheTier = CacheTier::Valid;
pub const ELEVATION_TIER: CacheTier = CacheTier::StaleAcceptable;

pub fn weather_key(coords: &Coordinates) -> String {
    format!("weather:{}", coords.key_fragment())
}

pub fn river_key(coords: &Coordinates) -> String {
    format!("river:{}", coords.key_fragment())
}

pub fn elevation_key(coords: &Coordinates) -> String {
    format!("elevation:{}", coords.key_fragment())
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub report_ttl: Duration,
    pub fetch_timeout: StdDuration,
    pub workers: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from(&AggregatorSettings::default())
    }
}

impl From<&AggregatorSettings> for AggregatorConfig {
    fn from(settings: &AggregatorSettings) -> Self {
        Self {
            report_ttl: Duration::seconds(settings.report_ttl_secs as i64),
            fetch_timeout: StdDuration::from_secs(settings.fetch_timeout_secs),
            workers: settings.workers.max(MIN_FETCH_WORKERS),
        }
    }
}

/// The three upstream adapters, shared with worker threads.
#[derive(Clone)]
pub struct Sources {
    pub weather: Arc<dyn WeatherSource>,
    pub river: Arc<dyn RiverSource>,
    pub elevation: Arc<dyn ElevationSource>,
}

// ---------------------------------------------------------------------------
// Report cache
// ---------------------------------------------------------------------------

/// Exact coordinates plus probability in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ReportKey {
    lat_bits: u64,
    lon_bits: u64,
    probability_pct: i64,
}

impl ReportKey {
    fn new(coords: &Coordinates, probability: f64) -> Self {
        Self {
            lat_bits: coords.latitude.to_bits(),
            lon_bits: coords.longitude.to_bits(),
            probability_pct: (probability * 100.0).round() as i64,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedReport {
    report: EnvironmentalReport,
    stored_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

enum Fetched {
    Weather(Result<WeatherReading, FloodRiskError>),
    River(Result<RiverReading, FloodRiskError>),
    Elevation(Result<ElevationReading, FloodRiskError>),
}

/// Reading-cache lookup at `tier`, falling back to `fetch` and storing its
/// result. A cached entry of the wrong kind counts as a miss.
fn cached_or_fetch<T: Clone>(
    cache: &ReadingCache,
    key: &str,
    tier: CacheTier,
    extract: fn(Reading) -> Option<T>,
    wrap: fn(T) -> Reading,
    fetch: impl FnOnce() -> Result<T, FloodRiskError>,
) -> Result<T, FloodRiskError> {
    if let Some(value) = cache.get(key, tier).and_then(extract) {
        debug!(key, "reading served from cache");
        return Ok(value);
    }
    let value = fetch()?;
    cache.put(key, &wrap(value.clone()));
    Ok(value)
}

struct Readings {
    weather: WeatherReading,
    river: RiverReading,
    elevation: ElevationReading,
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

pub struct Aggregator {
    cache: Arc<ReadingCache>,
    sources: Sources,
    locations: LocationClassifier,
    thresholds: ThresholdTables,
    clock: Arc<dyn Clock>,
    config: AggregatorConfig,
    pool: ThreadPool,
    reports: DashMap<ReportKey, CachedReport>,
}

impl Aggregator {
    pub fn new(
        cache: Arc<ReadingCache>,
        sources: Sources,
        locations: LocationClassifier,
        thresholds: ThresholdTables,
        clock: Arc<dyn Clock>,
        config: AggregatorConfig,
    ) -> Self {
        let pool = ThreadPool::with_name("floodrisk-fetch".to_string(), config.workers.max(MIN_FETCH_WORKERS));
        Self {
            cache,
            sources,
            locations,
            thresholds,
            clock,
            config,
            pool,
            reports: DashMap::new(),
        }
    }

    pub fn locations(&self) -> &LocationClassifier {
        &self.locations
    }

    pub fn generate_report(&self, coords: Coordinates, flood_probability: f64) -> EnvironmentalReport {
        let probability = clamp_probability(flood_probability);
        let key = ReportKey::new(&coords, probability);
        let now = self.clock.now();

        if let Some(cached) = self.reports.get(&key) {
            if now - cached.stored_at < self.config.report_ttl {
                debug!(lat = coords.latitude, lon = coords.longitude, "report served from cache");
                return cached.report.clone();
            }
        }

        match self.fetch_all(&coords) {
            Ok(readings) => {
                let report = self.build_report(coords, probability, &readings, false);
                info!(
                    lat = coords.latitude,
                    lon = coords.longitude,
                    probability,
                    score = report.composite_risk.score,
                    risk_level = %report.composite_risk.risk_level,
                    "report generated"
                );
                self.reports.insert(
                    key,
                    CachedReport {
                        report: report.clone(),
                        stored_at: self.clock.now(),
                    },
                );
                report
            }
            Err(e) => {
                warn!(
                    lat = coords.latitude,
                    lon = coords.longitude,
                    error = %e,
                    "upstream data incomplete, serving synthetic report"
                );
                let synthetic = synthetic_readings(&mut rand::thread_rng(), &self.thresholds.precipitation);
                let readings = Readings {
                    weather: synthetic.weather,
                    river: synthetic.river,
                    elevation: synthetic.elevation,
                };
                self.build_report(coords, probability, &readings, true)
            }
        }
    }

    /// Runs the three lookups concurrently and waits for all of them, up to
    /// the fetch timeout. The first failure (in weather, river, elevation
    /// order) is returned.
    fn fetch_all(&self, coords: &Coordinates) -> Result<Readings, FloodRiskError> {
        let (tx, rx) = mpsc::channel();

        {
            let tx = tx.clone();
            let cache = Arc::clone(&self.cache);
            let source = Arc::clone(&self.sources.weather);
            let coords = *coords;
            self.pool.execute(move || {
                let result = cached_or_fetch(
                    &cache,
                    &weather_key(&coords),
                    WEATHER_TIER,
                    |r| match r {
                        Reading::Weather(w) => Some(w),
                        _ => None,
                    },
                    Reading::Weather,
                    || source.fetch_weather(&coords),
                );
                let _ = tx.send(Fetched::Weather(result));
            });
        }
        {
            let tx = tx.clone();
            let cache = Arc::clone(&self.cache);
            let source = Arc::clone(&self.sources.river);
            let coords = *coords;
            self.pool.execute(move || {
                let result = cached_or_fetch(
                    &cache,
                    &river_key(&coords),
                    RIVER_TIER,
                    |r| match r {
                        Reading::River(r) => Some(r),
                        _ => None,
                    },
                    Reading::River,
                    || source.fetch_river_history(&coords),
                );
                let _ = tx.send(Fetched::River(result));
            });
        }
        {
            let tx = tx.clone();
            let cache = Arc::clone(&self.cache);
            let source = Arc::clone(&self.sources.elevation);
            let coords = *coords;
            self.pool.execute(move || {
                let result = cached_or_fetch(
                    &cache,
                    &elevation_key(&coords),
                    ELEVATION_TIER,
                    |r| match r {
                        Reading::Elevation(e) => Some(e),
                        _ => None,
                    },
                    Reading::Elevation,
                    || source.fetch_elevation(&coords),
                );
                let _ = tx.send(Fetched::Elevation(result));
            });
        }
        // Workers hold the only senders now; a panicked job disconnects its own.
        drop(tx);

        let mut weather = None;
        let mut river = None;
        let mut elevation = None;
        let deadline = Instant::now() + self.config.fetch_timeout;

        while weather.is_none() || river.is_none() || elevation.is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(Fetched::Weather(r)) => weather = Some(r),
                Ok(Fetched::River(r)) => river = Some(r),
                Ok(Fetched::Elevation(r)) => elevation = Some(r),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(timeout_ms = self.config.fetch_timeout.as_millis() as u64, "fetch barrier timed out");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let outstanding = |kind: SourceKind| FloodRiskError::unavailable(kind, "no answer before the fetch timeout");
        Ok(Readings {
            weather: weather.unwrap_or_else(|| Err(outstanding(SourceKind::Weather)))?,
            river: river.unwrap_or_else(|| Err(outstanding(SourceKind::River)))?,
            elevation: elevation.unwrap_or_else(|| Err(outstanding(SourceKind::Elevation)))?,
        })
    }

    fn build_report(
        &self,
        coords: Coordinates,
        probability: f64,
        readings: &Readings,
        is_mock: bool,
    ) -> EnvironmentalReport {
        let location = self.locations.summarize(&coords);
        let context = terrain_context(location.nearest_place.as_ref());

        let weather = analyze_weather(&readings.weather, probability, &self.thresholds.precipitation);
        let river = analyze_river(&readings.river, probability, &self.thresholds.river);
        let geography = analyze_geography(&readings.elevation, &context, probability);
        let composite = composite_risk(weather.score, river.score, geography.score);

        EnvironmentalReport {
            coordinates: coords,
            flood_probability: probability,
            weather_conditions: weather,
            river_status: river,
            geographical_factors: geography,
            composite_risk: composite,
            location,
            generated_at: self.clock.now(),
            is_mock,
        }
    }

    // -----------------------------------------------------------------------
    // Maintenance hooks
    // -----------------------------------------------------------------------

    pub fn report_cache_len(&self) -> usize {
        self.reports.len()
    }

    pub fn clear_report_cache(&self) {
        self.reports.clear();
    }

    /// Drops every cached report, reading and region.
    pub fn invalidate_all(&self) {
        self.reports.clear();
        self.cache.invalidate_all();
        self.locations.clear_cache();
        info!("all caches invalidated");
    }

    /// Removes expired reports, readings and regions. Returns how many
    /// entries went.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.report_ttl;
        let before = self.reports.len();
        self.reports.retain(|_, cached| now - cached.stored_at < ttl);
        let reports_removed = before.saturating_sub(self.reports.len());
        let readings_removed = self.cache.sweep_expired();
        let regions_removed = self.locations.sweep_cache();
        debug!(reports_removed, readings_removed, regions_removed, "sweep finished");
        reports_removed + readings_removed + regions_removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
