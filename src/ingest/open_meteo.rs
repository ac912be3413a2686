/// Open-Meteo forecast and flood API client.
///
/// Two endpoints, both keyed by latitude/longitude:
///   forecast: current conditions, 24 hourly precipitation values, daily summary
///   flood:    daily river discharge (GloFAS) for the past `HISTORY_DAYS` plus today
///
/// Upstream arrays are column-oriented (`time[]` alongside `precipitation[]`)
/// and individual entries may be `null`. See `fixtures.rs` for examples.

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::SourcesConfig;
use crate::error::{FloodRiskError, SourceKind};
use crate::ingest::{build_http_client, fetch_body};
use crate::model::{
    Coordinates, CurrentConditions, DailyForecast, DischargePoint, DischargeStatistics,
    HourlyForecast, RainfallAnalysis, RiverReading, WeatherForecast, WeatherReading,
};
use crate::sources::{RiverSource, WeatherSource};
use crate::thresholds::{PrecipitationBand, PrecipitationThresholds};

/// Days of discharge history requested for the percentile.
pub const HISTORY_DAYS: u32 = 90;
/// Hourly outlook length.
pub const OUTLOOK_HOURS: usize = 24;
/// An hour counts as rainy above this amount.
const RAINY_HOUR_MM: f64 = 0.1;

// ---------------------------------------------------------------------------
// Serde structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
    #[serde(default)]
    hourly: Option<HourlyBlock>,
    #[serde(default)]
    daily: Option<DailyBlock>,
}

#[derive(Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    weather_code: Option<u32>,
    /// Sea-level pressure; the pressure thresholds in scoring assume it.
    pressure_msl: Option<f64>,
    wind_speed_10m: Option<f64>,
}

#[derive(Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct DailyBlock {
    time: Vec<String>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct FloodResponse {
    daily: Option<FloodDaily>,
}

#[derive(Deserialize)]
struct FloodDaily {
    time: Vec<String>,
    #[serde(default)]
    river_discharge: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

pub fn build_forecast_url(base: &str, coords: &Coordinates) -> String {
    format!(
        "{}?latitude={:.4}&longitude={:.4}\
         &current=temperature_2m,relative_humidity_2m,precipitation,weather_code,pressure_msl,wind_speed_10m\
         &hourly=precipitation,precipitation_probability\
         &daily=precipitation_sum,temperature_2m_max,temperature_2m_min\
         &forecast_hours={}&forecast_days=3&timezone=auto",
        base, coords.latitude, coords.longitude, OUTLOOK_HOURS
    )
}

pub fn build_flood_url(base: &str, coords: &Coordinates) -> String {
    format!(
        "{}?latitude={:.4}&longitude={:.4}&daily=river_discharge&past_days={}&forecast_days=1",
        base, coords.latitude, coords.longitude, HISTORY_DAYS
    )
}

// ---------------------------------------------------------------------------
// Weather parsing
// ---------------------------------------------------------------------------

/// WMO weather interpretation code to a short label.
pub fn describe_weather_code(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1..=3 => "Partly cloudy",
        45 | 48 => "Fog",
        51..=57 => "Drizzle",
        61 | 66 => "Light rain",
        63 => "Rain",
        65 | 67 => "Heavy rain",
        71..=77 => "Snow",
        80 | 81 => "Rain showers",
        82 => "Violent rain showers",
        95..=99 => "Thunderstorm",
        _ => "Unknown",
    }
}

/// Derives the 24-hour rainfall outlook from hourly amounts (mm), starting
/// at the current hour. `current_rate` joins the hourly peak when picking
/// the intensity band.
pub fn analyze_rainfall(
    hourly_mm: &[f64],
    current_rate: f64,
    thresholds: &PrecipitationThresholds,
) -> RainfallAnalysis {
    let window = &hourly_mm[..hourly_mm.len().min(OUTLOOK_HOURS)];

    let duration = window.iter().take_while(|mm| **mm > RAINY_HOUR_MM).count();
    let total: f64 = window.iter().sum();

    let mut periods = 0u32;
    let mut in_period = false;
    for mm in window {
        let rainy = *mm > RAINY_HOUR_MM;
        if rainy && !in_period {
            periods += 1;
        }
        in_period = rainy;
    }

    let peak = window.iter().copied().fold(current_rate, f64::max);
    let intensity = thresholds.band_for(peak);

    let description = if periods == 0 {
        "No significant rainfall expected in the next 24 hours.".to_string()
    } else if intensity == PrecipitationBand::None {
        format!(
            "Trace rainfall expected: {:.1} mm over the next 24 hours in {} period(s).",
            total, periods
        )
    } else {
        format!(
            "{} rainfall expected: {:.1} mm over the next 24 hours in {} period(s), peaking at {:.1} mm/h.",
            intensity_word(intensity),
            total,
            periods,
            peak
        )
    };

    RainfallAnalysis {
        description,
        intensity,
        duration_hours: duration as f64,
        total_expected_mm: total,
        periods_count: periods,
    }
}

fn intensity_word(band: PrecipitationBand) -> &'static str {
    match band {
        PrecipitationBand::Extreme => "Extreme",
        PrecipitationBand::Heavy => "Heavy",
        PrecipitationBand::Moderate => "Moderate",
        PrecipitationBand::Light => "Light",
        PrecipitationBand::None => "Trace",
    }
}

/// Parses a forecast response body into a `WeatherReading`.
///
/// Missing optional current fields fall back to neutral values; a missing
/// `current` block is an error because nothing downstream can be scored
/// without it.
pub fn parse_weather_response(
    json: &str,
    thresholds: &PrecipitationThresholds,
) -> Result<WeatherReading, FloodRiskError> {
    let response: ForecastResponse = serde_json::from_str(json).map_err(|e| {
        FloodRiskError::unavailable(SourceKind::Weather, format!("JSON deserialization failed: {}", e))
    })?;

    let current = response
        .current
        .ok_or_else(|| FloodRiskError::unavailable(SourceKind::Weather, "response has no current block"))?;

    let current = CurrentConditions {
        temperature_c: current.temperature_2m.unwrap_or(0.0),
        precipitation_mm_h: current.precipitation.unwrap_or(0.0),
        humidity_pct: current.relative_humidity_2m.unwrap_or(0.0),
        wind_speed_kmh: current.wind_speed_10m.unwrap_or(0.0),
        pressure_hpa: current.pressure_msl.unwrap_or(1013.25),
        conditions: current
            .weather_code
            .map(describe_weather_code)
            .unwrap_or("Unknown")
            .to_string(),
    };

    let hourly: Vec<HourlyForecast> = match response.hourly {
        Some(block) => block
            .time
            .into_iter()
            .enumerate()
            .take(OUTLOOK_HOURS)
            .map(|(i, time)| HourlyForecast {
                time,
                precipitation_mm: block.precipitation.get(i).copied().flatten().unwrap_or(0.0),
                precipitation_probability_pct: block.precipitation_probability.get(i).copied().flatten(),
            })
            .collect(),
        None => Vec::new(),
    };

    let daily: Vec<DailyForecast> = match response.daily {
        Some(block) => block
            .time
            .into_iter()
            .enumerate()
            .map(|(i, date)| DailyForecast {
                date,
                precipitation_sum_mm: block.precipitation_sum.get(i).copied().flatten().unwrap_or(0.0),
                temperature_max_c: block.temperature_2m_max.get(i).copied().flatten(),
                temperature_min_c: block.temperature_2m_min.get(i).copied().flatten(),
            })
            .collect(),
        None => Vec::new(),
    };

    let amounts: Vec<f64> = hourly.iter().map(|h| h.precipitation_mm).collect();
    let analysis = analyze_rainfall(&amounts, current.precipitation_mm_h, thresholds);

    Ok(WeatherReading {
        current,
        forecast: WeatherForecast { hourly, daily },
        analysis,
    })
}

// ---------------------------------------------------------------------------
// River parsing
// ---------------------------------------------------------------------------

/// Percentage of `history` strictly below `value`. An empty history puts
/// the value at the median.
pub fn percentile_of(value: f64, history: &[f64]) -> f64 {
    if history.is_empty() {
        return 50.0;
    }
    let below = history.iter().filter(|h| **h < value).count();
    below as f64 / history.len() as f64 * 100.0
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn status_label(percentile: f64) -> &'static str {
    if percentile >= 95.0 {
        "high"
    } else if percentile >= 75.0 {
        "above normal"
    } else if percentile >= 25.0 {
        "normal"
    } else {
        "low"
    }
}

/// Parses a flood API body. The last non-null entry is today's discharge;
/// everything before it is the history it is ranked against.
pub fn parse_flood_response(json: &str) -> Result<RiverReading, FloodRiskError> {
    let response: FloodResponse = serde_json::from_str(json).map_err(|e| {
        FloodRiskError::unavailable(SourceKind::River, format!("JSON deserialization failed: {}", e))
    })?;

    let daily = response
        .daily
        .ok_or_else(|| FloodRiskError::unavailable(SourceKind::River, "response has no daily block"))?;

    let points: Vec<DischargePoint> = daily
        .time
        .into_iter()
        .zip(daily.river_discharge)
        .filter_map(|(date, q)| q.map(|discharge_m3s| DischargePoint { date, discharge_m3s }))
        .collect();

    let (today, history) = match points.split_last() {
        Some((today, history)) => (today.discharge_m3s, history),
        None => {
            return Err(FloodRiskError::unavailable(
                SourceKind::River,
                "no river discharge values at this location",
            ));
        }
    };

    let values: Vec<f64> = if history.is_empty() {
        vec![today]
    } else {
        history.iter().map(|p| p.discharge_m3s).collect()
    };
    let historical: Vec<f64> = history.iter().map(|p| p.discharge_m3s).collect();

    let percentile = percentile_of(today, &historical);
    let average = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let status = status_label(percentile);

    let statistics = DischargeStatistics {
        percentile,
        average,
        median: median(&values),
        min,
        max,
        status: status.to_string(),
        description: format!(
            "Discharge of {:.1} m³/s ranks at the {:.0}th percentile of the previous {} days ({}).",
            today,
            percentile,
            historical.len(),
            status
        ),
    };

    Ok(RiverReading {
        current_discharge_m3s: today,
        statistics,
        data_points: points,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenMeteoClient {
    http: Client,
    weather_url: String,
    flood_url: String,
    thresholds: PrecipitationThresholds,
}

impl OpenMeteoClient {
    pub fn new(
        sources: &SourcesConfig,
        thresholds: PrecipitationThresholds,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(sources.timeout())?,
            weather_url: sources.weather_url.clone(),
            flood_url: sources.flood_url.clone(),
            thresholds,
        })
    }
}

impl WeatherSource for OpenMeteoClient {
    fn fetch_weather(&self, coords: &Coordinates) -> Result<WeatherReading, FloodRiskError> {
        let url = build_forecast_url(&self.weather_url, coords);
        let body = fetch_body(&self.http, &url, SourceKind::Weather)?;
        let reading = parse_weather_response(&body, &self.thresholds)?;
        debug!(
            precipitation = reading.current.precipitation_mm_h,
            duration_hours = reading.analysis.duration_hours,
            "weather reading parsed"
        );
        Ok(reading)
    }
}

impl RiverSource for OpenMeteoClient {
    fn fetch_river_history(&self, coords: &Coordinates) -> Result<RiverReading, FloodRiskError> {
        let url = build_flood_url(&self.flood_url, coords);
        let body = fetch_body(&self.http, &url, SourceKind::River)?;
        let reading = parse_flood_response(&body)?;
        debug!(
            discharge = reading.current_discharge_m3s,
            percentile = reading.statistics.percentile,
            "river reading parsed"
        );
        Ok(reading)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;

    fn kl() -> Coordinates {
        Coordinates::new(3.139, 101.687).unwrap()
    }

    // --- URL construction ---------------------------------------------------

    #[test]
    fn test_forecast_url_requests_all_blocks() {
        let url = build_forecast_url("https://api.open-meteo.com/v1/forecast", &kl());
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?"));
        assert!(url.contains("latitude=3.1390"));
        assert!(url.contains("longitude=101.6870"));
        assert!(url.contains("current="), "must request current conditions");
        assert!(url.contains("pressure_msl"));
        assert!(!url.contains("surface_pressure"), "station pressure reads low at altitude");
        assert!(url.contains("hourly=precipitation"));
        assert!(url.contains("daily=precipitation_sum"));
        assert!(url.contains("forecast_hours=24"));
        assert!(!url.contains(' '), "no whitespace from line continuations: {}", url);
    }

    #[test]
    fn test_flood_url_requests_history() {
        let url = build_flood_url("https://flood-api.open-meteo.com/v1/flood", &kl());
        assert!(url.contains("daily=river_discharge"));
        assert!(url.contains(&format!("past_days={}", HISTORY_DAYS)));
    }

    // --- Rainfall analysis --------------------------------------------------

    #[test]
    fn test_duration_counts_leading_rainy_hours_only() {
        let t = PrecipitationThresholds::default();
        let hours = [3.0, 2.0, 0.5, 0.0, 4.0, 4.0];
        let analysis = analyze_rainfall(&hours, 3.0, &t);
        assert_eq!(analysis.duration_hours, 3.0);
        assert_eq!(analysis.periods_count, 2);
        assert!((analysis.total_expected_mm - 13.5).abs() < 1e-9);
    }

    #[test]
    fn test_trace_amounts_are_not_rainy() {
        let t = PrecipitationThresholds::default();
        let hours = [0.1, 0.1, 0.05];
        let analysis = analyze_rainfall(&hours, 0.0, &t);
        assert_eq!(analysis.duration_hours, 0.0);
        assert_eq!(analysis.periods_count, 0);
        assert_eq!(analysis.intensity, PrecipitationBand::None);
        assert!(analysis.description.starts_with("No significant"));
    }

    #[test]
    fn test_intensity_uses_peak_of_outlook_and_current() {
        let t = PrecipitationThresholds::default();
        let analysis = analyze_rainfall(&[1.0, 2.0], 20.0, &t);
        assert_eq!(analysis.intensity, PrecipitationBand::Heavy);
        assert!(analysis.description.starts_with("Heavy"));
    }

    #[test]
    fn test_outlook_is_capped_at_24_hours() {
        let t = PrecipitationThresholds::default();
        let hours = vec![1.0; 48];
        let analysis = analyze_rainfall(&hours, 1.0, &t);
        assert_eq!(analysis.duration_hours, 24.0);
        assert!((analysis.total_expected_mm - 24.0).abs() < 1e-9);
    }

    // --- Weather parsing ----------------------------------------------------

    #[test]
    fn test_parse_weather_fixture() {
        let reading =
            parse_weather_response(fixture_forecast_monsoon_json(), &PrecipitationThresholds::default())
                .expect("fixture should parse");

        assert_eq!(reading.current.precipitation_mm_h, 18.4);
        assert_eq!(reading.current.humidity_pct, 94.0);
        assert_eq!(reading.current.pressure_hpa, 1003.1, "sea-level, not surface, pressure");
        assert_eq!(reading.current.conditions, "Heavy rain");
        assert_eq!(reading.forecast.hourly.len(), 6);
        assert_eq!(reading.forecast.hourly[3].precipitation_mm, 0.0, "null becomes 0");
        assert_eq!(reading.forecast.daily.len(), 2);
        assert_eq!(reading.analysis.duration_hours, 3.0);
        assert_eq!(reading.analysis.periods_count, 2);
    }

    #[test]
    fn test_parse_weather_without_current_block_is_unavailable() {
        let err = parse_weather_response(r#"{"hourly": {"time": []}}"#, &PrecipitationThresholds::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FloodRiskError::SourceUnavailable { source_kind: SourceKind::Weather, .. }
        ));
    }

    #[test]
    fn test_parse_weather_garbage_is_unavailable() {
        let err = parse_weather_response("<html>", &PrecipitationThresholds::default()).unwrap_err();
        assert!(err.to_string().contains("weather source unavailable"));
    }

    // --- River parsing ------------------------------------------------------

    #[test]
    fn test_percentile_of() {
        let history = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_of(0.5, &history), 0.0);
        assert_eq!(percentile_of(2.0, &history), 25.0);
        assert_eq!(percentile_of(10.0, &history), 100.0);
        assert_eq!(percentile_of(1.0, &[]), 50.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_parse_flood_fixture() {
        let reading = parse_flood_response(fixture_flood_rising_json()).expect("fixture should parse");

        assert_eq!(reading.current_discharge_m3s, 412.0);
        assert_eq!(reading.data_points.len(), 5, "null entry is dropped");
        let stats = &reading.statistics;
        assert_eq!(stats.percentile, 100.0);
        assert_eq!(stats.max, 260.0);
        assert_eq!(stats.min, 120.0);
        assert!((stats.average - 187.5).abs() < 1e-9);
        assert_eq!(stats.median, 185.0);
        assert_eq!(stats.status, "high");
    }

    #[test]
    fn test_parse_flood_all_null_is_unavailable() {
        let json = r#"{"daily": {"time": ["2024-01-01", "2024-01-02"], "river_discharge": [null, null]}}"#;
        let err = parse_flood_response(json).unwrap_err();
        assert!(matches!(
            err,
            FloodRiskError::SourceUnavailable { source_kind: SourceKind::River, .. }
        ));
    }

    #[test]
    fn test_parse_flood_single_day_sits_at_median() {
        let json = r#"{"daily": {"time": ["2024-01-02"], "river_discharge": [75.0]}}"#;
        let reading = parse_flood_response(json).unwrap();
        assert_eq!(reading.statistics.percentile, 50.0);
        assert_eq!(reading.statistics.average, 75.0);
    }
}
