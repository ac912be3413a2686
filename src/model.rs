//! Shared data types: upstream readings, per-domain analyses, the composite
//! verdict and the report that carries them all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FloodRiskError;
use crate::thresholds::{PrecipitationBand, RiverLevelStatus};

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A validated WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validates ranges. This is the only place `InvalidInput` is produced.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FloodRiskError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(FloodRiskError::InvalidInput(format!(
                "latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(FloodRiskError::InvalidInput(format!(
                "longitude {} is outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// `lat:lon` at 4 decimal places (~11 m), used in cache keys.
    pub fn key_fragment(&self) -> String {
        format!("{:.4}:{:.4}", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub precipitation_mm_h: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub pressure_hpa: f64,
    pub conditions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: String,
    pub precipitation_mm: f64,
    pub precipitation_probability_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub precipitation_sum_mm: f64,
    pub temperature_max_c: Option<f64>,
    pub temperature_min_c: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub hourly: Vec<HourlyForecast>,
    pub daily: Vec<DailyForecast>,
}

/// Provider-side summary of the rainfall outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallAnalysis {
    pub description: String,
    pub intensity: PrecipitationBand,
    /// Hours of continuous rain from now.
    pub duration_hours: f64,
    pub total_expected_mm: f64,
    pub periods_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub current: CurrentConditions,
    pub forecast: WeatherForecast,
    pub analysis: RainfallAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargeStatistics {
    pub percentile: f64,
    pub average: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargePoint {
    pub date: String,
    pub discharge_m3s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverReading {
    pub current_discharge_m3s: f64,
    pub statistics: DischargeStatistics,
    pub data_points: Vec<DischargePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationReading {
    pub elevation_m: f64,
}

/// One upstream measurement, as stored in the reading cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    Weather(WeatherReading),
    River(RiverReading),
    Elevation(ElevationReading),
}

// ---------------------------------------------------------------------------
// Domain analyses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSeverity {
    Low,
    Moderate,
    Severe,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAnalysis {
    pub severity: WeatherSeverity,
    pub description: String,
    pub factors: Vec<String>,
    pub score: f64,
    pub precipitation_band: PrecipitationBand,
}

/// Visual indicator band for river discharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiverLevel {
    Low,
    Normal,
    AboveNormal,
    High,
    VeryHigh,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiverSeverity {
    Minimal,
    Low,
    Moderate,
    Severe,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Stable,
    Falling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverAnalysis {
    pub level: RiverLevel,
    pub severity: RiverSeverity,
    pub trend: Trend,
    pub status: RiverLevelStatus,
    pub description: String,
    pub factors: Vec<String>,
    pub score: f64,
    pub percentile: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainRisk {
    Minimal,
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographyAnalysis {
    pub risk: TerrainRisk,
    pub description: String,
    pub mitigating_factors: Vec<String>,
    pub amplifying_factors: Vec<String>,
    pub score: f64,
    pub elevation_m: f64,
}

// ---------------------------------------------------------------------------
// Composite verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Very Low",
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub weather: f64,
    pub river: f64,
    pub geographical: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRisk {
    pub score: f64,
    pub risk_level: RiskLevel,
    pub confidence: String,
    pub summary: String,
    pub components: ComponentScores,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPlace {
    pub name: String,
    /// Planar distance converted at 111.32 km per degree.
    pub distance_km: f64,
    pub coastal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub region: String,
    pub nearest_place: Option<NearbyPlace>,
    pub within_service_area: bool,
}

/// Everything the presentation layer needs for one point. Built once per
/// request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalReport {
    pub coordinates: Coordinates,
    pub flood_probability: f64,
    pub weather_conditions: WeatherAnalysis,
    pub river_status: RiverAnalysis,
    pub geographical_factors: GeographyAnalysis,
    pub composite_risk: CompositeRisk,
    pub location: LocationSummary,
    pub generated_at: DateTime<Utc>,
    pub is_mock: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
