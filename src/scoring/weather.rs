//! Weather domain scoring.
//!
//! Severity comes from the flood probability, not the reading. The reading
//! drives the contributing factors and the 0–100 sub-score, which is built
//! from three weighted parts:
//!
//! | part                    | max |
//! |-------------------------|-----|
//! | precipitation band      |  40 |
//! | rainfall duration       |  25 |
//! | humidity / pressure     |  35 |

use crate::model::{WeatherAnalysis, WeatherReading, WeatherSeverity};
use crate::thresholds::{PrecipitationBand, PrecipitationThresholds};

const HUMIDITY_VERY_HIGH: f64 = 90.0;
const HUMIDITY_HIGH: f64 = 85.0;
const LOW_PRESSURE_HPA: f64 = 1005.0;
const STRONG_WIND_KMH: f64 = 20.0;

pub fn severity_for_probability(flood_probability: f64) -> WeatherSeverity {
    if flood_probability > 0.8 {
        WeatherSeverity::Critical
    } else if flood_probability > 0.6 {
        WeatherSeverity::Severe
    } else if flood_probability > 0.4 {
        WeatherSeverity::Moderate
    } else {
        WeatherSeverity::Low
    }
}

fn description_for(severity: WeatherSeverity) -> &'static str {
    match severity {
        WeatherSeverity::Critical => {
            "Critical weather conditions: intense rainfall is likely to overwhelm drainage and trigger flash flooding."
        }
        WeatherSeverity::Severe => {
            "Severe weather conditions: sustained heavy rain could cause localized flooding in low-lying areas."
        }
        WeatherSeverity::Moderate => {
            "Moderate weather conditions: rainfall may cause ponding and minor drainage issues."
        }
        WeatherSeverity::Low => "Weather conditions pose a low flood threat at present.",
    }
}

/// Factors checked in a fixed order; every match is reported.
pub fn contributing_factors(
    reading: &WeatherReading,
    thresholds: &PrecipitationThresholds,
) -> Vec<String> {
    let c = &reading.current;
    let mut factors = Vec::new();

    if c.precipitation_mm_h > thresholds.moderate {
        factors.push(format!("Heavy rainfall of {:.1} mm/h", c.precipitation_mm_h));
    } else if c.precipitation_mm_h > thresholds.light {
        factors.push(format!("Moderate rainfall of {:.1} mm/h", c.precipitation_mm_h));
    }

    if c.humidity_pct > HUMIDITY_VERY_HIGH {
        factors.push(format!("Very high humidity ({:.0}%) signals saturated air", c.humidity_pct));
    } else if c.humidity_pct > HUMIDITY_HIGH {
        factors.push(format!("High humidity ({:.0}%)", c.humidity_pct));
    }

    if c.pressure_hpa < LOW_PRESSURE_HPA {
        factors.push(format!("Low pressure system ({:.0} hPa)", c.pressure_hpa));
    }

    if c.wind_speed_kmh > STRONG_WIND_KMH {
        factors.push(format!("Strong winds ({:.0} km/h)", c.wind_speed_kmh));
    }

    factors
}

pub fn precipitation_points(band: PrecipitationBand) -> f64 {
    match band {
        PrecipitationBand::Extreme => 40.0,
        PrecipitationBand::Heavy => 30.0,
        PrecipitationBand::Moderate => 20.0,
        PrecipitationBand::Light => 10.0,
        PrecipitationBand::None => 0.0,
    }
}

pub fn duration_points(duration_hours: f64) -> f64 {
    if duration_hours > 12.0 {
        25.0
    } else if duration_hours > 6.0 {
        18.0
    } else if duration_hours > 3.0 {
        12.0
    } else if duration_hours > 1.0 {
        6.0
    } else {
        0.0
    }
}

pub fn atmosphere_points(humidity_pct: f64, pressure_hpa: f64) -> f64 {
    if humidity_pct > 95.0 && pressure_hpa < 1000.0 {
        35.0
    } else if humidity_pct > 90.0 && pressure_hpa < 1005.0 {
        25.0
    } else if humidity_pct > 85.0 {
        15.0
    } else if humidity_pct > 80.0 {
        8.0
    } else {
        0.0
    }
}

pub fn weather_score(reading: &WeatherReading, thresholds: &PrecipitationThresholds) -> f64 {
    let c = &reading.current;
    let band = thresholds.band_for(c.precipitation_mm_h);
    let total = precipitation_points(band)
        + duration_points(reading.analysis.duration_hours)
        + atmosphere_points(c.humidity_pct, c.pressure_hpa);
    total.clamp(0.0, 100.0)
}

pub fn analyze_weather(
    reading: &WeatherReading,
    flood_probability: f64,
    thresholds: &PrecipitationThresholds,
) -> WeatherAnalysis {
    let severity = severity_for_probability(flood_probability);
    WeatherAnalysis {
        severity,
        description: description_for(severity).to_string(),
        factors: contributing_factors(reading, thresholds),
        score: weather_score(reading, thresholds),
        precipitation_band: thresholds.band_for(reading.current.precipitation_mm_h),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
