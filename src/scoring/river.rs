//! River discharge scoring.
//!
//! Classification is driven by where today's discharge sits in the
//! historical distribution (percentile), not by the absolute flow, so the
//! same bands work for a creek and a major river.

use crate::model::{RiverAnalysis, RiverLevel, RiverReading, RiverSeverity, Trend};
use crate::thresholds::RiverLevelThresholds;

const RISING_RATIO: f64 = 1.2;
const FALLING_RATIO: f64 = 0.8;

/// Indicator band and severity for a discharge percentile.
pub fn classify_percentile(percentile: f64) -> (RiverLevel, RiverSeverity) {
    if percentile >= 98.0 {
        (RiverLevel::Extreme, RiverSeverity::Critical)
    } else if percentile >= 95.0 {
        (RiverLevel::VeryHigh, RiverSeverity::Severe)
    } else if percentile >= 90.0 {
        (RiverLevel::High, RiverSeverity::Moderate)
    } else if percentile >= 75.0 {
        (RiverLevel::AboveNormal, RiverSeverity::Low)
    } else if percentile >= 25.0 {
        (RiverLevel::Normal, RiverSeverity::Minimal)
    } else {
        (RiverLevel::Low, RiverSeverity::Minimal)
    }
}

/// Rising above 120% of the historical average, falling below 80%.
pub fn trend_for(current: f64, average: f64) -> Trend {
    if average <= 0.0 || !average.is_finite() {
        return Trend::Stable;
    }
    if current > RISING_RATIO * average {
        Trend::Rising
    } else if current < FALLING_RATIO * average {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

pub fn river_score(percentile: f64) -> f64 {
    if percentile >= 98.0 {
        95.0
    } else if percentile >= 95.0 {
        85.0
    } else if percentile >= 90.0 {
        75.0
    } else if percentile >= 75.0 {
        60.0
    } else if percentile >= 50.0 {
        40.0
    } else if percentile >= 25.0 {
        25.0
    } else {
        10.0
    }
}

fn description_for(level: RiverLevel, percentile: f64) -> String {
    match level {
        RiverLevel::Extreme => format!(
            "River discharge is extreme ({:.0}th percentile); overbank flooding is likely.",
            percentile
        ),
        RiverLevel::VeryHigh => format!(
            "River discharge is very high ({:.0}th percentile); banks are near capacity.",
            percentile
        ),
        RiverLevel::High => format!(
            "River discharge is high ({:.0}th percentile); monitor for further rises.",
            percentile
        ),
        RiverLevel::AboveNormal => format!(
            "River discharge is above normal ({:.0}th percentile).",
            percentile
        ),
        RiverLevel::Normal => format!(
            "River discharge is within the normal range ({:.0}th percentile).",
            percentile
        ),
        RiverLevel::Low => format!(
            "River discharge is below normal ({:.0}th percentile).",
            percentile
        ),
    }
}

pub fn analyze_river(
    reading: &RiverReading,
    flood_probability: f64,
    thresholds: &RiverLevelThresholds,
) -> RiverAnalysis {
    let stats = &reading.statistics;
    let percentile = stats.percentile;
    let (level, severity) = classify_percentile(percentile);
    let trend = trend_for(reading.current_discharge_m3s, stats.average);
    let status = thresholds.status_for(percentile);

    let mut factors = Vec::new();
    factors.push(format!(
        "Current discharge {:.1} m³/s vs historical average {:.1} m³/s",
        reading.current_discharge_m3s, stats.average
    ));
    match trend {
        Trend::Rising => factors.push("Discharge rising well above the historical average".to_string()),
        Trend::Falling => factors.push("Discharge falling below the historical average".to_string()),
        Trend::Stable => {}
    }
    if stats.max > 0.0 && reading.current_discharge_m3s >= stats.max {
        factors.push("Discharge at or above the recorded maximum".to_string());
    }
    if flood_probability > 0.6 && percentile >= 90.0 {
        factors.push("High river flow coincides with an elevated flood probability".to_string());
    }

    RiverAnalysis {
        level,
        severity,
        trend,
        status,
        description: description_for(level, percentile),
        factors,
        score: river_score(percentile),
        percentile,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
