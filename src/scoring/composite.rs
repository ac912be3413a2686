//! Composite flood risk: fixed weights, clamped score, stepped risk level.

use crate::model::{ComponentScores, CompositeRisk, RiskLevel};

pub const WEATHER_WEIGHT: f64 = 0.40;
pub const RIVER_WEIGHT: f64 = 0.35;
pub const GEOGRAPHY_WEIGHT: f64 = 0.25;

pub fn composite_score(weather: f64, river: f64, geography: f64) -> f64 {
    let score = WEATHER_WEIGHT * weather + RIVER_WEIGHT * river + GEOGRAPHY_WEIGHT * geography;
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}

pub fn risk_level_for(score: f64) -> RiskLevel {
    if score >= 85.0 {
        RiskLevel::Critical
    } else if score >= 70.0 {
        RiskLevel::High
    } else if score >= 50.0 {
        RiskLevel::Moderate
    } else if score >= 30.0 {
        RiskLevel::Low
    } else {
        RiskLevel::VeryLow
    }
}

/// Confidence label and summary sentence for each level.
fn narrative(level: RiskLevel) -> (&'static str, &'static str) {
    match level {
        RiskLevel::Critical => (
            "Very High",
            "Critical flood risk: conditions point to imminent flooding. Move to higher ground and follow official warnings.",
        ),
        RiskLevel::High => (
            "High",
            "High flood risk: flooding is likely. Prepare to evacuate low-lying areas and protect property.",
        ),
        RiskLevel::Moderate => (
            "Moderate",
            "Moderate flood risk: localized flooding is possible. Stay alert and avoid flood-prone routes.",
        ),
        RiskLevel::Low => (
            "Moderate",
            "Low flood risk: minor ponding may occur in poorly drained spots.",
        ),
        RiskLevel::VeryLow => (
            "High",
            "Very low flood risk: no significant flooding expected.",
        ),
    }
}

pub fn composite_risk(weather: f64, river: f64, geography: f64) -> CompositeRisk {
    let score = composite_score(weather, river, geography);
    let risk_level = risk_level_for(score);
    let (confidence, summary) = narrative(risk_level);
    CompositeRisk {
        score,
        risk_level,
        confidence: confidence.to_string(),
        summary: summary.to_string(),
        components: ComponentScores {
            weather,
            river,
            geographical: geography,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        assert!((WEATHER_WEIGHT + RIVER_WEIGHT + GEOGRAPHY_WEIGHT - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_exactly() {
        let expected = 0.40 * 80.0 + 0.35 * 95.0 + 0.25 * 80.0;
        assert!((composite_score(80.0, 95.0, 80.0) - expected).abs() < 1e-9);
        assert!((composite_score(10.0, 40.0, 70.0) - (4.0 + 14.0 + 17.5)).abs() < 1e-9);
    }

    #[test]
    fn test_extremes_stay_in_range() {
        assert_eq!(composite_score(0.0, 0.0, 0.0), 0.0);
        assert!((composite_score(100.0, 100.0, 100.0) - 100.0).abs() < 1e-9);
        assert_eq!(composite_score(500.0, 500.0, 500.0), 100.0);
        assert_eq!(composite_score(-50.0, 0.0, 0.0), 0.0);
        assert_eq!(composite_score(f64::NAN, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(risk_level_for(85.0), RiskLevel::Critical);
        assert_eq!(risk_level_for(84.999), RiskLevel::High);
        assert_eq!(risk_level_for(70.0), RiskLevel::High);
        assert_eq!(risk_level_for(69.9), RiskLevel::Moderate);
        assert_eq!(risk_level_for(50.0), RiskLevel::Moderate);
        assert_eq!(risk_level_for(30.0), RiskLevel::Low);
        assert_eq!(risk_level_for(29.9), RiskLevel::VeryLow);
        assert_eq!(risk_level_for(0.0), RiskLevel::VeryLow);
    }

    #[test]
    fn test_composite_carries_components_and_narrative() {
        let risk = composite_risk(80.0, 95.0, 80.0);
        assert_eq!(risk.risk_level, RiskLevel::Critical);
        assert_eq!(risk.confidence, "Very High");
        assert!(risk.summary.starts_with("Critical"));
        assert_eq!(risk.components.river, 95.0);
    }
}
