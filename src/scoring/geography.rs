//! Terrain scoring from elevation and proximity context.

use serde::{Deserialize, Serialize};

use crate::model::{ElevationReading, GeographyAnalysis, TerrainRisk};

/// Proximity facts supplied by the location classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainContext {
    pub near_coast: bool,
    pub near_urban_centre: bool,
}

pub fn terrain_risk(elevation_m: f64) -> TerrainRisk {
    if elevation_m < 10.0 {
        TerrainRisk::Critical
    } else if elevation_m < 50.0 {
        TerrainRisk::High
    } else if elevation_m < 100.0 {
        TerrainRisk::Moderate
    } else if elevation_m < 200.0 {
        TerrainRisk::Low
    } else {
        TerrainRisk::Minimal
    }
}

fn description_for(risk: TerrainRisk, elevation_m: f64) -> String {
    match risk {
        TerrainRisk::Critical => format!(
            "At {:.0} m the site is barely above sea or river level; water collects here first.",
            elevation_m
        ),
        TerrainRisk::High => format!(
            "At {:.0} m the site is low-lying and exposed to riverine and surface flooding.",
            elevation_m
        ),
        TerrainRisk::Moderate => format!(
            "At {:.0} m the site has moderate elevation; flooding needs sustained heavy rain.",
            elevation_m
        ),
        TerrainRisk::Low => format!(
            "At {:.0} m the terrain sits comfortably above typical flood levels.",
            elevation_m
        ),
        TerrainRisk::Minimal => format!(
            "At {:.0} m the terrain is well above flood-prone ground.",
            elevation_m
        ),
    }
}

/// Finer elevation bands than `terrain_risk`.
pub fn geography_score(elevation_m: f64) -> f64 {
    if elevation_m < 5.0 {
        90.0
    } else if elevation_m < 10.0 {
        80.0
    } else if elevation_m < 25.0 {
        70.0
    } else if elevation_m < 50.0 {
        55.0
    } else if elevation_m < 100.0 {
        40.0
    } else if elevation_m < 200.0 {
        25.0
    } else {
        15.0
    }
}

pub fn analyze_geography(
    reading: &ElevationReading,
    context: &TerrainContext,
    flood_probability: f64,
) -> GeographyAnalysis {
    let elevation = reading.elevation_m;
    let risk = terrain_risk(elevation);

    let mut mitigating = Vec::new();
    let mut amplifying = Vec::new();

    if elevation > 100.0 {
        mitigating.push(format!("Elevated terrain ({:.0} m) drains quickly", elevation));
    }
    if elevation < 50.0 {
        amplifying.push(format!("Low-lying terrain ({:.0} m) collects runoff", elevation));
    }
    if context.near_coast {
        amplifying.push("Coastal proximity adds tidal and storm-surge exposure".to_string());
    }
    if context.near_urban_centre {
        amplifying.push("Urban surroundings: impervious surfaces increase runoff".to_string());
    }

    let mut description = description_for(risk, elevation);
    if flood_probability > 0.6 && !amplifying.is_empty() {
        description.push_str(" Local terrain is likely to worsen the current flood outlook.");
    }

    GeographyAnalysis {
        risk,
        description,
        mitigating_factors: mitigating,
        amplifying_factors: amplifying,
        score: geography_score(elevation),
        elevation_m: elevation,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn at(m: f64) -> ElevationReading {
        ElevationReading { elevation_m: m }
    }

    #[test]
    fn test_terrain_bands_exact_at_boundaries() {
        assert_eq!(terrain_risk(9.999), TerrainRisk::Critical);
        assert_eq!(terrain_risk(10.0), TerrainRisk::High);
        assert_eq!(terrain_risk(49.999), TerrainRisk::High);
        assert_eq!(terrain_risk(50.0), TerrainRisk::Moderate);
        assert_eq!(terrain_risk(100.0), TerrainRisk::Low);
        assert_eq!(terrain_risk(199.999), TerrainRisk::Low);
        assert_eq!(terrain_risk(200.0), TerrainRisk::Minimal);
    }

    #[test]
    fn test_score_bands() {
        let cases = [
            (0.0, 90.0),
            (4.999, 90.0),
            (5.0, 80.0),
            (9.999, 80.0),
            (10.0, 70.0),
            (25.0, 55.0),
            (50.0, 40.0),
            (100.0, 25.0),
            (200.0, 15.0),
            (1500.0, 15.0),
        ];
        for (elevation, expected) in cases {
            assert_eq!(geography_score(elevation), expected, "elevation {}", elevation);
        }
    }

    #[test]
    fn test_factors_co_occur() {
        let ctx = TerrainContext {
            near_coast: true,
            near_urban_centre: true,
        };
        let analysis = analyze_geography(&at(8.0), &ctx, 0.9);
        assert_eq!(analysis.risk, TerrainRisk::Critical);
        assert_eq!(analysis.amplifying_factors.len(), 3, "got: {:?}", analysis.amplifying_factors);
        assert!(analysis.mitigating_factors.is_empty());
        assert!(analysis.description.contains("worsen"));
    }

    #[test]
    fn test_high_ground_is_mitigating_only() {
        let analysis = analyze_geography(&at(350.0), &TerrainContext::default(), 0.9);
        assert_eq!(analysis.risk, TerrainRisk::Minimal);
        assert_eq!(analysis.mitigating_factors.len(), 1);
        assert!(analysis.amplifying_factors.is_empty());
        assert_eq!(analysis.score, 15.0);
    }

    #[test]
    fn test_elevation_100_is_neither_mitigating_nor_low_lying() {
        let analysis = analyze_geography(&at(100.0), &TerrainContext::default(), 0.1);
        assert!(analysis.mitigating_factors.is_empty(), "mitigation needs > 100 m");
        assert!(analysis.amplifying_factors.is_empty());
    }
}
