//! Threshold tables for precipitation intensity and river level.
//!
//! Pure data plus the banding lookups over it. Defaults can be overridden
//! from the `[thresholds]` section of floodrisk.toml (see `config`).

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Precipitation (mm/h)
// ---------------------------------------------------------------------------

/// Lower bounds of each precipitation intensity band in mm/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecipitationThresholds {
    pub light: f64,
    pub moderate: f64,
    pub heavy: f64,
    pub extreme: f64,
}

impl Default for PrecipitationThresholds {
    fn default() -> Self {
        Self {
            light: 2.5,
            moderate: 7.6,
            heavy: 15.0,
            extreme: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrecipitationBand {
    None,
    Light,
    Moderate,
    Heavy,
    Extreme,
}

impl PrecipitationBand {
    pub fn label(&self) -> &'static str {
        match self {
            PrecipitationBand::None => "NONE",
            PrecipitationBand::Light => "LIGHT",
            PrecipitationBand::Moderate => "MODERATE",
            PrecipitationBand::Heavy => "HEAVY",
            PrecipitationBand::Extreme => "EXTREME",
        }
    }
}

impl fmt::Display for PrecipitationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl PrecipitationThresholds {
    /// Band for a precipitation rate. Each band starts at its threshold (inclusive).
    pub fn band_for(&self, mm_per_hour: f64) -> PrecipitationBand {
        if mm_per_hour >= self.extreme {
            PrecipitationBand::Extreme
        } else if mm_per_hour >= self.heavy {
            PrecipitationBand::Heavy
        } else if mm_per_hour >= self.moderate {
            PrecipitationBand::Moderate
        } else if mm_per_hour >= self.light {
            PrecipitationBand::Light
        } else {
            PrecipitationBand::None
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.light < self.moderate && self.moderate < self.heavy && self.heavy < self.extreme
    }
}

// ---------------------------------------------------------------------------
// River level (discharge percentile)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverLevelThresholds {
    pub warning_percentile: f64,
    pub danger_percentile: f64,
}

impl Default for RiverLevelThresholds {
    fn default() -> Self {
        Self {
            warning_percentile: 90.0,
            danger_percentile: 95.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiverLevelStatus {
    Normal,
    Warning,
    Danger,
}

impl RiverLevelStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RiverLevelStatus::Normal => "NORMAL",
            RiverLevelStatus::Warning => "WARNING",
            RiverLevelStatus::Danger => "DANGER",
        }
    }
}

impl fmt::Display for RiverLevelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl RiverLevelThresholds {
    pub fn status_for(&self, percentile: f64) -> RiverLevelStatus {
        if percentile >= self.danger_percentile {
            RiverLevelStatus::Danger
        } else if percentile >= self.warning_percentile {
            RiverLevelStatus::Warning
        } else {
            RiverLevelStatus::Normal
        }
    }
}

/// Both tables together, as loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdTables {
    pub precipitation: PrecipitationThresholds,
    pub river: RiverLevelThresholds,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
