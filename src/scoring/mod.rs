//! Risk scoring engine.
//!
//! Pure functions only: a reading plus the caller's flood probability in,
//! a domain analysis out. Nothing here touches the clock, the cache or
//! the network.
//!
//! - `weather`   - severity by probability, factors and sub-score by reading
//! - `river`     - percentile classification, trend, sub-score
//! - `geography` - elevation bands, proximity factors, sub-score
//! - `composite` - fixed-weight combination and risk level banding

pub mod composite;
pub mod geography;
pub mod river;
pub mod weather;

pub use composite::{composite_risk, composite_score, WEATHER_WEIGHT, RIVER_WEIGHT, GEOGRAPHY_WEIGHT};
pub use geography::{analyze_geography, TerrainContext};
pub use river::analyze_river;
pub use weather::analyze_weather;

/// Flood probability normalised to [0, 1]; NaN counts as 0.
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}
