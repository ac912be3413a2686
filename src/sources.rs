//! Upstream data source seams.
//!
//! The aggregator only sees these traits; concrete HTTP clients live under
//! `ingest/` and tests substitute in-process stubs. Calls are blocking and
//! run on the aggregator's worker threads.

use crate::error::FloodRiskError;
use crate::model::{Coordinates, ElevationReading, RiverReading, WeatherReading};

pub trait WeatherSource: Send + Sync {
    /// Current conditions, a 24-hour outlook and its rainfall analysis.
    fn fetch_weather(&self, coords: &Coordinates) -> Result<WeatherReading, FloodRiskError>;
}

pub trait RiverSource: Send + Sync {
    /// Today's discharge placed within the recent daily history.
    fn fetch_river_history(&self, coords: &Coordinates) -> Result<RiverReading, FloodRiskError>;
}

pub trait ElevationSource: Send + Sync {
    fn fetch_elevation(&self, coords: &Coordinates) -> Result<ElevationReading, FloodRiskError>;
}
