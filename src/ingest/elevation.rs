/// Open-Meteo elevation API client (90 m Copernicus DEM).
///
/// Response shape: `{"elevation": [8.0]}`, one value per requested point.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::SourcesConfig;
use crate::error::{FloodRiskError, SourceKind};
use crate::ingest::{build_http_client, fetch_body};
use crate::model::{Coordinates, ElevationReading};
use crate::sources::ElevationSource;

#[derive(Deserialize)]
struct ElevationResponse {
    #[serde(default)]
    elevation: Vec<Option<f64>>,
}

pub fn build_elevation_url(base: &str, coords: &Coordinates) -> String {
    format!(
        "{}?latitude={:.4}&longitude={:.4}",
        base, coords.latitude, coords.longitude
    )
}

pub fn parse_elevation_response(json: &str) -> Result<ElevationReading, FloodRiskError> {
    let response: ElevationResponse = serde_json::from_str(json).map_err(|e| {
        FloodRiskError::unavailable(SourceKind::Elevation, format!("JSON deserialization failed: {}", e))
    })?;

    match response.elevation.first().copied().flatten() {
        Some(elevation_m) if elevation_m.is_finite() => Ok(ElevationReading { elevation_m }),
        _ => Err(FloodRiskError::unavailable(
            SourceKind::Elevation,
            "no elevation value in response",
        )),
    }
}

pub struct ElevationClient {
    http: Client,
    base_url: String,
}

impl ElevationClient {
    pub fn new(sources: &SourcesConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(sources.timeout())?,
            base_url: sources.elevation_url.clone(),
        })
    }
}

impl ElevationSource for ElevationClient {
    fn fetch_elevation(&self, coords: &Coordinates) -> Result<ElevationReading, FloodRiskError> {
        let url = build_elevation_url(&self.base_url, coords);
        let body = fetch_body(&self.http, &url, SourceKind::Elevation)?;
        parse_elevation_response(&body)
    }
}
