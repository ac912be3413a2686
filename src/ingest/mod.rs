//! HTTP clients for the upstream providers.
//!
//! Each provider gets its own file: URL construction and response parsing
//! are pure functions so they can be tested against `fixtures` without a
//! network.

pub mod elevation;
pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fixtures;

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{FloodRiskError, SourceKind};

/// Blocking client with the per-request timeout applied.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("floodrisk_service/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// GETs `url` and returns the body. Transport errors and non-2xx statuses
/// are both reported as the domain being unavailable.
pub(crate) fn fetch_body(client: &Client, url: &str, kind: SourceKind) -> Result<String, FloodRiskError> {
    debug!(source = %kind, url = %url, "requesting upstream");

    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .map_err(|e| FloodRiskError::unavailable(kind, format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FloodRiskError::unavailable(kind, format!("HTTP {}", status)));
    }

    response
        .text()
        .map_err(|e| FloodRiskError::unavailable(kind, format!("reading body failed: {}", e)))
}
