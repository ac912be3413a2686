/// HTTP endpoint for flood risk reports
///
/// A thin JSON surface over the aggregator for dashboards and scripts.
///
/// Endpoints:
/// - GET  /health                               - service health and cache counters
/// - GET  /report?lat=..&lon=..&probability=..  - full environmental report
/// - GET  /region?lat=..&lon=..                 - location classification only
/// - POST /cache/sweep                          - drop expired cache entries
///
/// Routing is a pure function of (method, url) so it can be tested without
/// binding a socket.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{info, warn};

use crate::aggregator::Aggregator;
use crate::model::Coordinates;

type JsonResponse = Response<std::io::Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Query parsing
// ---------------------------------------------------------------------------

/// Splits `/path?a=1&b=2` into the path and decoded query pairs.
pub fn split_url(url: &str) -> (&str, HashMap<String, String>) {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    };

    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let k = urlencoding::decode(k).ok()?.into_owned();
            let v = urlencoding::decode(&v.replace('+', " ")).ok()?.into_owned();
            Some((k, v))
        })
        .collect();

    (path, params)
}

fn number_param(params: &HashMap<String, String>, name: &str) -> Result<f64, String> {
    let raw = params
        .get(name)
        .ok_or_else(|| format!("missing query parameter '{}'", name))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("query parameter '{}' is not a number: {}", name, raw))
}

fn coordinates_param(params: &HashMap<String, String>) -> Result<Coordinates, String> {
    let lat = number_param(params, "lat")?;
    let lon = number_param(params, "lon")?;
    Coordinates::new(lat, lon).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Status code and JSON body for one request.
pub fn route(aggregator: &Aggregator, method: &Method, url: &str) -> (u16, serde_json::Value) {
    let (path, params) = split_url(url);

    match (method, path) {
        (Method::Get, "/health") => (
            200,
            json!({
                "status": "ok",
                "service": "floodrisk_service",
                "version": env!("CARGO_PKG_VERSION"),
                "cache": aggregator.cache_stats(),
                "cached_reports": aggregator.report_cache_len(),
            }),
        ),
        (Method::Get, "/report") => handle_report(aggregator, &params),
        (Method::Get, "/region") => handle_region(aggregator, &params),
        (Method::Post, "/cache/sweep") => {
            let removed = aggregator.sweep();
            (200, json!({ "removed": removed }))
        }
        _ => (
            404,
            json!({
                "error": "Not found",
                "available_endpoints": [
                    "GET /health",
                    "GET /report?lat=..&lon=..&probability=..",
                    "GET /region?lat=..&lon=..",
                    "POST /cache/sweep"
                ]
            }),
        ),
    }
}

fn handle_report(aggregator: &Aggregator, params: &HashMap<String, String>) -> (u16, serde_json::Value) {
    let coords = match coordinates_param(params) {
        Ok(c) => c,
        Err(e) => return (400, json!({ "error": e })),
    };
    let probability = match number_param(params, "probability") {
        Ok(p) => p,
        Err(e) => return (400, json!({ "error": e })),
    };

    let report = aggregator.generate_report(coords, probability);
    match serde_json::to_value(&report) {
        Ok(body) => (200, body),
        Err(e) => (500, json!({ "error": format!("report serialization failed: {}", e) })),
    }
}

fn handle_region(aggregator: &Aggregator, params: &HashMap<String, String>) -> (u16, serde_json::Value) {
    match coordinates_param(params) {
        Ok(coords) => (200, json!(aggregator.locations().summarize(&coords))),
        Err(e) => (400, json!({ "error": e })),
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Serves requests on `port` until the listener closes.
pub fn start_endpoint_server(port: u16, aggregator: Arc<Aggregator>) -> Result<(), String> {
    let server = Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    info!(port, "HTTP endpoint listening");

    for request in server.incoming_requests() {
        let (status, body) = route(&aggregator, request.method(), request.url());
        if status >= 400 {
            warn!(status, url = %request.url(), "request rejected");
        }
        if let Err(e) = request.respond(create_response(status, &body)) {
            warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}

fn create_response(status_code: u16, json: &serde_json::Value) -> JsonResponse {
    let body = serde_json::to_string_pretty(json).unwrap_or_else(|_| "{}".to_string());
    let response = Response::from_data(body.into_bytes()).with_status_code(StatusCode::from(status_code));

    match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
