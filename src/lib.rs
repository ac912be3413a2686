//! floodrisk_service: point flood risk reports for Malaysia.
//!
//! # Module structure
//!
//! ```text
//! floodrisk_service
//! ├── model       - shared data types (readings, analyses, EnvironmentalReport, …)
//! ├── error       - FloodRiskError, StoreError, ConfigError
//! ├── config      - floodrisk.toml loader (thresholds, cache backend, providers)
//! ├── thresholds  - precipitation bands and river level percentiles
//! ├── clock       - injectable time source for every TTL decision
//! ├── cache
//! │   ├── store   - DurableStore trait, memory and file backends
//! │   └── region  - 24-hour region lookup cache
//! ├── db          - PostgreSQL durable store backend
//! ├── sources     - WeatherSource / RiverSource / ElevationSource seams
//! ├── ingest
//! │   ├── open_meteo - forecast + flood APIs: URL construction + JSON parsing
//! │   ├── elevation  - elevation API client
//! │   └── fixtures (test only) - representative API response payloads
//! ├── scoring     - weather, river, geography and composite scoring
//! ├── location    - region boxes, known places, service area
//! ├── mock        - synthetic readings for the fallback report
//! ├── aggregator  - concurrent fetch, scoring, report cache
//! └── endpoint    - HTTP API over the aggregator
//! ```

pub mod aggregator;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod ingest;
pub mod location;
pub mod mock;
pub mod model;
pub mod scoring;
pub mod sources;
pub mod thresholds;
