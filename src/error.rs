//! Error taxonomy for the flood risk core.
//!
//! Only `InvalidInput` ever reaches a caller of the aggregator. `CacheIo` is
//! absorbed at the cache boundary (treated as a miss) and `SourceUnavailable`
//! is absorbed at the aggregator boundary (replaced by a synthetic report).

use std::fmt;
use thiserror::Error;

/// Which upstream domain an adapter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Weather,
    River,
    Elevation,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Weather => "weather",
            SourceKind::River => "river",
            SourceKind::Elevation => "elevation",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FloodRiskError {
    #[error("{source_kind} source unavailable: {reason}")]
    SourceUnavailable {
        source_kind: SourceKind,
        reason: String,
    },

    #[error("durable cache I/O failed: {0}")]
    CacheIo(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl FloodRiskError {
    pub fn unavailable(source_kind: SourceKind, reason: impl Into<String>) -> Self {
        FloodRiskError::SourceUnavailable {
            source_kind,
            reason: reason.into(),
        }
    }
}

/// Failure inside a durable store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for FloodRiskError {
    fn from(e: StoreError) -> Self {
        FloodRiskError::CacheIo(e.to_string())
    }
}

/// Failure loading or validating `floodrisk.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
