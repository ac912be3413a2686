//! Region lookup cache.
//!
//! Region identity changes far more slowly than weather, so it gets its own
//! map with a single fixed 24-hour window instead of the reading tiers.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

use crate::clock::Clock;

pub const REGION_CACHE_HOURS: i64 = 24;

#[derive(Debug, Clone)]
struct RegionEntry {
    region: String,
    stored_at: DateTime<Utc>,
}

pub struct RegionCache {
    entries: DashMap<String, RegionEntry>,
    clock: Arc<dyn Clock>,
}

/// Coordinates rounded to 4 decimal places.
pub fn region_key(lat: f64, lon: f64) -> String {
    format!("{:.4},{:.4}", lat, lon)
}

impl RegionCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn window() -> Duration {
        Duration::hours(REGION_CACHE_HOURS)
    }

    pub fn get(&self, lat: f64, lon: f64) -> Option<String> {
        let entry = self.entries.get(&region_key(lat, lon))?;
        if self.clock.now() - entry.stored_at < Self::window() {
            Some(entry.region.clone())
        } else {
            None
        }
    }

    pub fn put(&self, lat: f64, lon: f64, region: &str) {
        self.entries.insert(
            region_key(lat, lon),
            RegionEntry {
                region: region.to_string(),
                stored_at: self.clock.now(),
            },
        );
    }

    /// Removes entries at or past the 24-hour window. Returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.stored_at < Self::window());
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
