//! Multi-tier reading cache.
//!
//! ## Architecture: In-Memory + Durable
//!
//! **In-memory (hot path):** a `DashMap` owned for the process lifetime.
//! Lookups try it first.
//!
//! **Durable (survives restarts):** any `DurableStore` (file, postgres,
//! memory). A durable hit is copied back into memory so the next lookup
//! for the same key never leaves the process.
//!
//! **Tiers:** the caller picks how old an entry it will tolerate per lookup.
//! Entries are never tagged with a tier; a lookup under tier T accepts any
//! entry younger than T's window regardless of who wrote it.
//!
//! Expired entries are not removed on read. `sweep_expired` is the only
//! thing that deletes them, and it runs on demand.

pub mod region;
pub mod store;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{FloodRiskError, StoreError};
use crate::model::Reading;
use store::DurableStore;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Named validity windows, shortest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheTier {
    UltraFresh,
    Fresh,
    Valid,
    StaleAcceptable,
}

impl CacheTier {
    pub const ALL: [CacheTier; 4] = [
        CacheTier::UltraFresh,
        CacheTier::Fresh,
        CacheTier::Valid,
        CacheTier::StaleAcceptable,
    ];

    pub fn window(&self) -> Duration {
        match self {
            CacheTier::UltraFresh => Duration::seconds(5),
            CacheTier::Fresh => Duration::minutes(2),
            CacheTier::Valid => Duration::minutes(10),
            CacheTier::StaleAcceptable => Duration::minutes(30),
        }
    }

    /// The longest window; anything older is garbage for every tier.
    pub fn longest() -> CacheTier {
        CacheTier::StaleAcceptable
    }

    pub fn accepts(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - stored_at < self.window()
    }
}

// ---------------------------------------------------------------------------
// Entries and stats
// ---------------------------------------------------------------------------

/// A cached payload. Never handed out by reference; readers get clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub memory_hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub durable_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    memory_hits: AtomicU64,
    durable_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    durable_errors: AtomicU64,
}

// ---------------------------------------------------------------------------
// Reading cache
// ---------------------------------------------------------------------------

pub struct ReadingCache {
    memory: DashMap<String, CacheEntry>,
    durable: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl ReadingCache {
    pub fn new(durable: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            memory: DashMap::new(),
            durable,
            clock,
            counters: Counters::default(),
        }
    }

    /// Raw payload bytes for `key` if an entry younger than `tier` exists.
    pub fn get_raw(&self, key: &str, tier: CacheTier) -> Option<Vec<u8>> {
        let now = self.clock.now();

        if let Some(entry) = self.memory.get(key) {
            if tier.accepts(entry.stored_at, now) {
                self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, ?tier, "reading cache memory hit");
                return Some(entry.payload.clone());
            }
        }

        match self.read_durable(key) {
            Ok(Some(entry)) if tier.accepts(entry.stored_at, now) => {
                self.counters.durable_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, ?tier, "reading cache durable hit, promoting to memory");
                let payload = entry.payload.clone();
                self.memory.insert(key.to_string(), entry);
                Some(payload)
            }
            Ok(_) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, ?tier, "reading cache miss");
                None
            }
            Err(e) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                let err = self.absorb(e);
                warn!(key, error = %err, "durable cache read failed, treating as miss");
                None
            }
        }
    }

    /// Decoded reading for `key`. A payload that no longer decodes is a miss.
    pub fn get(&self, key: &str, tier: CacheTier) -> Option<Reading> {
        let bytes = self.get_raw(key, tier)?;
        match serde_json::from_slice(&bytes) {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!(key, error = %e, "cached payload failed to decode");
                None
            }
        }
    }

    /// Stores `reading` in both layers, stamped with the current time.
    pub fn put(&self, key: &str, reading: &Reading) {
        match serde_json::to_vec(reading) {
            Ok(payload) => self.put_raw(key, payload),
            Err(e) => warn!(key, error = %e, "reading failed to serialize, not cached"),
        }
    }

    pub fn put_raw(&self, key: &str, payload: Vec<u8>) {
        let entry = CacheEntry {
            key: key.to_string(),
            payload,
            stored_at: self.clock.now(),
        };
        self.counters.writes.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.write_durable(&entry) {
            let err = self.absorb(e);
            warn!(key, error = %err, "durable cache write failed, memory layer only");
        }
        self.memory.insert(key.to_string(), entry);
    }

    /// Drops every entry in both layers.
    pub fn invalidate_all(&self) {
        self.memory.clear();
        match self.durable.keys() {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = self.durable.delete(&key) {
                        let err = self.absorb(e);
                        warn!(key = %key, error = %err, "durable cache delete failed");
                    }
                }
            }
            Err(e) => {
                let err = self.absorb(e);
                warn!(error = %err, "durable cache listing failed during invalidation");
            }
        }
        info!("reading cache invalidated");
    }

    /// Removes entries too old for even the longest tier. Returns how many
    /// distinct keys were dropped from either layer.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let longest = CacheTier::longest();

        let mut removed: Vec<String> = self
            .memory
            .iter()
            .filter(|e| !longest.accepts(e.stored_at, now))
            .map(|e| e.key().clone())
            .collect();
        for key in &removed {
            self.memory.remove(key);
        }

        match self.durable.keys() {
            Ok(keys) => {
                for key in keys {
                    let expired = match self.read_durable(&key) {
                        Ok(Some(entry)) => !longest.accepts(entry.stored_at, now),
                        Ok(None) => false,
                        // Undecodable entries are dead weight too.
                        Err(StoreError::Serialization(_)) => true,
                        Err(_) => false,
                    };
                    if expired {
                        match self.durable.delete(&key) {
                            Ok(()) => {
                                if !removed.contains(&key) {
                                    removed.push(key);
                                }
                            }
                            Err(e) => {
                                let err = self.absorb(e);
                                warn!(key = %key, error = %err, "durable cache delete failed during sweep");
                            }
                        }
                    }
                }
            }
            Err(e) => {
                let err = self.absorb(e);
                warn!(error = %err, "durable cache listing failed during sweep");
            }
        }

        info!(removed = removed.len(), "reading cache sweep complete");
        removed.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_entries: self.memory.len(),
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            durable_hits: self.counters.durable_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            durable_errors: self.counters.durable_errors.load(Ordering::Relaxed),
        }
    }

    /// Counts a durable-layer failure and lifts it into the core taxonomy.
    fn absorb(&self, e: StoreError) -> FloodRiskError {
        self.counters.durable_errors.fetch_add(1, Ordering::Relaxed);
        FloodRiskError::from(e)
    }

    fn read_durable(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        match self.durable.read(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_durable(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(entry)?;
        self.durable.write(&entry.key, &bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
