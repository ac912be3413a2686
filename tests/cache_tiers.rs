/// Integration tests for the multi-tier reading cache on a real directory
///
/// Covers tier windows at their exact boundaries, promotion from the file
/// layer into memory, and on-demand sweeping across a restart.
///
/// Run with: cargo test --test cache_tiers

use chrono::{Duration, TimeZone, Utc};
use floodrisk_service::cache::store::{DurableStore, FileStore};
use floodrisk_service::cache::{CacheTier, ReadingCache};
use floodrisk_service::clock::ManualClock;
use floodrisk_service::model::{ElevationReading, Reading};
use std::sync::Arc;

fn setup() -> (tempfile::TempDir, Arc<ManualClock>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
    (dir, clock)
}

fn elevation(m: f64) -> Reading {
    Reading::Elevation(ElevationReading { elevation_m: m })
}

#[test]
fn test_every_tier_expires_exactly_at_its_window() {
    for tier in CacheTier::ALL {
        let (dir, clock) = setup();
        let cache = ReadingCache::new(Arc::new(FileStore::open(dir.path()).unwrap()), clock.clone());
        cache.put("elevation:3.1390:101.6870", &elevation(8.0));

        clock.advance(tier.window() - Duration::milliseconds(1));
        assert!(
            cache.get("elevation:3.1390:101.6870", tier).is_some(),
            "{:?} should still accept an entry 1 ms inside its window",
            tier
        );

        clock.advance(Duration::milliseconds(1));
        assert!(
            cache.get("elevation:3.1390:101.6870", tier).is_none(),
            "{:?} should reject an entry exactly at its window",
            tier
        );
    }
}

#[test]
fn test_file_layer_promotes_into_memory_after_restart() {
    let (dir, clock) = setup();
    {
        let cache = ReadingCache::new(Arc::new(FileStore::open(dir.path()).unwrap()), clock.clone());
        cache.put("weather:3.1390:101.6870", &elevation(12.5));
    }

    let cache = ReadingCache::new(Arc::new(FileStore::open(dir.path()).unwrap()), clock.clone());
    assert_eq!(cache.stats().memory_entries, 0);

    let first = cache.get("weather:3.1390:101.6870", CacheTier::Fresh);
    assert_eq!(first, Some(elevation(12.5)));
    assert_eq!(cache.stats().durable_hits, 1);
    assert_eq!(cache.stats().memory_entries, 1);

    cache.get("weather:3.1390:101.6870", CacheTier::Fresh);
    assert_eq!(cache.stats().memory_hits, 1, "second lookup stays in process");
}

#[test]
fn test_sweep_clears_expired_files_left_by_a_previous_run() {
    let (dir, clock) = setup();
    {
        let cache = ReadingCache::new(Arc::new(FileStore::open(dir.path()).unwrap()), clock.clone());
        cache.put("river:1.0000:103.0000", &elevation(1.0));
        cache.put("river:2.0000:103.0000", &elevation(2.0));
    }

    clock.advance(Duration::minutes(20));
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let cache = ReadingCache::new(store.clone(), clock.clone());
    cache.put("river:3.0000:103.0000", &elevation(3.0));

    clock.advance(Duration::minutes(15));
    // The first two are 35 minutes old, the third only 15.
    assert_eq!(cache.sweep_expired(), 2);
    assert_eq!(store.keys().unwrap(), vec!["river:3.0000:103.0000".to_string()]);
}
