/// Offline location classifier for the service area (Malaysia).
///
/// Region lookup is a first-match scan over named bounding boxes; nearest
/// place is a linear scan over named points using planar distance, which
/// is accurate enough at this latitude and extent. Both tables are small
/// and fixed, so flat arrays beat any spatial index here.
///
/// Box order matters: smaller enclaves (Kuala Lumpur, Putrajaya, Labuan,
/// Perlis, Penang) are listed before the states that surround them. A
/// state may span more than one box.

use std::sync::Arc;

use crate::cache::region::RegionCache;
use crate::clock::Clock;
use crate::model::{Coordinates, LocationSummary, NearbyPlace};
use crate::scoring::TerrainContext;

/// Kilometres per degree used to express planar distances.
pub const KM_PER_DEGREE: f64 = 111.32;
/// A known city this close counts as urban surroundings.
pub const URBAN_RADIUS_KM: f64 = 15.0;
/// A coastal city this close puts the point in the coastal zone.
pub const COASTAL_RADIUS_KM: f64 = 30.0;

pub const DEFAULT_REGION: &str = "Malaysia (unclassified)";

// ---------------------------------------------------------------------------
// Region boxes
// ---------------------------------------------------------------------------

pub struct RegionBox {
    pub name: &'static str,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl RegionBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

pub static REGION_REGISTRY: &[RegionBox] = &[
    RegionBox { name: "Kuala Lumpur", lat_min: 3.03, lat_max: 3.25, lon_min: 101.60, lon_max: 101.76 },
    RegionBox { name: "Putrajaya", lat_min: 2.88, lat_max: 3.00, lon_min: 101.65, lon_max: 101.73 },
    RegionBox { name: "Labuan", lat_min: 5.20, lat_max: 5.40, lon_min: 115.15, lon_max: 115.35 },
    RegionBox { name: "Perlis", lat_min: 6.25, lat_max: 6.75, lon_min: 100.10, lon_max: 100.40 },
    RegionBox { name: "Penang", lat_min: 5.12, lat_max: 5.60, lon_min: 100.17, lon_max: 100.56 },
    RegionBox { name: "Selangor", lat_min: 3.00, lat_max: 3.87, lon_min: 100.75, lon_max: 101.98 },
    // Sepang and the south coast; Negeri Sembilan begins east of 101.78.
    RegionBox { name: "Selangor", lat_min: 2.58, lat_max: 3.00, lon_min: 100.75, lon_max: 101.78 },
    RegionBox { name: "Melaka", lat_min: 2.05, lat_max: 2.55, lon_min: 102.00, lon_max: 102.55 },
    RegionBox { name: "Negeri Sembilan", lat_min: 2.40, lat_max: 3.30, lon_min: 101.70, lon_max: 102.65 },
    RegionBox { name: "Johor", lat_min: 1.25, lat_max: 2.95, lon_min: 102.45, lon_max: 104.45 },
    RegionBox { name: "Kedah", lat_min: 5.05, lat_max: 6.45, lon_min: 99.60, lon_max: 101.10 },
    RegionBox { name: "Perak", lat_min: 3.65, lat_max: 5.95, lon_min: 100.30, lon_max: 101.75 },
    RegionBox { name: "Kelantan", lat_min: 4.55, lat_max: 6.25, lon_min: 101.30, lon_max: 102.65 },
    RegionBox { name: "Terengganu", lat_min: 3.90, lat_max: 5.90, lon_min: 102.35, lon_max: 103.70 },
    RegionBox { name: "Pahang", lat_min: 2.45, lat_max: 4.80, lon_min: 101.30, lon_max: 103.50 },
    RegionBox { name: "Sabah", lat_min: 4.10, lat_max: 7.40, lon_min: 115.30, lon_max: 119.30 },
    RegionBox { name: "Sarawak", lat_min: 0.85, lat_max: 5.05, lon_min: 109.55, lon_max: 115.70 },
];

/// Coarse envelope around every region box.
const SERVICE_LAT_MIN: f64 = 0.8;
const SERVICE_LAT_MAX: f64 = 7.5;
const SERVICE_LON_MIN: f64 = 99.5;
const SERVICE_LON_MAX: f64 = 119.5;

// ---------------------------------------------------------------------------
// Known places
// ---------------------------------------------------------------------------

pub struct KnownPlace {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub coastal: bool,
}

pub static PLACE_REGISTRY: &[KnownPlace] = &[
    KnownPlace { name: "Kuala Lumpur", latitude: 3.1390, longitude: 101.6869, coastal: false },
    KnownPlace { name: "Shah Alam", latitude: 3.0733, longitude: 101.5185, coastal: false },
    KnownPlace { name: "Klang", latitude: 3.0449, longitude: 101.4456, coastal: true },
    KnownPlace { name: "Putrajaya", latitude: 2.9264, longitude: 101.6964, coastal: false },
    KnownPlace { name: "Seremban", latitude: 2.7297, longitude: 101.9381, coastal: false },
    KnownPlace { name: "Melaka", latitude: 2.1896, longitude: 102.2501, coastal: true },
    KnownPlace { name: "Johor Bahru", latitude: 1.4927, longitude: 103.7414, coastal: true },
    KnownPlace { name: "Ipoh", latitude: 4.5975, longitude: 101.0901, coastal: false },
    KnownPlace { name: "George Town", latitude: 5.4141, longitude: 100.3288, coastal: true },
    KnownPlace { name: "Alor Setar", latitude: 6.1248, longitude: 100.3678, coastal: false },
    KnownPlace { name: "Kota Bharu", latitude: 6.1254, longitude: 102.2381, coastal: true },
    KnownPlace { name: "Kuala Terengganu", latitude: 5.3296, longitude: 103.1370, coastal: true },
    KnownPlace { name: "Kuantan", latitude: 3.8077, longitude: 103.3260, coastal: true },
    KnownPlace { name: "Kuching", latitude: 1.5535, longitude: 110.3593, coastal: true },
    KnownPlace { name: "Miri", latitude: 4.3995, longitude: 113.9914, coastal: true },
    KnownPlace { name: "Kota Kinabalu", latitude: 5.9804, longitude: 116.0735, coastal: true },
    KnownPlace { name: "Sandakan", latitude: 5.8394, longitude: 118.1172, coastal: true },
];

// ---------------------------------------------------------------------------
// Pure lookups
// ---------------------------------------------------------------------------

/// First box containing the point, else `DEFAULT_REGION`.
pub fn classify_region(lat: f64, lon: f64) -> &'static str {
    REGION_REGISTRY
        .iter()
        .find(|r| r.contains(lat, lon))
        .map(|r| r.name)
        .unwrap_or(DEFAULT_REGION)
}

/// Closest entry in `PLACE_REGISTRY`; on a tie the earlier entry wins.
pub fn nearest_known_place(lat: f64, lon: f64) -> Option<NearbyPlace> {
    nearest_in(PLACE_REGISTRY, lat, lon)
}

fn nearest_in(places: &[KnownPlace], lat: f64, lon: f64) -> Option<NearbyPlace> {
    let mut best: Option<(&KnownPlace, f64)> = None;
    for place in places {
        let d = planar_distance_deg(lat, lon, place.latitude, place.longitude);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((place, d)),
        }
    }
    best.map(|(place, d)| NearbyPlace {
        name: place.name.to_string(),
        distance_km: d * KM_PER_DEGREE,
        coastal: place.coastal,
    })
}

pub fn planar_distance_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    ((lat1 - lat2).powi(2) + (lon1 - lon2).powi(2)).sqrt()
}

/// Coarse envelope first, then exact box membership.
pub fn is_within_service_area(lat: f64, lon: f64) -> bool {
    if !(SERVICE_LAT_MIN..=SERVICE_LAT_MAX).contains(&lat)
        || !(SERVICE_LON_MIN..=SERVICE_LON_MAX).contains(&lon)
    {
        return false;
    }
    REGION_REGISTRY.iter().any(|r| r.contains(lat, lon))
}

pub fn terrain_context(nearest: Option<&NearbyPlace>) -> TerrainContext {
    match nearest {
        Some(place) => TerrainContext {
            near_coast: place.coastal && place.distance_km <= COASTAL_RADIUS_KM,
            near_urban_centre: place.distance_km <= URBAN_RADIUS_KM,
        },
        None => TerrainContext::default(),
    }
}

// ---------------------------------------------------------------------------
// Cached classifier
// ---------------------------------------------------------------------------

/// The lookups above, with region names memoised in the 24-hour region cache.
pub struct LocationClassifier {
    regions: RegionCache,
}

impl LocationClassifier {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            regions: RegionCache::new(clock),
        }
    }

    pub fn region_for(&self, lat: f64, lon: f64) -> String {
        if let Some(region) = self.regions.get(lat, lon) {
            return region;
        }
        let region = classify_region(lat, lon);
        self.regions.put(lat, lon, region);
        region.to_string()
    }

    pub fn nearest_known_place(&self, lat: f64, lon: f64) -> Option<NearbyPlace> {
        nearest_known_place(lat, lon)
    }

    pub fn is_within_service_area(&self, lat: f64, lon: f64) -> bool {
        is_within_service_area(lat, lon)
    }

    pub fn summarize(&self, coords: &Coordinates) -> LocationSummary {
        LocationSummary {
            region: self.region_for(coords.latitude, coords.longitude),
            nearest_place: self.nearest_known_place(coords.latitude, coords.longitude),
            within_service_area: self.is_within_service_area(coords.latitude, coords.longitude),
        }
    }

    pub fn cached_regions(&self) -> usize {
        self.regions.len()
    }

    /// Drops region entries that have reached their 24-hour lifetime.
    pub fn sweep_cache(&self) -> usize {
        self.regions.sweep_expired()
    }

    pub fn clear_cache(&self) {
        self.regions.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
