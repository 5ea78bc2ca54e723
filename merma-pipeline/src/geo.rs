//! Synthetic coordinates for the community-kitchen map.
//!
//! The donation table carries no latitude or longitude, but the map
//! layer needs a point per kitchen. Points are jittered around a base
//! coordinate with an explicitly seeded RNG keyed by kitchen name, so
//! the same seed places the same kitchen on the same spot in every run
//! and regardless of row order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::loader::DonationRecord;

/// Base point for the jitter: Santiago del Estero city center, where
/// the source kitchens operate.
pub const BASE_LAT: f64 = -27.7833;
pub const BASE_LON: f64 = -64.2667;

/// Maximum jitter around the base point, in degrees (roughly 2 km).
pub const DEFAULT_SPREAD_DEG: f64 = 0.02;

/// Default geocoder seed.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A kitchen with its synthetic map point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DonationSite {
    pub name: String,
    pub zone: String,
    pub donation_quantity: f64,
    pub point: GeoPoint,
}

/// Deterministic pseudo-geocoder for kitchens without real coordinates.
#[derive(Clone, Debug)]
pub struct ZoneGeocoder {
    base: GeoPoint,
    spread: f64,
    seed: u64,
}

impl Default for ZoneGeocoder {
    fn default() -> Self {
        ZoneGeocoder::new(DEFAULT_SEED)
    }
}

impl ZoneGeocoder {
    pub fn new(seed: u64) -> Self {
        ZoneGeocoder::with_base(GeoPoint { lat: BASE_LAT, lon: BASE_LON }, DEFAULT_SPREAD_DEG, seed)
    }

    pub fn with_base(base: GeoPoint, spread: f64, seed: u64) -> Self {
        ZoneGeocoder { base, spread, seed }
    }

    /// Point for one kitchen. Keyed by name, not by row position.
    pub fn locate(&self, name: &str) -> GeoPoint {
        if self.spread <= 0.0 {
            return self.base;
        }
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(self.seed ^ hasher.finish());
        GeoPoint {
            lat: self.base.lat + rng.gen_range(-self.spread..self.spread),
            lon: self.base.lon + rng.gen_range(-self.spread..self.spread),
        }
    }

    /// Map points for the whole donation table, in table order.
    pub fn sites(&self, donations: &[DonationRecord]) -> Vec<DonationSite> {
        donations
            .iter()
            .map(|r| DonationSite {
                name: r.name.clone(),
                zone: r.zone.clone(),
                donation_quantity: r.donation_quantity,
                point: self.locate(&r.name),
            })
            .collect()
    }
}
