//! Geographic coordinate used as the aggregation key.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Latitude/longitude pair as returned by the geocoding service.
///
/// Equality and hashing compare the raw bit patterns, so two addresses
/// only merge into one map point when the service returned bit-identical
/// values for them. There is no geographic clustering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and within ±90° latitude / ±180° longitude.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    fn bits(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lon.to_bits())
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(c: Coordinate) -> Self {
        (c.lat, c.lon)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    #[test]
    fn test_identical_values_merge() {
        let mut set = HashSet::new();
        set.insert(Coordinate::new(55.7333, 12.4667));
        set.insert(Coordinate::new(55.7333, 12.4667));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_is_valid() {
        assert!(Coordinate::new(55.7333, 12.4667).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 12.0).is_valid());
        assert!(!Coordinate::new(55.0, f64::INFINITY).is_valid());
        assert!(!Coordinate::new(90.5, 12.0).is_valid());
        assert!(!Coordinate::new(55.0, -180.5).is_valid());
    }

    #[test]
    fn test_near_values_stay_apart() {
        let a = Coordinate::new(55.1, 12.1);
        let b = Coordinate::new(55.1 + f64::EPSILON * 64.0, 12.1);
        assert_ne!(a, b);
    }
}
