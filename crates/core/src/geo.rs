//! Planar coordinate helpers.
//!
//! Distances here are plain Euclidean distances in degree space. They are
//! only used to rank candidates (nearest warehouse), so relative ordering is
//! all that matters; they are not geodesic distances.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::validate_finite;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject coordinates that are not finite numbers.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_finite(self.lat, "lat")?;
        validate_finite(self.lon, "lon")
    }

    /// Euclidean distance `sqrt(dlat² + dlon²)` to `other`.
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat_diff = self.lat - other.lat;
        let lon_diff = self.lon - other.lon;
        (lat_diff * lat_diff + lon_diff * lon_diff).sqrt()
    }
}

/// Linearly interpolate `steps` points from `origin` to `destination`,
/// inclusive of both endpoints, with equal steps in latitude and longitude.
///
/// `steps == 1` yields just the destination; `steps == 0` yields nothing.
pub fn interpolate(origin: Location, destination: Location, steps: usize) -> Vec<Location> {
    match steps {
        0 => Vec::new(),
        1 => vec![destination],
        _ => {
            let last = (steps - 1) as f64;
            (0..steps)
                .map(|i| {
                    let t = i as f64 / last;
                    Location {
                        lat: origin.lat + (destination.lat - origin.lat) * t,
                        lon: origin.lon + (destination.lon - origin.lon) * t,
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < f64::EPSILON);
        assert!((b.distance_to(&a) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn interpolation_hits_both_endpoints() {
        let origin = Location::new(52.52, 13.405);
        let dest = Location::new(52.3676, 4.9041);
        let route = interpolate(origin, dest, 100);

        assert_eq!(route.len(), 100);
        assert_eq!(route[0], origin);
        assert!((route[99].lat - dest.lat).abs() < 1e-12);
        assert!((route[99].lon - dest.lon).abs() < 1e-12);
    }

    #[test]
    fn interpolation_steps_are_equal() {
        let route = interpolate(Location::new(0.0, 0.0), Location::new(9.0, 18.0), 10);
        for pair in route.windows(2) {
            assert!((pair[1].lat - pair[0].lat - 1.0).abs() < 1e-9);
            assert!((pair[1].lon - pair[0].lon - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn degenerate_step_counts() {
        let dest = Location::new(1.0, 1.0);
        assert!(interpolate(Location::new(0.0, 0.0), dest, 0).is_empty());
        assert_eq!(interpolate(Location::new(0.0, 0.0), dest, 1), vec![dest]);
    }

    #[test]
    fn non_finite_coordinates_rejected() {
        assert!(Location::new(f64::NAN, 1.0).validate().is_err());
        assert!(Location::new(1.0, f64::NEG_INFINITY).validate().is_err());
        assert!(Location::new(48.8566, 2.3522).validate().is_ok());
    }
}
