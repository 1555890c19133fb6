//! Geofence evaluation. Haversine great-circle distance against a fixed site.
//!
//! Pure and stateless: no I/O, no clocks, no shared mutable state.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Mauá, SP, Brazil (LSP64 hub).
pub const DEFAULT_TARGET: Coordinate = Coordinate {
    latitude: -23.6675,
    longitude: -46.4608,
};

pub const DEFAULT_RADIUS_METERS: f64 = 500.0;

/// Fence used by [`verify_location`].
pub const DEFAULT_GEOFENCE: Geofence = Geofence {
    target: DEFAULT_TARGET,
    radius_meters: DEFAULT_RADIUS_METERS,
};

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the usual degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Verdict for one reading.
///
/// `is_in_range` is decided on the unrounded distance; `distance` is the
/// rounded value shown to users and written to the log. NaN input yields a NaN
/// distance and `is_in_range == false`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_in_range: bool,
    /// Whole meters.
    pub distance: f64,
}

fn to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

/// Great-circle distance in meters between two coordinates (Haversine).
pub fn haversine_distance(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = to_radians(from.latitude);
    let phi2 = to_radians(to.latitude);
    let delta_phi = to_radians(to.latitude - from.latitude);
    let delta_lambda = to_radians(to.longitude - from.longitude);

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// A circular fence around a target. Fields are fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    target: Coordinate,
    radius_meters: f64,
}

impl Geofence {
    pub const fn new(target: Coordinate, radius_meters: f64) -> Self {
        Self {
            target,
            radius_meters,
        }
    }

    pub fn target(&self) -> Coordinate {
        self.target
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Unrounded distance from `point` to the target, in meters.
    pub fn distance_to(&self, point: Coordinate) -> f64 {
        haversine_distance(point, self.target)
    }

    /// Classify an already measured distance. Inclusive boundary.
    pub fn classify(&self, distance_meters: f64) -> VerificationResult {
        VerificationResult {
            is_in_range: distance_meters <= self.radius_meters,
            distance: distance_meters.round(),
        }
    }

    pub fn verify(&self, latitude: f64, longitude: f64) -> VerificationResult {
        self.classify(self.distance_to(Coordinate::new(latitude, longitude)))
    }
}

impl Default for Geofence {
    fn default() -> Self {
        DEFAULT_GEOFENCE
    }
}

/// Verify a reading against the default site and radius.
pub fn verify_location(latitude: f64, longitude: f64) -> VerificationResult {
    DEFAULT_GEOFENCE.verify(latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Latitude offset (degrees) that puts a point `meters` due north of the target.
    /// For a pure latitude shift the Haversine distance is exactly R * delta_phi.
    fn north_of_target(meters: f64) -> Coordinate {
        let delta_deg = meters / EARTH_RADIUS_METERS * (180.0 / std::f64::consts::PI);
        Coordinate::new(DEFAULT_TARGET.latitude + delta_deg, DEFAULT_TARGET.longitude)
    }

    #[test]
    fn target_itself_is_zero_and_in_range() {
        let r = verify_location(DEFAULT_TARGET.latitude, DEFAULT_TARGET.longitude);
        assert!(r.is_in_range);
        assert_eq!(r.distance, 0.0);
    }

    #[test]
    fn known_site_coordinates() {
        let r = verify_location(-23.6675, -46.4608);
        assert_eq!(
            r,
            VerificationResult {
                is_in_range: true,
                distance: 0.0
            }
        );
    }

    #[test]
    fn roughly_600m_north_is_out_of_range() {
        let r = verify_location(-23.6675 + 0.0054, -46.4608);
        assert!(!r.is_in_range);
        assert!((r.distance - 600.0).abs() <= 1.0, "got {}", r.distance);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(-23.6675, -46.4608);
        let b = Coordinate::new(-23.5505, -46.6333);
        let fence_a = Geofence::new(a, 500.0);
        let fence_b = Geofence::new(b, 500.0);

        let ab = fence_a.verify(b.latitude, b.longitude);
        let ba = fence_b.verify(a.latitude, a.longitude);
        assert_eq!(ab.distance, ba.distance);
        assert!((fence_a.distance_to(b) - fence_b.distance_to(a)).abs() < 1e-6);
    }

    #[test]
    fn radial_boundary_is_inclusive() {
        for (d, expected) in [
            (0.0, true),
            (100.0, true),
            (499.0, true),
            (501.0, false),
            (1000.0, false),
        ] {
            let p = north_of_target(d);
            let r = DEFAULT_GEOFENCE.verify(p.latitude, p.longitude);
            assert_eq!(r.is_in_range, expected, "d = {d}");
            assert_eq!(r.distance, d, "d = {d}");
        }

        // Exactly on the radius.
        assert!(DEFAULT_GEOFENCE.classify(500.0).is_in_range);
        let p = north_of_target(500.0);
        let measured = DEFAULT_GEOFENCE.distance_to(p);
        assert!((measured - 500.0).abs() < 1e-6);
        let exact = Geofence::new(DEFAULT_TARGET, measured);
        assert!(exact.verify(p.latitude, p.longitude).is_in_range);
    }

    #[test]
    fn comparison_uses_unrounded_distance() {
        let p = north_of_target(500.4);
        let r = DEFAULT_GEOFENCE.verify(p.latitude, p.longitude);
        assert!(!r.is_in_range);
        assert_eq!(r.distance, 500.0);

        let p = north_of_target(499.6);
        let r = DEFAULT_GEOFENCE.verify(p.latitude, p.longitude);
        assert!(r.is_in_range);
        assert_eq!(r.distance, 500.0);

        let p = north_of_target(500.6);
        let r = DEFAULT_GEOFENCE.verify(p.latitude, p.longitude);
        assert!(!r.is_in_range);
        assert_eq!(r.distance, 501.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let first = verify_location(-23.66, -46.45);
        for _ in 0..100 {
            assert_eq!(verify_location(-23.66, -46.45), first);
        }
    }

    #[test]
    fn nan_input_does_not_panic() {
        let r = verify_location(f64::NAN, -46.4608);
        assert!(!r.is_in_range);
        assert!(r.distance.is_nan());
    }

    #[test]
    fn coordinate_validity() {
        assert!(DEFAULT_TARGET.is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::INFINITY, 0.0).is_valid());
    }
}
