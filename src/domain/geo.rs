//! Geospatial math: great-circle distance, centroid, circular containment.
//!
//! All distances are in meters. Pure functions, no side effects.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG value)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite numbers (NaN and infinities rejected at ingest)
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Great-circle distance between two points in meters (haversine formula)
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Arithmetic centroid of a point set; `None` for an empty set.
///
/// Plain lat/lng averaging, matching how the group center is defined. Good
/// enough at the scales a walking group covers; not antimeridian-safe.
pub fn centroid(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat_sum, lng_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(Coordinates::new(lat_sum / n, lng_sum / n))
}

/// Circular inclusion boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub center: Coordinates,
    pub radius_m: f64,
}

impl Geofence {
    pub fn new(center: Coordinates, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// True iff `point` is strictly farther than `radius_m` from the center.
    /// A point exactly on the boundary is inside.
    pub fn is_outside(&self, point: Coordinates) -> bool {
        haversine_distance(point, self.center) > self.radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_zero_for_identical_points() {
        // given (precondition):
        let p = Coordinates::new(10.0, 20.0);

        // when (operation):
        let d = haversine_distance(p, p);

        // then (expected result):
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        // given (precondition):
        let a = Coordinates::new(10.0, 20.0);
        let b = Coordinates::new(10.001, 20.002);

        // when (operation):
        let ab = haversine_distance(a, b);
        let ba = haversine_distance(b, a);

        // then (expected result):
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_distance_matches_known_value() {
        // given (precondition): 0.002 degrees of longitude near the equator
        let a = Coordinates::new(10.0, 20.0);
        let b = Coordinates::new(10.0, 20.002);

        // when (operation):
        let d = haversine_distance(a, b);

        // then (expected result): ~219 m (111.32 km/deg scaled by cos(10 deg))
        assert!(d > 210.0 && d < 225.0, "distance was {d}");
    }

    #[test]
    fn test_centroid_of_two_points_is_midpoint() {
        // given (precondition):
        let points = [Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 2.0)];

        // when (operation):
        let center = centroid(&points).unwrap();

        // then (expected result):
        assert!((center.lat - 0.0).abs() < 1e-9);
        assert!((center.lng - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_of_empty_set_is_none() {
        // given (precondition):
        let points: [Coordinates; 0] = [];

        // when (operation):
        let center = centroid(&points);

        // then (expected result):
        assert_eq!(center, None);
    }

    #[test]
    fn test_geofence_center_is_never_outside() {
        // given (precondition):
        let center = Coordinates::new(48.2, 16.37);
        let fence = Geofence::new(center, 300.0);

        // when (operation):
        let outside = fence.is_outside(center);

        // then (expected result):
        assert!(!outside);
    }

    #[test]
    fn test_geofence_point_just_beyond_radius_is_outside() {
        // given (precondition): ~333 m north of the center, radius 300 m
        let center = Coordinates::new(48.2, 16.37);
        let fence = Geofence::new(center, 300.0);
        let point = Coordinates::new(48.203, 16.37);

        // when (operation):
        let outside = fence.is_outside(point);

        // then (expected result):
        assert!(outside);
    }

    #[test]
    fn test_geofence_point_just_inside_radius_is_inside() {
        // given (precondition): ~222 m north of the center, radius 300 m
        let center = Coordinates::new(48.2, 16.37);
        let fence = Geofence::new(center, 300.0);
        let point = Coordinates::new(48.202, 16.37);

        // when (operation):
        let outside = fence.is_outside(point);

        // then (expected result):
        assert!(!outside);
    }

    #[test]
    fn test_coordinates_finite_check() {
        // given (precondition):
        let good = Coordinates::new(1.0, 2.0);
        let nan = Coordinates::new(f64::NAN, 2.0);
        let inf = Coordinates::new(1.0, f64::INFINITY);

        // when (operation) / then (expected result):
        assert!(good.is_finite());
        assert!(!nan.is_finite());
        assert!(!inf.is_finite());
    }
}
