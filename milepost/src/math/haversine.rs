//! Great-circle distance on a spherical earth.
//!
//! Adapted from the [geo] crate's haversine routines, reduced to the
//! single f64 distance-in-miles function we need.
//!
//! [geo](https://github.com/georust/geo/blob/eb0cd98f3ccfa226631af23d94d66d214ea66488/geo/src/algorithm/haversine_distance.rs)

use crate::constants::EARTH_RADIUS_MILES;
use geo::Point;

/// Returns the great-circle distance, in miles, between `a` and `b`.
///
/// Points are `x: longitude, y: latitude` in degrees. Longitude
/// differences are taken as-is; there is no antimeridian handling.
pub fn haversine_miles(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let delta_lat = (b.y() - a.y()).to_radians();
    let delta_lon = (b.x() - a.x()).to_radians();

    // Rounding can push `h` a hair outside [0, 1], which would hand
    // `sqrt` a negative argument below.
    let h = ((delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}

#[cfg(test)]
mod tests {
    use super::haversine_miles;
    use approx::assert_relative_eq;
    use geo::point;

    const SPRINGER: (f64, f64) = (34.6272, -84.1939);
    const KATAHDIN: (f64, f64) = (45.9044, -68.9214);

    fn at((lat, lon): (f64, f64)) -> geo::Point<f64> {
        point!(x: lon, y: lat)
    }

    #[test]
    fn test_identical_points_are_zero() {
        for p in [
            at(SPRINGER),
            at(KATAHDIN),
            point!(x: 0.0, y: 0.0),
            point!(x: 179.999, y: -89.999),
        ] {
            let d = haversine_miles(p, p);
            assert_eq!(d, 0.0);
            assert!(!d.is_nan());
        }
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            (at(SPRINGER), at(KATAHDIN)),
            (point!(x: -84.05, y: 35.0), at(SPRINGER)),
            (point!(x: 10.0, y: -45.0), point!(x: -170.0, y: 60.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(haversine_miles(a, b), haversine_miles(b, a));
        }
    }

    #[test]
    fn test_triangle_inequality() {
        let a = at(SPRINGER);
        let b = point!(x: -78.5, y: 38.0);
        let c = at(KATAHDIN);
        let eps = 1e-9;
        assert!(haversine_miles(a, c) <= haversine_miles(a, b) + haversine_miles(b, c) + eps);
        assert!(haversine_miles(a, b) <= haversine_miles(a, c) + haversine_miles(c, b) + eps);
        assert!(haversine_miles(b, c) <= haversine_miles(b, a) + haversine_miles(a, c) + eps);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // 2πR / 360
        let expected = 3959.0 * std::f64::consts::PI / 180.0;
        let d = haversine_miles(point!(x: -84.0, y: 35.0), point!(x: -84.0, y: 36.0));
        assert_relative_eq!(d, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_terminus_to_terminus() {
        // Straight-line distance is far shorter than the trail itself.
        let d = haversine_miles(at(SPRINGER), at(KATAHDIN));
        assert!(d > 1000.0 && d < 1200.0, "{d}");
    }
}
