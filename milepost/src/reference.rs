//! Mile estimates from sparse, trusted reference waypoints.
//!
//! The estimate interpolates in mile-space, weighted by straight-line
//! distance to the two reference waypoints bracketing the query. It
//! is not path-following: near switchbacks, loops, and side-trail
//! spurs, straight-line proximity does not track along-trail position
//! and the estimate will be off. Prefer [`Track`](crate::Track) when a
//! dense track is available.

use crate::{
    config::Config,
    math::{haversine_miles, is_valid_point, round_tenth},
};
use geo::Point;
use log::debug;
use serde::{Deserialize, Serialize};

/// A named point with a known, trusted mile marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceWaypoint {
    pub name: String,

    /// Mile marker, from the southern terminus.
    pub mile: f64,

    #[serde(rename = "lat")]
    pub latitude: f64,

    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl ReferenceWaypoint {
    pub fn new(name: impl Into<String>, mile: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            mile,
            latitude,
            longitude,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// True when mile and coordinates are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.mile.is_finite() && self.mile >= 0.0 && is_valid_point(self.point())
    }
}

/// How a [`ReferenceEstimate`] was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// The query sits on a reference waypoint.
    Exact,

    /// Linear interpolation between two bracketing waypoints.
    Interpolated,

    /// No bracket was available; the closest waypoint's mile.
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceEstimate {
    pub mile: f64,
    pub method: Method,

    /// Distance from the query to the closest reference waypoint, in
    /// miles.
    pub nearest_miles: f64,
}

/// Reference waypoints, sorted ascending by mile.
#[derive(Debug, Clone, Default)]
pub struct References {
    waypoints: Vec<ReferenceWaypoint>,
}

impl References {
    /// Sorts `waypoints` by mile and drops exact duplicates (the same
    /// point found in more than one source).
    ///
    /// Ties on mile are ordered by name and position so that copies
    /// always end up next to each other.
    pub fn new(mut waypoints: Vec<ReferenceWaypoint>) -> Self {
        let count = waypoints.len();
        waypoints.sort_by(|a, b| {
            a.mile
                .total_cmp(&b.mile)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.latitude.total_cmp(&b.latitude))
                .then_with(|| a.longitude.total_cmp(&b.longitude))
        });
        waypoints.dedup();
        if waypoints.len() != count {
            debug!("dropped {} duplicate references", count - waypoints.len());
        }
        Self { waypoints }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceWaypoint> {
        self.waypoints.iter()
    }

    /// Estimates the mile marker of `query`.
    ///
    /// Returns `None` when there are no references or `query` is not a
    /// valid position. Otherwise:
    ///
    /// 1. If the closest waypoint is within
    ///    `exact_match_threshold_miles`, its mile is returned as-is.
    /// 2. Among waypoints within `search_radius_miles`, the nearest
    ///    lower-mile and higher-mile neighbours of the closest
    ///    waypoint are found. The closest waypoint and whichever
    ///    neighbour is nearer to the query bracket it, and the mile
    ///    is interpolated by the ratio of distances to the two ends.
    /// 3. Without a neighbour, the closest waypoint's mile is used.
    pub fn resolve(&self, query: Point<f64>, config: &Config) -> Option<ReferenceEstimate> {
        if !is_valid_point(query) {
            return None;
        }
        let distances: Vec<f64> = self
            .waypoints
            .iter()
            .map(|waypoint| haversine_miles(query, waypoint.point()))
            .collect();

        let (closest_idx, &nearest_miles) = distances
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))?;
        let closest = &self.waypoints[closest_idx];

        if nearest_miles < config.exact_match_threshold_miles {
            return Some(ReferenceEstimate {
                mile: closest.mile,
                method: Method::Exact,
                nearest_miles,
            });
        }

        let mut before: Option<(&ReferenceWaypoint, f64)> = None;
        let mut after: Option<(&ReferenceWaypoint, f64)> = None;
        let candidates = self
            .waypoints
            .iter()
            .zip(distances.iter().copied())
            .filter(|(_, distance)| *distance < config.search_radius_miles);
        for (waypoint, distance) in candidates {
            if waypoint.mile < closest.mile {
                // Sorted by mile, so the last one seen is the largest.
                before = Some((waypoint, distance));
            } else if waypoint.mile > closest.mile && after.is_none() {
                after = Some((waypoint, distance));
            }
        }

        let neighbour = match (before, after) {
            (Some(before), Some(after)) => Some(if before.1 <= after.1 { before } else { after }),
            (before, after) => before.or(after),
        };

        let interpolated = neighbour.and_then(|(other, other_miles)| {
            let ((lo, d_lo), (hi, d_hi)) = if other.mile < closest.mile {
                ((other, other_miles), (closest, nearest_miles))
            } else {
                ((closest, nearest_miles), (other, other_miles))
            };
            let total = d_lo + d_hi;
            (total > 0.0).then(|| lo.mile + (d_lo / total) * (hi.mile - lo.mile))
        });

        Some(match interpolated {
            Some(mile) => ReferenceEstimate {
                mile: round_tenth(mile),
                method: Method::Interpolated,
                nearest_miles,
            },
            None => ReferenceEstimate {
                mile: closest.mile,
                method: Method::Nearest,
                nearest_miles,
            },
        })
    }
}

impl FromIterator<ReferenceWaypoint> for References {
    fn from_iter<I: IntoIterator<Item = ReferenceWaypoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Method, ReferenceWaypoint, References};
    use crate::Config;
    use approx::assert_relative_eq;
    use geo::point;

    /// Three waypoints due north of each other, ~4.1 miles apart.
    fn meridian() -> References {
        References::new(vec![
            ReferenceWaypoint::new("twenty", 20.0, 35.12, -84.0),
            ReferenceWaypoint::new("ten", 10.0, 35.00, -84.0),
            ReferenceWaypoint::new("fifteen", 15.0, 35.06, -84.0),
        ])
    }

    #[test]
    fn test_sorted_by_mile() {
        let miles: Vec<f64> = meridian().iter().map(|w| w.mile).collect();
        assert_eq!(miles, [10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_duplicates_dropped() {
        let springer = ReferenceWaypoint::new("Springer", 0.0, 34.6272, -84.1939);
        let refs = References::new(vec![springer.clone(), springer.clone(), springer]);
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_separated_duplicates_dropped() {
        // Same mile, so a stable sort alone would leave `b` between
        // the two copies of `a`.
        let a = ReferenceWaypoint::new("Gooch Gap", 5.0, 34.65, -84.04);
        let b = ReferenceWaypoint::new("Gooch Gap Shelter", 5.0, 34.66, -84.03);
        let refs = References::new(vec![a.clone(), b.clone(), a.clone(), b]);
        assert_eq!(refs.len(), 2);
        let names: Vec<&str> = refs.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["Gooch Gap", "Gooch Gap Shelter"]);
    }

    #[test]
    fn test_search_radius_is_exclusive() {
        // Mile 15 is 0.04° (~2.76 miles) north of the query.
        let query = point!(x: -84.0, y: 35.02);
        let to_fifteen = crate::math::haversine_miles(query, point!(x: -84.0, y: 35.06));
        let config = Config {
            search_radius_miles: to_fifteen,
            ..Config::default()
        };
        let estimate = meridian().resolve(query, &config).unwrap();
        assert_eq!(estimate.method, Method::Nearest);
        assert_eq!(estimate.mile, 10.0);
    }

    #[test]
    fn test_empty_is_none() {
        let refs = References::default();
        assert!(refs.resolve(point!(x: -84.0, y: 35.0), &Config::default()).is_none());
    }

    #[test]
    fn test_exact_match() {
        let refs = meridian();
        let estimate = refs
            .resolve(point!(x: -84.0, y: 35.06), &Config::default())
            .unwrap();
        assert_eq!(estimate.mile, 15.0);
        assert_eq!(estimate.method, Method::Exact);
        assert_eq!(estimate.nearest_miles, 0.0);
    }

    #[test]
    fn test_interpolation_one_third() {
        // Twice as close to mile 10 as to mile 15.
        let refs = meridian();
        let estimate = refs
            .resolve(point!(x: -84.0, y: 35.02), &Config::default())
            .unwrap();
        assert_eq!(estimate.method, Method::Interpolated);
        assert_relative_eq!(estimate.mile, 10.0 + 5.0 / 3.0, epsilon = 0.1);
    }

    #[test]
    fn test_interpolation_upper_bracket() {
        // Closest is mile 15; mile 20 is nearer than mile 10.
        let refs = meridian();
        let estimate = refs
            .resolve(point!(x: -84.0, y: 35.08), &Config::default())
            .unwrap();
        assert_eq!(estimate.method, Method::Interpolated);
        assert!(estimate.mile > 15.0 && estimate.mile < 20.0, "{}", estimate.mile);
        assert_relative_eq!(estimate.mile, 15.0 + 5.0 / 3.0, epsilon = 0.1);
    }

    #[test]
    fn test_outside_radius_uses_nearest() {
        let refs = meridian();
        // ~7 miles west of mile 10.
        let estimate = refs
            .resolve(point!(x: -84.125, y: 35.0), &Config::default())
            .unwrap();
        assert_eq!(estimate.method, Method::Nearest);
        assert_eq!(estimate.mile, 10.0);
        assert!(estimate.nearest_miles > 5.0);
    }

    #[test]
    fn test_lone_reference_uses_nearest() {
        let refs = References::new(vec![ReferenceWaypoint::new("only", 42.0, 35.0, -84.0)]);
        let estimate = refs
            .resolve(point!(x: -84.0, y: 35.01), &Config::default())
            .unwrap();
        assert_eq!(estimate.method, Method::Nearest);
        assert_eq!(estimate.mile, 42.0);
    }

    #[test]
    fn test_invalid_query_is_none() {
        let refs = meridian();
        let config = Config::default();
        assert!(refs.resolve(point!(x: f64::NAN, y: f64::NAN), &config).is_none());
        assert!(refs.resolve(point!(x: -84.0, y: f64::NAN), &config).is_none());
        assert!(refs.resolve(point!(x: -84.0, y: 135.0), &config).is_none());
    }

    #[test]
    fn test_validity() {
        assert!(ReferenceWaypoint::new("ok", 0.0, 34.6, -84.2).is_valid());
        assert!(!ReferenceWaypoint::new("neg", -1.0, 34.6, -84.2).is_valid());
        assert!(!ReferenceWaypoint::new("lat", 1.0, 94.6, -84.2).is_valid());
        assert!(!ReferenceWaypoint::new("nan", f64::NAN, 34.6, -84.2).is_valid());
    }
}
