//! Mile estimates from a dense, ordered trail track.

use crate::{
    config::Config,
    math::{haversine_miles, is_valid_point},
    MilepostError,
};
use geo::Point;
use itertools::Itertools;
use log::{debug, warn};
use std::{fs::File, io::BufReader, path::Path};

/// A single track sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// `x: longitude, y: latitude`, in degrees.
    pub point: Point<f64>,

    /// Elevation in meters, when the source has it.
    pub elevation: Option<f64>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, elevation: Option<f64>) -> Self {
        Self {
            point: Point::new(longitude, latitude),
            elevation,
        }
    }
}

impl From<&gpx::Waypoint> for TrackPoint {
    fn from(waypoint: &gpx::Waypoint) -> Self {
        Self {
            point: waypoint.point(),
            elevation: waypoint.elevation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackEstimate {
    /// Cumulative track distance at the nearest sample.
    pub mile: f64,

    /// Index of the nearest sample.
    pub index: usize,

    /// Distance from the query to the nearest sample, in miles.
    pub offset_miles: f64,

    /// Elevation of the nearest sample.
    pub elevation: Option<f64>,

    /// The query is farther than `low_confidence_miles` from the
    /// track.
    pub low_confidence: bool,
}

/// An ordered polyline approximating the trail, with the running
/// distance at every sample.
///
/// Index order is the only topology: out-and-back spurs and
/// duplicate passes are walked as-is.
#[derive(Debug, Clone, Default)]
pub struct Track {
    points: Vec<TrackPoint>,

    /// `cumulative_miles[i]` is the distance walked from sample 0 to
    /// sample `i`.
    cumulative_miles: Vec<f64>,
}

impl Track {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        let cumulative_miles = if points.is_empty() {
            Vec::new()
        } else {
            std::iter::once(0.0)
                .chain(
                    points
                        .iter()
                        .tuple_windows()
                        .scan(0.0, |total, (prev, curr)| {
                            *total += haversine_miles(prev.point, curr.point);
                            Some(*total)
                        }),
                )
                .collect()
        };
        Self {
            points,
            cumulative_miles,
        }
    }

    /// Collects every track point of every segment in document order.
    /// Files without tracks fall back to their routes.
    pub fn from_gpx(gpx: &gpx::Gpx) -> Self {
        let mut points: Vec<TrackPoint> = gpx
            .tracks
            .iter()
            .flat_map(|track| &track.segments)
            .flat_map(|segment| &segment.points)
            .map(TrackPoint::from)
            .collect();
        if points.is_empty() {
            points = gpx
                .routes
                .iter()
                .flat_map(|route| &route.points)
                .map(TrackPoint::from)
                .collect();
        }
        Self::new(points)
    }

    /// Reads and parses a GPX file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MilepostError> {
        debug!("loading {:?}", path.as_ref());
        let now = std::time::Instant::now();
        let reader = BufReader::new(File::open(path)?);
        let track = Self::from_gpx(&gpx::read(reader)?);
        debug!(
            "track; len: {}, miles: {:.1}, exec: {:?}",
            track.len(),
            track.total_miles(),
            now.elapsed()
        );
        Ok(track)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn cumulative_miles(&self) -> &[f64] {
        &self.cumulative_miles
    }

    /// Total walked length of the track, in miles.
    pub fn total_miles(&self) -> f64 {
        self.cumulative_miles.last().copied().unwrap_or(0.0)
    }

    /// Projects `query` onto the nearest track sample.
    ///
    /// This is a linear scan; tracks are a few thousand samples and
    /// calibration runs offline. Far-off queries still get an
    /// estimate, flagged as low confidence.
    pub fn resolve(&self, query: Point<f64>, config: &Config) -> Option<TrackEstimate> {
        if !is_valid_point(query) {
            return None;
        }
        let (index, offset_miles) = self
            .points
            .iter()
            .map(|sample| haversine_miles(query, sample.point))
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))?;

        let low_confidence = offset_miles.is_nan() || offset_miles > config.low_confidence_miles;
        if low_confidence {
            warn!(
                "({:.5}, {:.5}) is {offset_miles:.2} miles from the track",
                query.y(),
                query.x()
            );
        }

        Some(TrackEstimate {
            mile: self.cumulative_miles[index],
            index,
            offset_miles,
            elevation: self.points[index].elevation,
            low_confidence,
        })
    }
}

impl FromIterator<TrackPoint> for Track {
    fn from_iter<I: IntoIterator<Item = TrackPoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Track, TrackPoint};
    use crate::{math::haversine_miles, Config};
    use approx::assert_relative_eq;
    use geo::point;

    /// Runs north along a meridian, doubles back, then continues.
    fn zigzag() -> Track {
        [
            (35.00, -84.0),
            (35.01, -84.0),
            (35.02, -84.0),
            (35.02, -84.0),
            (35.01, -84.01),
            (35.03, -84.01),
            (35.05, -84.0),
        ]
        .into_iter()
        .map(|(lat, lon)| TrackPoint::new(lat, lon, Some(1000.0)))
        .collect()
    }

    #[test]
    fn test_cumulative_monotonic() {
        let track = zigzag();
        let cumulative = track.cumulative_miles();
        assert_eq!(cumulative.len(), track.len());
        assert_eq!(cumulative[0], 0.0);
        for pair in cumulative.windows(2) {
            assert!(pair[0] <= pair[1], "{pair:?}");
        }
        // Repeated sample adds nothing.
        assert_eq!(cumulative[2], cumulative[3]);
    }

    #[test]
    fn test_cumulative_sums_segments() {
        let track = zigzag();
        let expected: f64 = track
            .points()
            .windows(2)
            .map(|pair| haversine_miles(pair[0].point, pair[1].point))
            .sum();
        assert_relative_eq!(track.total_miles(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_and_single() {
        let empty = Track::default();
        assert!(empty.cumulative_miles().is_empty());
        assert_eq!(empty.total_miles(), 0.0);
        assert!(empty
            .resolve(point!(x: -84.0, y: 35.0), &Config::default())
            .is_none());

        let single = Track::new(vec![TrackPoint::new(35.0, -84.0, None)]);
        assert_eq!(single.cumulative_miles(), &[0.0]);
        let estimate = single
            .resolve(point!(x: -84.0, y: 35.0), &Config::default())
            .unwrap();
        assert_eq!(estimate.mile, 0.0);
        assert!(!estimate.low_confidence);
    }

    #[test]
    fn test_nearest_sample() {
        let track = zigzag();
        let estimate = track
            .resolve(point!(x: -84.0, y: 35.0499), &Config::default())
            .unwrap();
        assert_eq!(estimate.index, 6);
        assert_eq!(estimate.mile, track.total_miles());
        assert_eq!(estimate.elevation, Some(1000.0));
        assert!(!estimate.low_confidence);
    }

    #[test]
    fn test_first_nearest_wins_on_ties() {
        // Samples 2 and 3 coincide.
        let track = zigzag();
        let estimate = track
            .resolve(point!(x: -84.0, y: 35.02), &Config::default())
            .unwrap();
        assert_eq!(estimate.index, 2);
    }

    #[test]
    fn test_far_query_is_low_confidence() {
        let track = zigzag();
        let estimate = track
            .resolve(point!(x: -83.9, y: 35.0), &Config::default())
            .unwrap();
        assert!(estimate.low_confidence);
        assert!(estimate.offset_miles > 0.5);
    }

    #[test]
    fn test_invalid_query_is_none() {
        let track = zigzag();
        let config = Config::default();
        assert!(track.resolve(point!(x: f64::NAN, y: 35.0), &config).is_none());
        assert!(track.resolve(point!(x: -84.0, y: -91.0), &config).is_none());
    }

    #[test]
    fn test_from_gpx() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="milepost" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="35.00" lon="-84.0"><ele>900.0</ele></trkpt>
      <trkpt lat="35.01" lon="-84.0"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="35.02" lon="-84.0"><ele>950.0</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;
        let gpx = gpx::read(xml.as_bytes()).unwrap();
        let track = Track::from_gpx(&gpx);
        assert_eq!(track.len(), 3);
        assert_eq!(track.points()[0].elevation, Some(900.0));
        assert_eq!(track.points()[1].elevation, None);
        assert_relative_eq!(track.points()[2].point.y(), 35.02);
        assert_relative_eq!(
            track.total_miles(),
            3959.0 * 0.02_f64.to_radians(),
            epsilon = 1e-6
        );
    }
}
