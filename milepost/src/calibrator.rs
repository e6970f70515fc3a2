use crate::{
    config::Config,
    math::{is_valid_point, round_tenth},
    reference::{ReferenceEstimate, ReferenceWaypoint, References},
    region::UNKNOWN_REGION,
    track::{Track, TrackEstimate},
    MilepostError,
};
use geo::Point;
use log::{debug, warn};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// Which resolver a [`Calibrator`] consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Track when one is loaded, reference waypoints otherwise.
    #[default]
    Auto,

    /// Reference waypoint interpolation only.
    Reference,

    /// Nearest track sample only.
    Track,
}

impl FromStr for Strategy {
    type Err = MilepostError;

    fn from_str(s: &str) -> Result<Self, MilepostError> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "reference" | "ref" => Ok(Self::Reference),
            "track" | "gpx" => Ok(Self::Track),
            _ => Err(MilepostError::Strategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Reference => "reference",
            Self::Track => "track",
        };
        f.write_str(name)
    }
}

/// Resolver that produced a [`Calibration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reference,
    Track,
}

/// A calibrated trail position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    /// Mile from the southern terminus, one decimal.
    pub mile: f64,

    /// Mile from the northern terminus, one decimal.
    pub sobo_mile: f64,

    /// Region code, or [`UNKNOWN_REGION`].
    pub region: String,

    pub source: Source,

    pub low_confidence: bool,
}

impl Calibration {
    /// Mile value older tooling wrote for "could not calibrate".
    pub const UNRESOLVED_MILE: f64 = 0.0;

    /// The `(0.0, "UNKNOWN")` "no result" value older tooling used
    /// in place of `None`.
    pub fn unresolved(trail_length: f64) -> Self {
        Self {
            mile: Self::UNRESOLVED_MILE,
            sobo_mile: trail_length,
            region: UNKNOWN_REGION.to_string(),
            source: Source::Reference,
            low_confidence: true,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.mile <= Self::UNRESOLVED_MILE && self.region == UNKNOWN_REGION
    }
}

/// Whether a calibration should be written back to its record.
///
/// Mile 0.0 is the southern terminus and is applied when it carries
/// a region; only `None` and the legacy unresolved value are not.
pub fn should_apply(calibration: Option<&Calibration>) -> bool {
    calibration.is_some_and(|calibration| !calibration.is_unresolved())
}

/// Maps coordinates to trail miles and regions.
///
/// All state is read-only after [`CalibratorBuilder::build`], so a
/// calibrator can be shared across threads.
#[derive(Debug, Clone)]
pub struct Calibrator {
    config: Config,
    references: References,
    track: Option<Track>,
    strategy: Strategy,
}

impl Calibrator {
    pub fn builder() -> CalibratorBuilder {
        CalibratorBuilder {
            config: Config::default(),
            references: Vec::new(),
            track: None,
            strategy: Strategy::Auto,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn references(&self) -> &References {
        &self.references
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Region code for `mile`.
    pub fn region(&self, mile: f64) -> &str {
        self.config.regions.lookup(mile)
    }

    /// Calibrates a single point.
    ///
    /// Returns `None` when the selected resolver has no data, or when
    /// `query` is not a finite, in-range position.
    ///
    /// With [`Strategy::Auto`] and both data sets loaded, the track
    /// estimate is authoritative and the reference estimate serves as
    /// a cross-check: a disagreement beyond `disagreement_miles` is
    /// logged, and a low confidence track estimate is replaced by the
    /// reference estimate.
    pub fn calibrate(&self, query: Point<f64>) -> Option<Calibration> {
        if !is_valid_point(query) {
            warn!("({}, {}) is not a valid position", query.y(), query.x());
            return None;
        }
        match self.strategy {
            Strategy::Reference => self.reference_estimate(query).map(|e| self.with_reference(e)),
            Strategy::Track => self.track_estimate(query).map(|e| self.with_track(e)),
            Strategy::Auto => {
                let Some(track) = self.track_estimate(query) else {
                    return self.reference_estimate(query).map(|e| self.with_reference(e));
                };
                match self.reference_estimate(query) {
                    None => Some(self.with_track(track)),
                    Some(reference) => {
                        let delta = (track.mile - reference.mile).abs();
                        if delta > self.config.disagreement_miles {
                            warn!(
                                "({:.5}, {:.5}): track says mile {:.1}, references say {:.1}",
                                query.y(),
                                query.x(),
                                track.mile,
                                reference.mile
                            );
                        }
                        if track.low_confidence {
                            debug!("low confidence track estimate, using references");
                            Some(self.with_reference(reference))
                        } else {
                            Some(self.with_track(track))
                        }
                    }
                }
            }
        }
    }

    fn reference_estimate(&self, query: Point<f64>) -> Option<ReferenceEstimate> {
        self.references.resolve(query, &self.config)
    }

    fn track_estimate(&self, query: Point<f64>) -> Option<TrackEstimate> {
        self.track
            .as_ref()
            .and_then(|track| track.resolve(query, &self.config))
    }

    fn with_reference(&self, estimate: ReferenceEstimate) -> Calibration {
        self.finish(estimate.mile, Source::Reference, false)
    }

    fn with_track(&self, estimate: TrackEstimate) -> Calibration {
        self.finish(estimate.mile, Source::Track, estimate.low_confidence)
    }

    fn finish(&self, mile: f64, source: Source, low_confidence: bool) -> Calibration {
        let trail_length = self.config.trail_length;
        let clamped = mile.clamp(0.0, trail_length);
        if clamped != mile {
            warn!("mile {mile:.1} is outside [0, {trail_length}], clamping");
        }
        let mile = round_tenth(clamped);
        Calibration {
            mile,
            sobo_mile: self.config.sobo_mile(mile),
            region: self.region(mile).to_string(),
            source,
            low_confidence,
        }
    }
}

pub struct CalibratorBuilder {
    config: Config,
    references: Vec<ReferenceWaypoint>,
    track: Option<Track>,
    strategy: Strategy,
}

impl CalibratorBuilder {
    /// Calibration settings (defaults to [`Config::default`]).
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Reference waypoints, in any order.
    #[must_use]
    pub fn references(mut self, references: Vec<ReferenceWaypoint>) -> Self {
        self.references = references;
        self
    }

    /// Dense trail track (optional).
    #[must_use]
    pub fn track(mut self, track: Track) -> Self {
        self.track = Some(track);
        self
    }

    /// Resolver selection (defaults to [`Strategy::Auto`]).
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> Result<Calibrator, MilepostError> {
        let Self {
            config,
            references,
            track,
            strategy,
        } = self;
        config.validate()?;

        let total = references.len();
        let references: References = references
            .into_iter()
            .filter(ReferenceWaypoint::is_valid)
            .collect();
        if references.len() < total {
            warn!(
                "ignoring {} invalid or duplicate references",
                total - references.len()
            );
        }

        let track = track.filter(|track| !track.is_empty());

        match strategy {
            Strategy::Track if track.is_none() => return Err(MilepostError::Builder("track")),
            Strategy::Reference if references.is_empty() => {
                return Err(MilepostError::Builder("references"))
            }
            _ => (),
        }
        if references.is_empty() {
            warn!("no reference waypoints loaded");
        }

        debug!(
            "calibrator; strategy: {strategy}, references: {}, track: {}",
            references.len(),
            track.as_ref().map_or(0, Track::len)
        );

        Ok(Calibrator {
            config,
            references,
            track,
            strategy,
        })
    }
}
