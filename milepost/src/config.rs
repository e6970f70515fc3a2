//! Calibration settings.

use crate::{constants::TRAIL_LENGTH, math::round_tenth, region::Regions, MilepostError};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total trail length, in miles.
    pub trail_length: f64,

    /// Ordered region boundary table.
    pub regions: Regions,

    /// Reference waypoints farther than this from a query point are
    /// not used for interpolation.
    pub search_radius_miles: f64,

    /// A query this close to a reference waypoint takes that
    /// waypoint's mile as-is.
    pub exact_match_threshold_miles: f64,

    /// Track results farther than this from the nearest track sample
    /// are flagged as low confidence.
    pub low_confidence_miles: f64,

    /// Warn when the track and reference estimates differ by more
    /// than this.
    pub disagreement_miles: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trail_length: TRAIL_LENGTH,
            regions: Regions::default(),
            search_radius_miles: 5.0,
            exact_match_threshold_miles: 0.1,
            low_confidence_miles: 0.5,
            disagreement_miles: 1.0,
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields take their default
    /// values.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MilepostError> {
        debug!("loading config {:?}", path.as_ref());
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), MilepostError> {
        if !(self.trail_length > 0.0) {
            return Err(MilepostError::Config("trail_length must be positive"));
        }
        if self.regions.is_empty() {
            return Err(MilepostError::Config("regions must not be empty"));
        }
        if !(self.search_radius_miles > 0.0) {
            return Err(MilepostError::Config("search_radius_miles must be positive"));
        }
        if !(self.exact_match_threshold_miles >= 0.0) {
            return Err(MilepostError::Config(
                "exact_match_threshold_miles must not be negative",
            ));
        }
        if !(self.low_confidence_miles >= 0.0) {
            return Err(MilepostError::Config("low_confidence_miles must not be negative"));
        }
        if !(self.disagreement_miles >= 0.0) {
            return Err(MilepostError::Config("disagreement_miles must not be negative"));
        }
        Ok(())
    }

    /// Distance from the northern terminus, rounded to one decimal.
    pub fn sobo_mile(&self, mile: f64) -> f64 {
        round_tenth(self.trail_length - mile)
    }
}
