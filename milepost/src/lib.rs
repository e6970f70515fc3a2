//! # Trail mile-marker calibration
//!
//! `milepost` estimates where along a trail a GPS coordinate sits,
//! as a mile marker and region (state). Two resolvers are available:
//!
//! - [`References`]: interpolates between sparse, trusted reference
//!   waypoints.
//! - [`Track`]: projects onto the nearest sample of a dense GPX
//!   track and reads its cumulative distance.
//!
//! [`Calibrator`] chooses between them and produces a
//! [`Calibration`].

mod calibrator;
mod config;
pub mod constants;
mod error;
pub mod math;
pub mod record;
mod reference;
mod region;
mod track;
pub mod validate;

pub use {
    crate::{
        calibrator::{should_apply, Calibration, Calibrator, CalibratorBuilder, Source, Strategy},
        config::Config,
        error::MilepostError,
        reference::{Method, ReferenceEstimate, ReferenceWaypoint, References},
        region::{RegionBoundary, Regions, UNKNOWN_REGION},
        track::{Track, TrackEstimate, TrackPoint},
    },
    geo,
};
