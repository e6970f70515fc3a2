use anyhow::{anyhow, Context, Error as AnyError};
use clap::{Args, Parser, Subcommand};
use geo::geometry::Coord;
use log::info;
use milepost::{record, Calibrator, Config, Strategy, Track};
use std::{path::PathBuf, str::FromStr};

/// Calibrate trail mile markers from GPS coordinates.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON file overriding calibration settings.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Calibrate a JSON array of records in bulk.
    Calibrate(Calibrate),

    /// Calibrate a single "lat,lon" and print the result as JSON.
    Point(Point),

    /// Compare calibrated records against the reference waypoints.
    Validate(Validate),

    /// Summarize a GPX track.
    Track(TrackInfo),
}

/// Where calibration data comes from.
#[derive(Debug, Clone, Args)]
pub struct Sources {
    /// Reference waypoints, a JSON array of {name, mile, lat, lng}.
    #[arg(short, long)]
    pub references: Option<PathBuf>,

    /// GPX track of the trail.
    #[arg(short, long)]
    pub track: Option<PathBuf>,

    /// Resolver to use: auto, reference, or track.
    #[arg(short, long, default_value_t = Strategy::Auto)]
    pub strategy: Strategy,
}

impl Sources {
    pub fn calibrator(&self, config: Config) -> Result<Calibrator, AnyError> {
        let mut builder = Calibrator::builder().config(config).strategy(self.strategy);
        if let Some(path) = &self.references {
            let references = record::load_references(path)
                .with_context(|| format!("loading references {path:?}"))?;
            builder = builder.references(references);
        }
        if let Some(path) = &self.track {
            let track =
                Track::from_path(path).with_context(|| format!("loading track {path:?}"))?;
            info!("loaded {} track points, {:.1} miles", track.len(), track.total_miles());
            builder = builder.track(track);
        }
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone, Args)]
pub struct Calibrate {
    #[command(flatten)]
    pub sources: Sources,

    /// Only calibrate records whose mile is missing or zero.
    #[arg(long)]
    pub only_missing: bool,

    /// Write run statistics to this JSON file.
    #[arg(long)]
    pub stats: Option<PathBuf>,

    /// Output file (defaults to stdout).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Input records, a JSON array of objects with lat and lng.
    pub input: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Point {
    #[command(flatten)]
    pub sources: Sources,

    /// Query "lat,lon".
    #[arg(allow_hyphen_values = true)]
    pub location: LatLon,
}

#[derive(Debug, Clone, Args)]
pub struct Validate {
    /// Known waypoints, a JSON array of {name, mile, lat, lng}.
    #[arg(short, long)]
    pub references: PathBuf,

    /// Warn about differences larger than this many miles
    /// [default: the config's disagreement_miles].
    #[arg(long)]
    pub warn_above: Option<f64>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Calibrated records to check.
    pub input: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct TrackInfo {
    /// GPX track of the trail.
    #[arg(short, long)]
    pub track: PathBuf,
}

#[derive(Clone, Copy, Debug)]
pub struct LatLon(pub Coord<f64>);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(anyhow!("lat,lon out of range"));
        }
        Ok(Self(Coord { y: lat, x: lon }))
    }
}
