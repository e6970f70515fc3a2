//! JSON record loading, batch calibration, and statistics.
//!
//! Records are JSON objects carrying at least `lat` and `lng`. Every
//! other field is passed through untouched; calibration writes
//! `mile`, `soboMile`, and `state`.

use crate::{
    calibrator::{should_apply, Calibration, Calibrator},
    math::is_valid_point,
    reference::ReferenceWaypoint,
    region::UNKNOWN_REGION,
    MilepostError,
};
use geo::Point;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Reads a JSON array from `path`.
pub fn read_array<P: AsRef<Path>>(path: P) -> Result<Vec<Value>, MilepostError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    match serde_json::from_reader(reader)? {
        Value::Array(values) => Ok(values),
        _ => Err(MilepostError::NotAnArray(path.to_path_buf())),
    }
}

/// Writes `value` to `path` as pretty-printed JSON.
pub fn write_json<P, T>(path: P, value: &T) -> Result<(), MilepostError>
where
    P: AsRef<Path>,
    T: Serialize + ?Sized,
{
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Parses reference waypoints from JSON values, skipping any that
/// lack a field or carry out of range values.
pub fn parse_references(values: Vec<Value>) -> Vec<ReferenceWaypoint> {
    let total = values.len();
    let references: Vec<ReferenceWaypoint> = values
        .into_iter()
        .enumerate()
        .filter_map(
            |(idx, value)| match serde_json::from_value::<ReferenceWaypoint>(value) {
                Ok(waypoint) if waypoint.is_valid() => Some(waypoint),
                Ok(waypoint) => {
                    debug!("skipping reference {idx} {:?}, out of range", waypoint.name);
                    None
                }
                Err(e) => {
                    debug!("skipping reference {idx}, {e}");
                    None
                }
            },
        )
        .collect();
    info!(
        "loaded {} reference waypoints, skipped {}",
        references.len(),
        total - references.len()
    );
    references
}

/// Reads reference waypoints (`{name, mile, lat, lng}`) from a JSON
/// array file.
pub fn load_references<P: AsRef<Path>>(path: P) -> Result<Vec<ReferenceWaypoint>, MilepostError> {
    Ok(parse_references(read_array(path)?))
}

/// Returns the record's position, if it has a usable one.
///
/// A coordinate of exactly zero is treated as missing; extraction
/// writes zeros where it found nothing.
pub fn query_point(record: &Value) -> Option<Point<f64>> {
    let lat = record.get("lat")?.as_f64()?;
    let lng = record.get("lng")?.as_f64()?;
    let point = Point::new(lng, lat);
    (lat != 0.0 && lng != 0.0 && is_valid_point(point)).then_some(point)
}

/// The record's current mile, if any.
pub fn existing_mile(record: &Value) -> Option<f64> {
    record.get("mile").and_then(Value::as_f64)
}

/// Writes `calibration` into `record`. Non-object records are left
/// alone.
pub fn apply(record: &mut Value, calibration: &Calibration) {
    if let Some(fields) = record.as_object_mut() {
        fields.insert("mile".into(), calibration.mile.into());
        fields.insert("soboMile".into(), calibration.sobo_mile.into());
        fields.insert("state".into(), calibration.region.clone().into());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Only calibrate records whose `mile` is missing or zero.
    pub only_missing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total: usize,

    /// Records updated by this run.
    pub calibrated: usize,

    /// Records left alone because they already had a mile
    /// (`only_missing`) or could not be calibrated.
    pub skipped: usize,

    /// Records without usable coordinates.
    pub malformed: usize,

    /// Updated records whose estimate is low confidence.
    pub low_confidence: usize,

    /// Records, updated or not, with a mile after the run that is
    /// either positive or paired with a known `state`. Mile 0.0 with
    /// `GA` is the southern terminus; mile 0.0 alone is a placeholder.
    pub with_valid_miles: usize,

    /// Record count per `state`, `UNKNOWN` when absent.
    pub by_state: BTreeMap<String, usize>,
}

enum Outcome {
    Malformed,
    Skipped,
    Calibrated(Calibration),
}

/// Calibrates every record in place and returns run statistics.
///
/// Estimates are computed in parallel against the shared, read-only
/// calibrator and then applied in order. A bad record never aborts
/// the batch.
pub fn calibrate_records(
    calibrator: &Calibrator,
    records: &mut [Value],
    options: BatchOptions,
) -> BatchStats {
    let now = std::time::Instant::now();
    let outcomes: Vec<Outcome> = records
        .par_iter()
        .map(|record| {
            if options.only_missing && existing_mile(record).is_some_and(|mile| mile != 0.0) {
                return Outcome::Skipped;
            }
            let Some(query) = query_point(record) else {
                return Outcome::Malformed;
            };
            let calibration = calibrator.calibrate(query);
            if should_apply(calibration.as_ref()) {
                calibration.map_or(Outcome::Skipped, Outcome::Calibrated)
            } else {
                Outcome::Skipped
            }
        })
        .collect();

    let mut stats = BatchStats {
        total: records.len(),
        ..BatchStats::default()
    };
    for (idx, (record, outcome)) in records.iter_mut().zip(outcomes).enumerate() {
        match outcome {
            Outcome::Malformed => {
                warn!("record {idx} {}: no usable lat/lng", record_name(record));
                stats.malformed += 1;
            }
            Outcome::Skipped => stats.skipped += 1,
            Outcome::Calibrated(calibration) => {
                debug!(
                    "record {idx} {}: mile {:.1} {}",
                    record_name(record),
                    calibration.mile,
                    calibration.region
                );
                if calibration.low_confidence {
                    stats.low_confidence += 1;
                }
                apply(record, &calibration);
                stats.calibrated += 1;
            }
        }
    }

    for record in records.iter() {
        let state = record
            .get("state")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_REGION);
        if existing_mile(record).is_some_and(|mile| mile > 0.0 || state != UNKNOWN_REGION) {
            stats.with_valid_miles += 1;
        }
        *stats.by_state.entry(state.to_string()).or_default() += 1;
    }

    info!(
        "calibrated {}/{} records ({} skipped, {} malformed) in {:?}",
        stats.calibrated,
        stats.total,
        stats.skipped,
        stats.malformed,
        now.elapsed()
    );
    stats
}

fn record_name(record: &Value) -> &str {
    record.get("name").and_then(Value::as_str).unwrap_or("<unnamed>")
}
