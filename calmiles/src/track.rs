use crate::options::TrackInfo;
use anyhow::{Context, Result};
use log::warn;
use milepost::{Config, Track};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    points: usize,
    total_miles: f64,
    trail_length: f64,
    min_elevation: Option<f64>,
    max_elevation: Option<f64>,
}

impl TrackInfo {
    pub fn run(&self, config: Config) -> Result<()> {
        let track =
            Track::from_path(&self.track).with_context(|| format!("loading {:?}", self.track))?;
        let summary = Self::summarize(&track, &config);

        if (summary.total_miles - config.trail_length).abs() > config.disagreement_miles {
            warn!(
                "track is {:.1} miles, expected {:.1}",
                summary.total_miles, config.trail_length
            );
        }

        let out = std::io::stdout().lock();
        serde_json::to_writer_pretty(out, &summary)?;
        println!();
        Ok(())
    }

    fn summarize(track: &Track, config: &Config) -> Summary {
        let elevations = track.points().iter().filter_map(|sample| sample.elevation);
        let (min_elevation, max_elevation) = elevations.fold((None, None), |(lo, hi), elev| {
            (
                Some(lo.map_or(elev, |lo: f64| lo.min(elev))),
                Some(hi.map_or(elev, |hi: f64| hi.max(elev))),
            )
        });
        Summary {
            points: track.len(),
            total_miles: track.total_miles(),
            trail_length: config.trail_length,
            min_elevation,
            max_elevation,
        }
    }
}
