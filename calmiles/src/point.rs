use crate::options::Point;
use anyhow::{anyhow, Result};
use milepost::{Calibration, Config};
use serde::Serialize;

#[derive(Serialize)]
struct Located {
    lat: f64,
    lng: f64,
    #[serde(flatten)]
    calibration: Calibration,
}

impl Point {
    pub fn run(&self, config: Config) -> Result<()> {
        let calibrator = self.sources.calibrator(config)?;
        let query = milepost::geo::Point::from(self.location.0);
        let calibration = calibrator
            .calibrate(query)
            .ok_or_else(|| anyhow!("could not calibrate {:?}", self.location.0))?;
        let located = Located {
            lat: query.y(),
            lng: query.x(),
            calibration,
        };
        let out = std::io::stdout().lock();
        serde_json::to_writer_pretty(out, &located)?;
        println!();
        Ok(())
    }
}
