use crate::options::Calibrate;
use anyhow::{Context, Result};
use log::{info, warn};
use milepost::{
    record::{self, BatchOptions, BatchStats},
    Config,
};
use std::io::Write;

impl Calibrate {
    pub fn run(&self, config: Config) -> Result<()> {
        let calibrator = self.sources.calibrator(config)?;
        let mut records = record::read_array(&self.input)
            .with_context(|| format!("reading records {:?}", self.input))?;

        let stats = record::calibrate_records(
            &calibrator,
            &mut records,
            BatchOptions {
                only_missing: self.only_missing,
            },
        );

        match &self.out {
            Some(out) => {
                record::write_json(out, &records).with_context(|| format!("writing {out:?}"))?
            }
            None => {
                let mut out = std::io::stdout().lock();
                serde_json::to_writer_pretty(&mut out, &records)?;
                writeln!(out)?;
            }
        }

        if let Some(path) = &self.stats {
            record::write_json(path, &stats).with_context(|| format!("writing {path:?}"))?;
        }
        Self::summarize(&stats);
        Ok(())
    }

    fn summarize(stats: &BatchStats) {
        info!(
            "{} of {} records have valid mile markers",
            stats.with_valid_miles,
            stats.total
        );
        if stats.low_confidence > 0 {
            warn!(
                "{} calibrations are low confidence, check them by hand",
                stats.low_confidence
            );
        }
        for (state, count) in &stats.by_state {
            info!("  {state}: {count}");
        }
    }
}
