use crate::options::Validate;
use anyhow::{Context, Result};
use milepost::{record, validate, Config, References};

impl Validate {
    pub fn run(&self, config: Config) -> Result<()> {
        let references: References = record::load_references(&self.references)
            .with_context(|| format!("loading references {:?}", self.references))?
            .into_iter()
            .collect();
        let records = record::read_array(&self.input)
            .with_context(|| format!("reading records {:?}", self.input))?;

        let warn_above = self.warn_above.unwrap_or(config.disagreement_miles);
        let report = validate::validate(&records, &references, warn_above);
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{report}");
        }
        Ok(())
    }
}
