//! Compare calibrated records against known reference waypoints.

use crate::reference::{ReferenceWaypoint, References};
use log::warn;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

/// Word-set similarity needed for a fuzzy name match.
const FUZZY_THRESHOLD: f64 = 0.5;

/// Number of largest differences shown in the text report.
const REPORT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MileDifference {
    pub name: String,
    pub calibrated_mile: f64,
    pub known_mile: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyMatch {
    pub name: String,
    pub candidate: String,
    pub calibrated_mile: f64,
    pub known_mile: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub total: usize,
    pub matched: usize,
    pub differences: Vec<MileDifference>,
    pub fuzzy: Vec<FuzzyMatch>,
    pub unmatched: Vec<String>,
    pub average_difference: f64,
    pub max_difference: f64,
}

/// Jaccard similarity of the whitespace separated word sets of `a`
/// and `b`.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let a: HashSet<&str> = a.split_whitespace().collect();
    let b: HashSet<&str> = b.split_whitespace().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Matches each record to a reference by case-insensitive name and
/// reports the mile differences. Differences above `warn_above` miles
/// are logged.
pub fn validate(records: &[Value], references: &References, warn_above: f64) -> ValidationReport {
    let known: HashMap<String, &ReferenceWaypoint> = references
        .iter()
        .map(|waypoint| (waypoint.name.to_lowercase(), waypoint))
        .collect();

    let mut report = ValidationReport {
        total: records.len(),
        ..ValidationReport::default()
    };

    for record in records {
        let Some(name) = record.get("name").and_then(Value::as_str) else {
            continue;
        };
        let calibrated_mile = record.get("mile").and_then(Value::as_f64).unwrap_or(0.0);
        let key = name.to_lowercase();

        if let Some(waypoint) = known.get(&key) {
            let difference = (calibrated_mile - waypoint.mile).abs();
            if difference > warn_above {
                warn!(
                    "{name}: calibrated {calibrated_mile:.1} vs known {:.1} (diff: {difference:.1} miles)",
                    waypoint.mile
                );
            }
            report.matched += 1;
            report.differences.push(MileDifference {
                name: name.to_string(),
                calibrated_mile,
                known_mile: waypoint.mile,
                difference,
            });
        } else if let Some((waypoint, score)) = fuzzy_match(&key, references) {
            report.fuzzy.push(FuzzyMatch {
                name: name.to_string(),
                candidate: waypoint.name.clone(),
                calibrated_mile,
                known_mile: waypoint.mile,
                score,
            });
        } else {
            report.unmatched.push(name.to_string());
        }
    }

    if !report.differences.is_empty() {
        let sum: f64 = report.differences.iter().map(|d| d.difference).sum();
        report.average_difference = sum / report.differences.len() as f64;
        report.max_difference = report
            .differences
            .iter()
            .map(|d| d.difference)
            .fold(0.0, f64::max);
    }
    report
}

/// Best scoring reference above [`FUZZY_THRESHOLD`]; the first wins
/// ties.
fn fuzzy_match<'a>(name: &str, references: &'a References) -> Option<(&'a ReferenceWaypoint, f64)> {
    let mut best: Option<(&ReferenceWaypoint, f64)> = None;
    for waypoint in references.iter() {
        let score = jaccard(name, &waypoint.name.to_lowercase());
        if score > FUZZY_THRESHOLD && best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((waypoint, score));
        }
    }
    best
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(80);
        writeln!(f, "{rule}")?;
        writeln!(f, "MILE MARKER VALIDATION REPORT")?;
        writeln!(f, "{rule}")?;
        writeln!(f)?;
        writeln!(f, "Total records: {}", self.total)?;
        writeln!(f, "Matched with known data: {}", self.matched)?;
        writeln!(f, "Close matches (fuzzy): {}", self.fuzzy.len())?;
        writeln!(f, "No match found: {}", self.unmatched.len())?;
        writeln!(f)?;
        writeln!(f, "Mile marker accuracy:")?;
        writeln!(f, "  Average difference: {:.2} miles", self.average_difference)?;
        writeln!(f, "  Maximum difference: {:.2} miles", self.max_difference)?;

        if !self.differences.is_empty() {
            let mut largest: Vec<&MileDifference> = self.differences.iter().collect();
            largest.sort_by(|a, b| b.difference.total_cmp(&a.difference));
            writeln!(f)?;
            writeln!(f, "Largest differences:")?;
            for d in largest.into_iter().take(REPORT_TOP_N) {
                writeln!(
                    f,
                    "  {}: calibrated {:.1} vs known {:.1} (diff: {:.1})",
                    d.name, d.calibrated_mile, d.known_mile, d.difference
                )?;
            }
        }

        if !self.fuzzy.is_empty() {
            writeln!(f)?;
            writeln!(f, "Possible name matches (need verification):")?;
            for m in self.fuzzy.iter().take(REPORT_TOP_N) {
                writeln!(f, "  '{}' might be '{}'", m.name, m.candidate)?;
            }
        }
        Ok(())
    }
}
