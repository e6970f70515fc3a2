//! Mile range to region (state) lookup.

use serde::{Deserialize, Serialize};

/// Region code returned when no boundary claims a mile.
pub const UNKNOWN_REGION: &str = "UNKNOWN";

/// Appalachian Trail state lines, south to north.
///
/// VA and WV overlap, as do WV and MD at the start of MD's span: the
/// trail weaves along those state lines. Order matters; see
/// [`Regions::lookup`].
const APPALACHIAN_TRAIL: [(&str, f64, f64); 14] = [
    ("GA", 0.0, 78.5),
    ("NC", 78.5, 166.2),
    ("TN", 166.2, 444.8),
    ("VA", 444.8, 1033.0),
    ("WV", 1000.7, 1026.0),
    ("MD", 1026.0, 1070.0),
    ("PA", 1070.0, 1298.0),
    ("NJ", 1298.0, 1378.1),
    ("NY", 1378.1, 1472.9),
    ("CT", 1472.9, 1508.0),
    ("MA", 1508.0, 1599.0),
    ("VT", 1599.0, 1755.0),
    ("NH", 1755.0, 1898.0),
    ("ME", 1898.0, 2197.4),
];

/// An inclusive mile range belonging to a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBoundary {
    pub code: String,
    pub start_mile: f64,
    pub end_mile: f64,
}

impl RegionBoundary {
    pub fn new(code: impl Into<String>, start_mile: f64, end_mile: f64) -> Self {
        Self {
            code: code.into(),
            start_mile,
            end_mile,
        }
    }

    pub fn contains(&self, mile: f64) -> bool {
        self.start_mile <= mile && mile <= self.end_mile
    }
}

/// Ordered region boundary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Regions(Vec<RegionBoundary>);

impl Regions {
    pub fn new(boundaries: Vec<RegionBoundary>) -> Self {
        Self(boundaries)
    }

    /// The 14 state boundaries of the Appalachian Trail.
    pub fn appalachian_trail() -> Self {
        Self(
            APPALACHIAN_TRAIL
                .iter()
                .map(|&(code, start, end)| RegionBoundary::new(code, start, end))
                .collect(),
        )
    }

    /// Returns the code of the first boundary, in declaration order,
    /// containing `mile`, or [`UNKNOWN_REGION`].
    ///
    /// Overlapping boundaries are resolved by declaration order, so
    /// the table order is part of its meaning.
    pub fn lookup(&self, mile: f64) -> &str {
        self.0
            .iter()
            .find(|boundary| boundary.contains(mile))
            .map_or(UNKNOWN_REGION, |boundary| boundary.code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegionBoundary> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Regions {
    fn default() -> Self {
        Self::appalachian_trail()
    }
}

#[cfg(test)]
mod tests {
    use super::{RegionBoundary, Regions, UNKNOWN_REGION};

    #[test]
    fn test_table_shape() {
        let regions = Regions::appalachian_trail();
        assert_eq!(regions.len(), 14);
        let codes: Vec<&str> = regions.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(
            codes,
            ["GA", "NC", "TN", "VA", "WV", "MD", "PA", "NJ", "NY", "CT", "MA", "VT", "NH", "ME"]
        );
    }

    #[test]
    fn test_overlap_resolves_to_first_declared() {
        let regions = Regions::default();
        // Inside both VA (444.8-1033.0) and WV (1000.7-1026.0).
        assert_eq!(regions.lookup(1015.0), "VA");
        // Shared edge between WV and MD, VA still wins.
        assert_eq!(regions.lookup(1026.0), "VA");
        assert_eq!(regions.lookup(1033.5), "MD");
    }

    #[test]
    fn test_shared_edges() {
        let regions = Regions::default();
        assert_eq!(regions.lookup(0.0), "GA");
        assert_eq!(regions.lookup(78.5), "GA");
        assert_eq!(regions.lookup(78.6), "NC");
        assert_eq!(regions.lookup(2197.4), "ME");
    }

    #[test]
    fn test_out_of_range_is_unknown() {
        let regions = Regions::default();
        assert_eq!(regions.lookup(-0.1), UNKNOWN_REGION);
        assert_eq!(regions.lookup(2197.5), UNKNOWN_REGION);
        assert_eq!(regions.lookup(f64::NAN), UNKNOWN_REGION);
    }

    #[test]
    fn test_gap_is_unknown() {
        let regions = Regions::new(vec![
            RegionBoundary::new("A", 0.0, 10.0),
            RegionBoundary::new("B", 20.0, 30.0),
        ]);
        assert_eq!(regions.lookup(15.0), UNKNOWN_REGION);
        assert_eq!(regions.lookup(25.0), "B");
    }

    #[test]
    fn test_reordering_changes_meaning() {
        let regions = Regions::new(vec![
            RegionBoundary::new("WV", 1000.7, 1026.0),
            RegionBoundary::new("VA", 444.8, 1033.0),
        ]);
        assert_eq!(regions.lookup(1015.0), "WV");
    }
}
