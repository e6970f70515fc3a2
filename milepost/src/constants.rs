/// Official length of the Appalachian Trail, in miles.
pub const TRAIL_LENGTH: f64 = 2197.4;

/// Earth radius used for every distance in this crate, in miles.
///
/// Not WGS84 exact, but shared by all resolvers so relative
/// comparisons stay consistent.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;
