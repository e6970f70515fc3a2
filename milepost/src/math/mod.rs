mod haversine;

pub use haversine::haversine_miles;
use geo::Point;

/// True when `point` is a finite `x: longitude, y: latitude` pair
/// within degree bounds.
pub fn is_valid_point(point: Point<f64>) -> bool {
    (-90.0..=90.0).contains(&point.y()) && (-180.0..=180.0).contains(&point.x())
}

/// Rounds `miles` to one decimal place, the precision mile markers
/// are published at.
pub fn round_tenth(miles: f64) -> f64 {
    (miles * 10.0).round() / 10.0
}
