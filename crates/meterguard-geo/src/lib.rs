//! MeterGuard Geo - Distance and region predicates
//!
//! Pure functions over [`Coordinates`]: great-circle distance, coarse
//! geographic plausibility checks and fabricated-value heuristics. No I/O
//! happens in this crate.

pub mod distance;
pub mod pattern;
pub mod region;

pub use distance::{calculate_distance, EARTH_RADIUS_METERS};
pub use pattern::{bucket_key, has_suspicious_digits, is_suspicious_pattern};
pub use region::{is_within_chile, BoundingBox, CHILE};

use meterguard_core::models::Coordinates;

/// Extension trait bridging [`Coordinates`] to the `geo` crate
pub trait CoordinatesExt {
    /// Convert to a `geo::Point` (x = longitude, y = latitude)
    fn to_point(&self) -> geo::Point<f64>;
}

impl CoordinatesExt for Coordinates {
    fn to_point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lng, self.lat)
    }
}
