use geo::{Distance, HaversineMeasure};
use meterguard_core::models::Coordinates;

use crate::CoordinatesExt;

/// Spherical Earth radius used for every distance in the engine
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine great-circle distance in meters
///
/// Symmetric in its arguments and exactly zero for identical inputs.
pub fn calculate_distance(a: &Coordinates, b: &Coordinates) -> f64 {
    if a == b {
        return 0.0;
    }

    // Canonical argument order keeps the result bit-for-bit symmetric
    let (a, b) = if (a.lat, a.lng) <= (b.lat, b.lng) { (a, b) } else { (b, a) };

    HaversineMeasure::new(EARTH_RADIUS_METERS).distance(a.to_point(), b.to_point())
}
