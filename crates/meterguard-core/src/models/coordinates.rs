//! Canonical WGS 84 coordinate pair used across all meterguard crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Null Island, the usual value of an unset GPS fix
    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// True when both components are finite and inside the WGS 84 range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }

    /// True for the exact (0, 0) pair
    pub fn is_origin(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    /// Round both components to `decimals` places
    pub fn rounded(&self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        Self::new((self.lat * factor).round() / factor, (self.lng * factor).round() / factor)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}
