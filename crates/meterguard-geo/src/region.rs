//! Coarse geographic plausibility checks.
//!
//! A bounding box accepts some points across the borders and rejects a few
//! remote territories; it is a sanity filter, not a boundary test.

use geo::{coord, Intersects, Rect};
use meterguard_core::models::Coordinates;
use serde::{Deserialize, Serialize};

/// Inclusive latitude/longitude box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Continental Chile
pub const CHILE: BoundingBox =
    BoundingBox { min_lat: -56.0, max_lat: -17.5, min_lng: -75.0, max_lng: -66.0 };

impl BoundingBox {
    fn to_rect(self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lng, y: self.min_lat },
            coord! { x: self.max_lng, y: self.max_lat },
        )
    }

    /// True when the point lies inside or on the edge of the box
    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        if !coordinates.lat.is_finite() || !coordinates.lng.is_finite() {
            return false;
        }
        self.to_rect().intersects(&coord! { x: coordinates.lng, y: coordinates.lat })
    }
}

/// Coarse check that a point falls within Chile's bounding box
pub fn is_within_chile(coordinates: &Coordinates) -> bool {
    CHILE.contains(coordinates)
}
