use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Postal address as resolved by a geocoding provider or registered for a meter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    /// Single human-readable line, the canonical geocoding input/output
    pub formatted_address: String,
}

impl Address {
    /// Build an address carrying only its formatted line
    pub fn formatted(formatted_address: impl Into<String>) -> Self {
        Self { formatted_address: formatted_address.into(), ..Default::default() }
    }
}

/// Precision of a forward geocoding match, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Accuracy {
    Rooftop,
    RangeInterpolated,
    GeometricCenter,
    Approximate,
}

/// One forward geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodingResult {
    pub coordinates: Coordinates,
    pub address: Address,
    pub accuracy: Accuracy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// One reverse geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocodingResult {
    pub address: Address,
    /// Location the provider snapped the query to
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}
