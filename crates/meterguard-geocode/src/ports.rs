//! Geocoding provider port

use async_trait::async_trait;
use meterguard_core::error::Result;
use meterguard_core::models::{Coordinates, GeocodingResult, ReverseGeocodingResult};

/// Port implemented by every external geocoding backend
///
/// A query the provider answered without matches returns `Ok(vec![])`.
/// `Err` is reserved for transport, HTTP, and parsing failures so the
/// geocoder can tell "nothing there" apart from "provider unavailable".
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Short identifier used in logs and error messages
    fn name(&self) -> &str;

    /// Resolve a free-text address to candidate locations, best first
    async fn forward(&self, address: &str) -> Result<Vec<GeocodingResult>>;

    /// Resolve a location to candidate addresses, best first
    async fn reverse(&self, coordinates: &Coordinates) -> Result<Vec<ReverseGeocodingResult>>;
}
