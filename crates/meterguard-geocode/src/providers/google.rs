use async_trait::async_trait;
use meterguard_core::config::GeocodingConfig;
use meterguard_core::error::{MeterguardError, Result};
use meterguard_core::models::{
    Accuracy, Address, Coordinates, GeocodingResult, ReverseGeocodingResult,
};
use serde::Deserialize;

use crate::ports::GeocodeProvider;

const PROVIDER: &str = "google";

/// Google Geocoding API adapter
pub struct GoogleGeocoder {
    /// API key sent with every request
    api_key: String,

    /// Base URL (e.g., "https://maps.googleapis.com")
    base_url: String,

    /// Region bias as a ccTLD code (e.g., "cl")
    region: String,

    language: String,

    /// HTTP client
    client: reqwest::Client,
}

impl GoogleGeocoder {
    /// Create a new Google geocoder
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        region: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            region: region.into(),
            language: language.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from configuration; `None` when no API key is configured
    pub fn from_config(config: &GeocodingConfig) -> Option<Self> {
        let key = config.google_api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(Self::new(key, &config.google_base_url, &config.country, &config.language))
    }

    async fn request(&self, params: &[(&str, &str)]) -> Result<GoogleResponse> {
        let response = self
            .client
            .get(format!("{}/maps/api/geocode/json", self.base_url))
            .query(params)
            .query(&[("key", self.api_key.as_str()), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| provider_error(format!("Failed to connect: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(provider_error(format!("HTTP {}: {}", status, error_text)));
        }

        let body: GoogleResponse = response
            .json()
            .await
            .map_err(|e| provider_error(format!("Failed to parse response: {}", e)))?;

        // ZERO_RESULTS is a valid empty answer, every other non-OK status is a failure
        if body.status != "OK" && body.status != "ZERO_RESULTS" {
            return Err(provider_error(format!(
                "API status {}: {}",
                body.status,
                body.error_message.as_deref().unwrap_or("no error message")
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl GeocodeProvider for GoogleGeocoder {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn forward(&self, address: &str) -> Result<Vec<GeocodingResult>> {
        let body = self.request(&[("address", address), ("region", self.region.as_str())]).await?;
        Ok(body.results.into_iter().map(to_geocoding_result).collect())
    }

    async fn reverse(&self, coordinates: &Coordinates) -> Result<Vec<ReverseGeocodingResult>> {
        let latlng = format!("{},{}", coordinates.lat, coordinates.lng);
        let body = self.request(&[("latlng", latlng.as_str())]).await?;
        Ok(body.results.into_iter().map(to_reverse_result).collect())
    }
}

fn provider_error(reason: String) -> MeterguardError {
    MeterguardError::Provider { provider: PROVIDER.to_string(), reason }
}

/// Map Google's `location_type` onto [`Accuracy`]
fn parse_accuracy(location_type: Option<&str>) -> Accuracy {
    match location_type {
        Some("ROOFTOP") => Accuracy::Rooftop,
        Some("RANGE_INTERPOLATED") => Accuracy::RangeInterpolated,
        Some("GEOMETRIC_CENTER") => Accuracy::GeometricCenter,
        _ => Accuracy::Approximate,
    }
}

fn to_address(result: &GoogleResult) -> Address {
    let component = |kinds: &[&str]| {
        kinds.iter().find_map(|kind| {
            result
                .address_components
                .iter()
                .find(|c| c.types.iter().any(|t| t == kind))
                .map(|c| c.long_name.clone())
        })
    };

    Address {
        street: component(&["route"]).unwrap_or_default(),
        number: component(&["street_number"]),
        city: component(&["locality", "administrative_area_level_3", "administrative_area_level_2"])
            .unwrap_or_default(),
        state: component(&["administrative_area_level_1"]).unwrap_or_default(),
        country: component(&["country"]).unwrap_or_default(),
        postal_code: component(&["postal_code"]),
        formatted_address: result.formatted_address.clone(),
    }
}

fn to_geocoding_result(result: GoogleResult) -> GeocodingResult {
    GeocodingResult {
        coordinates: Coordinates::new(result.geometry.location.lat, result.geometry.location.lng),
        address: to_address(&result),
        accuracy: parse_accuracy(result.geometry.location_type.as_deref()),
        place_id: result.place_id,
        types: result.types,
    }
}

fn to_reverse_result(result: GoogleResult) -> ReverseGeocodingResult {
    ReverseGeocodingResult {
        address: to_address(&result),
        coordinates: Coordinates::new(result.geometry.location.lat, result.geometry.location.lng),
        place_id: result.place_id,
        types: result.types,
    }
}

/// Response from the Geocoding API
#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    formatted_address: String,
    geometry: GoogleGeometry,
    #[serde(default)]
    address_components: Vec<GoogleAddressComponent>,
    place_id: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLatLng,
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GoogleAddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}
