//! Evidence links attached to location anomalies.

use meterguard_core::models::Coordinates;

const STREET_VIEW_ENDPOINT: &str = "/maps/api/streetview";
const STATIC_MAP_ENDPOINT: &str = "/maps/api/staticmap";

/// Builds Street View and satellite image URLs for a location
///
/// Without an API key every builder returns an empty string.
#[derive(Debug, Clone, Default)]
pub struct EvidenceLinks {
    api_key: Option<String>,
    base_url: String,
}

impl EvidenceLinks {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn street_view_url(&self, coordinates: &Coordinates) -> String {
        let Some(key) = &self.api_key else {
            return String::new();
        };
        format!(
            "{}{}?size=600x400&location={},{}&heading=0&pitch=0&key={}",
            self.base_url, STREET_VIEW_ENDPOINT, coordinates.lat, coordinates.lng, key
        )
    }

    pub fn satellite_image_url(&self, coordinates: &Coordinates) -> String {
        let Some(key) = &self.api_key else {
            return String::new();
        };
        format!(
            "{base}{endpoint}?center={lat},{lng}&zoom=18&size=600x400&maptype=satellite&markers=color:red%7C{lat},{lng}&key={key}",
            base = self.base_url,
            endpoint = STATIC_MAP_ENDPOINT,
            lat = coordinates.lat,
            lng = coordinates.lng,
            key = key
        )
    }
}
