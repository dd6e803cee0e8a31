use async_trait::async_trait;
use meterguard_core::config::GeocodingConfig;
use meterguard_core::error::{MeterguardError, Result};
use meterguard_core::models::{
    Accuracy, Address, Coordinates, GeocodingResult, ReverseGeocodingResult,
};
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::ports::GeocodeProvider;

const PROVIDER: &str = "nominatim";

/// OpenStreetMap Nominatim adapter
///
/// The public instance's usage policy requires a descriptive User-Agent on
/// every request; requests without one are rejected.
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    /// Comma-separated ISO 3166-1 alpha-2 codes restricting forward search
    country_codes: String,
    language: String,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        country_codes: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            country_codes: country_codes.into(),
            language: language.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &GeocodingConfig) -> Self {
        Self::new(
            &config.nominatim_base_url,
            &config.nominatim_user_agent,
            &config.country,
            &config.language,
        )
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header(USER_AGENT, &self.user_agent)
            .query(params)
            .query(&[
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("accept-language", self.language.as_str()),
            ])
            .send()
            .await
            .map_err(|e| provider_error(format!("Failed to connect: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(provider_error(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| provider_error(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GeocodeProvider for NominatimGeocoder {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn forward(&self, address: &str) -> Result<Vec<GeocodingResult>> {
        let mut params = vec![("q", address), ("limit", "5")];
        if !self.country_codes.is_empty() {
            params.push(("countrycodes", self.country_codes.as_str()));
        }

        let body = self.get_json("/search", &params).await?;
        let places: Vec<NominatimPlace> = serde_json::from_value(body)
            .map_err(|e| provider_error(format!("Unexpected search response: {}", e)))?;

        places.into_iter().map(to_geocoding_result).collect()
    }

    async fn reverse(&self, coordinates: &Coordinates) -> Result<Vec<ReverseGeocodingResult>> {
        let lat = coordinates.lat.to_string();
        let lon = coordinates.lng.to_string();
        let query = [("lat", lat.as_str()), ("lon", lon.as_str())];
        let body = self.get_json("/reverse", &query).await?;

        // Nothing at this location: {"error": "Unable to geocode"}
        if body.get("error").is_some() {
            return Ok(Vec::new());
        }

        let place: NominatimPlace = serde_json::from_value(body)
            .map_err(|e| provider_error(format!("Unexpected reverse response: {}", e)))?;

        Ok(vec![to_reverse_result(place)?])
    }
}

fn provider_error(reason: String) -> MeterguardError {
    MeterguardError::Provider { provider: PROVIDER.to_string(), reason }
}

fn parse_coordinates(place: &NominatimPlace) -> Result<Coordinates> {
    let lat = place.lat.parse::<f64>();
    let lng = place.lon.parse::<f64>();
    match (lat, lng) {
        (Ok(lat), Ok(lng)) => Ok(Coordinates::new(lat, lng)),
        _ => Err(provider_error(format!("Invalid coordinates '{}', '{}'", place.lat, place.lon))),
    }
}

/// Nominatim has no location type, so derive one from address granularity
fn infer_accuracy(address: &NominatimAddress) -> Accuracy {
    if address.house_number.is_some() {
        Accuracy::Rooftop
    } else if address.road.is_some() {
        Accuracy::RangeInterpolated
    } else if address.city().is_some() {
        Accuracy::GeometricCenter
    } else {
        Accuracy::Approximate
    }
}

fn to_address(place: &NominatimPlace) -> Address {
    let details = &place.address;
    Address {
        street: details.road.clone().unwrap_or_default(),
        number: details.house_number.clone(),
        city: details.city().unwrap_or_default(),
        state: details.state.clone().or_else(|| details.region.clone()).unwrap_or_default(),
        country: details.country.clone().unwrap_or_default(),
        postal_code: details.postcode.clone(),
        formatted_address: place.display_name.clone(),
    }
}

fn place_types(place: &NominatimPlace) -> Vec<String> {
    [&place.category, &place.place_type, &place.addresstype]
        .into_iter()
        .flatten()
        .fold(Vec::new(), |mut types, t| {
            if !types.contains(t) {
                types.push(t.clone());
            }
            types
        })
}

fn to_geocoding_result(place: NominatimPlace) -> Result<GeocodingResult> {
    Ok(GeocodingResult {
        coordinates: parse_coordinates(&place)?,
        address: to_address(&place),
        accuracy: infer_accuracy(&place.address),
        place_id: place.place_id.map(|id| id.to_string()),
        types: place_types(&place),
    })
}

fn to_reverse_result(place: NominatimPlace) -> Result<ReverseGeocodingResult> {
    Ok(ReverseGeocodingResult {
        coordinates: parse_coordinates(&place)?,
        address: to_address(&place),
        place_id: place.place_id.map(|id| id.to_string()),
        types: place_types(&place),
    })
}

/// One place in a `jsonv2` response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    place_id: Option<u64>,
    lat: String,
    lon: String,
    display_name: String,
    #[serde(alias = "class")]
    category: Option<String>,
    #[serde(rename = "type")]
    place_type: Option<String>,
    addresstype: Option<String>,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    house_number: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    region: Option<String>,
    country: Option<String>,
    postcode: Option<String>,
}

impl NominatimAddress {
    fn city(&self) -> Option<String> {
        self.city
            .clone()
            .or_else(|| self.town.clone())
            .or_else(|| self.village.clone())
            .or_else(|| self.municipality.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn providencia_place() -> serde_json::Value {
        json!({
            "place_id": 123456,
            "lat": "-33.4262",
            "lon": "-70.6195",
            "display_name": "1234, Avenida Providencia, Providencia, Santiago, Región Metropolitana, 7500000, Chile",
            "category": "place",
            "type": "house",
            "addresstype": "place",
            "address": {
                "house_number": "1234",
                "road": "Avenida Providencia",
                "city": "Providencia",
                "state": "Región Metropolitana de Santiago",
                "postcode": "7500000",
                "country": "Chile"
            }
        })
    }

    #[tokio::test]
    async fn test_forward_sends_user_agent_and_parses() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/search")
                    .header("user-agent", "meter-audit/1.0 (ops@utility.example)")
                    .query_param("q", "Av. Providencia 1234, Santiago")
                    .query_param("countrycodes", "cl")
                    .query_param("format", "jsonv2");
                then.status(200).json_body(json!([providencia_place()]));
            })
            .await;

        let geocoder = NominatimGeocoder::new(
            server.base_url(),
            "meter-audit/1.0 (ops@utility.example)",
            "cl",
            "es",
        );
        let results = geocoder.forward("Av. Providencia 1234, Santiago").await.unwrap();

        mock.assert_async().await;
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.coordinates, Coordinates::new(-33.4262, -70.6195));
        assert_eq!(result.accuracy, Accuracy::Rooftop);
        assert_eq!(result.address.number.as_deref(), Some("1234"));
        assert_eq!(result.address.city, "Providencia");
        assert_eq!(result.place_id.as_deref(), Some("123456"));
        assert_eq!(result.types, vec!["place".to_string(), "house".to_string()]);
    }

    #[tokio::test]
    async fn test_forward_empty_array() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(200).json_body(json!([]));
            })
            .await;

        let geocoder = NominatimGeocoder::new(server.base_url(), "test-agent", "cl", "es");
        assert!(geocoder.forward("Calle Inexistente 99999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reverse_unable_to_geocode_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reverse").query_param("lat", "-60.5");
                then.status(200).json_body(json!({"error": "Unable to geocode"}));
            })
            .await;

        let geocoder = NominatimGeocoder::new(server.base_url(), "test-agent", "cl", "es");
        let results = geocoder.reverse(&Coordinates::new(-60.5, -70.0)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_reverse_parses_place() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/reverse").query_param("lon", "-70.6195");
                then.status(200).json_body(providencia_place());
            })
            .await;

        let geocoder = NominatimGeocoder::new(server.base_url(), "test-agent", "cl", "es");
        let results = geocoder.reverse(&Coordinates::new(-33.4262, -70.6195)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].address.street, "Avenida Providencia");
        assert_eq!(results[0].address.state, "Región Metropolitana de Santiago");
    }

    #[tokio::test]
    async fn test_rate_limited_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search");
                then.status(429).body("Too Many Requests");
            })
            .await;

        let geocoder = NominatimGeocoder::new(server.base_url(), "test-agent", "cl", "es");
        let err = geocoder.forward("Av. Providencia 1234").await.unwrap_err();
        assert!(err.is_provider_failure());
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_infer_accuracy_levels() {
        let mut address = NominatimAddress::default();
        assert_eq!(infer_accuracy(&address), Accuracy::Approximate);
        address.town = Some("Pucón".to_string());
        assert_eq!(infer_accuracy(&address), Accuracy::GeometricCenter);
        address.road = Some("Camino Internacional".to_string());
        assert_eq!(infer_accuracy(&address), Accuracy::RangeInterpolated);
        address.house_number = Some("55".to_string());
        assert_eq!(infer_accuracy(&address), Accuracy::Rooftop);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let place: NominatimPlace = serde_json::from_value(json!({
            "lat": "not-a-number",
            "lon": "-70.0",
            "display_name": "Somewhere"
        }))
        .unwrap();
        assert!(to_geocoding_result(place).is_err());
    }
}
