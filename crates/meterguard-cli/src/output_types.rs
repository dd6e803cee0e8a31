use meterguard_antifraud::ValidationVerdict;
use meterguard_core::config::ConfigSource;
use meterguard_core::models::{
    Coordinates, GeocodingResult, GpsAnomaly, MeterStatus, ReverseGeocodingResult, Severity,
};
use serde::Serialize;
use tabled::Tabled;

/// Output for geocode command
#[derive(Debug, Serialize)]
pub struct GeocodeOutput {
    pub query: String,
    pub results: Vec<GeocodingResult>,
}

/// Output for reverse command
#[derive(Debug, Serialize)]
pub struct ReverseOutput {
    pub coordinates: Coordinates,
    pub results: Vec<ReverseGeocodingResult>,
}

/// Output for distance command
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceOutput {
    pub from: Coordinates,
    pub to: Coordinates,
    pub meters: f64,
    pub from_within_chile: bool,
    pub to_within_chile: bool,
}

/// Output for validate command, one entry per report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOutput {
    #[serde(flatten)]
    pub verdict: ValidationVerdict,
    pub risk_level: Severity,
    pub suggested_status: MeterStatus,
}

impl From<ValidationVerdict> for ValidateOutput {
    fn from(verdict: ValidationVerdict) -> Self {
        Self {
            risk_level: verdict.risk_level(),
            suggested_status: verdict.suggested_status(),
            verdict,
        }
    }
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: ConfigSource,
}

#[derive(Tabled)]
pub struct GeocodeRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Address")]
    pub address: String,
    #[tabled(rename = "Lat")]
    pub lat: f64,
    #[tabled(rename = "Lng")]
    pub lng: f64,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl GeocodeRow {
    pub fn from_forward(rank: usize, result: &GeocodingResult) -> Self {
        Self {
            rank,
            address: result.address.formatted_address.clone(),
            lat: result.coordinates.lat,
            lng: result.coordinates.lng,
            detail: format!("{:?}", result.accuracy),
        }
    }

    pub fn from_reverse(rank: usize, result: &ReverseGeocodingResult) -> Self {
        Self {
            rank,
            address: result.address.formatted_address.clone(),
            lat: result.coordinates.lat,
            lng: result.coordinates.lng,
            detail: result.types.join(", "),
        }
    }
}

#[derive(Tabled)]
pub struct AnomalyRow {
    #[tabled(rename = "Type")]
    pub anomaly_type: String,
    #[tabled(rename = "Severity")]
    pub severity: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&GpsAnomaly> for AnomalyRow {
    fn from(anomaly: &GpsAnomaly) -> Self {
        Self {
            anomaly_type: anomaly.anomaly_type.to_string(),
            severity: anomaly.severity.to_string(),
            description: anomaly.description.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Setting")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

impl From<&ConfigEntry> for ConfigRow {
    fn from(entry: &ConfigEntry) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.clone(),
            source: format!("{:?}", entry.source),
        }
    }
}
