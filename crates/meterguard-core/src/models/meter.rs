use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, Coordinates};

/// Operational status of a meter, owned by upstream callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeterStatus {
    #[default]
    Active,
    Inactive,
    Suspicious,
    FraudDetected,
}

/// Hardware identity reported by the meter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub serial_number: String,
    pub model: String,
    pub manufacturer: String,
}

/// A meter report submitted for validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterLocation {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    /// Position reported by the device's GPS
    pub coordinates: Coordinates,
    /// Address the meter is registered at
    pub address: Address,
    pub installation_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reading: Option<DateTime<Utc>>,
    pub device_info: DeviceInfo,
    #[serde(default)]
    pub status: MeterStatus,
}
