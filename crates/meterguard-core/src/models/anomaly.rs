use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Coordinates;

/// Kind of irregularity a check detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    LocationMismatch,
    ImpossibleMovement,
    SignalTampering,
    DeviceCloning,
}

impl AnomalyType {
    /// All variants in declaration order
    pub const ALL: [AnomalyType; 4] = [
        AnomalyType::LocationMismatch,
        AnomalyType::ImpossibleMovement,
        AnomalyType::SignalTampering,
        AnomalyType::DeviceCloning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::LocationMismatch => "location_mismatch",
            AnomalyType::ImpossibleMovement => "impossible_movement",
            AnomalyType::SignalTampering => "signal_tampering",
            AnomalyType::DeviceCloning => "device_cloning",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an anomaly, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Investigation state, managed by callers once the anomaly exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    #[default]
    Pending,
    Investigating,
    Resolved,
    FalsePositive,
}

/// Supporting material attached to an anomaly
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEvidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_view_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satellite_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_pattern: Option<Vec<Coordinates>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<f64>,
}

impl AnomalyEvidence {
    pub fn is_empty(&self) -> bool {
        self.street_view_url.is_none()
            && self.satellite_image_url.is_none()
            && self.movement_pattern.is_none()
            && self.signal_strength.is_none()
    }
}

/// One detected GPS irregularity for one meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsAnomaly {
    pub id: Uuid,
    pub meter_id: String,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
    pub description: String,
    /// Position observed when the anomaly was raised
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_coordinates: Option<Coordinates>,
    /// Meters between observed and expected positions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "AnomalyEvidence::is_empty")]
    pub evidence: AnomalyEvidence,
    #[serde(default)]
    pub status: AnomalyStatus,
}

impl GpsAnomaly {
    /// Create a pending anomaly detected now
    pub fn new(
        meter_id: impl Into<String>,
        anomaly_type: AnomalyType,
        severity: Severity,
        description: impl Into<String>,
        coordinates: Coordinates,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            meter_id: meter_id.into(),
            anomaly_type,
            severity,
            detected_at: Utc::now(),
            description: description.into(),
            coordinates,
            expected_coordinates: None,
            distance: None,
            evidence: AnomalyEvidence::default(),
            status: AnomalyStatus::Pending,
        }
    }

    /// Attach the expected position and the distance to it
    pub fn with_expected(mut self, expected: Coordinates, distance: f64) -> Self {
        self.expected_coordinates = Some(expected);
        self.distance = Some(distance);
        self
    }

    pub fn with_evidence(mut self, evidence: AnomalyEvidence) -> Self {
        self.evidence = evidence;
        self
    }

    /// Override the detection timestamp
    pub fn with_detected_at(mut self, detected_at: DateTime<Utc>) -> Self {
        self.detected_at = detected_at;
        self
    }
}
