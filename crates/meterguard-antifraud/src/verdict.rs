use meterguard_core::config::ConfidenceBands;
use meterguard_core::models::{GpsAnomaly, MeterStatus, Severity};
use serde::Serialize;

use crate::scoring::risk_band;

/// Outcome of validating one meter report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub meter_id: String,
    pub is_valid: bool,
    pub anomalies: Vec<GpsAnomaly>,
    /// Product of the penalties of every check that fired, in [0, 1]
    pub confidence: f64,
    pub recommendations: Vec<String>,
    #[serde(skip)]
    bands: ConfidenceBands,
}

impl ValidationVerdict {
    pub fn new(
        meter_id: impl Into<String>,
        anomalies: Vec<GpsAnomaly>,
        confidence: f64,
        recommendations: Vec<String>,
        bands: ConfidenceBands,
    ) -> Self {
        let is_valid = anomalies.is_empty() || confidence > bands.verify;
        Self { meter_id: meter_id.into(), is_valid, anomalies, confidence, recommendations, bands }
    }

    /// Risk band of the confidence value
    pub fn risk_level(&self) -> Severity {
        risk_band(self.confidence, &self.bands)
    }

    /// Advisory status for the caller; the meter itself is never updated
    pub fn suggested_status(&self) -> MeterStatus {
        if self.is_valid {
            MeterStatus::Active
        } else if self.confidence < self.bands.urgent {
            MeterStatus::FraudDetected
        } else {
            MeterStatus::Suspicious
        }
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.anomalies.iter().map(|a| a.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterguard_core::models::{AnomalyType, Coordinates};

    fn anomaly(severity: Severity) -> GpsAnomaly {
        let santiago = Coordinates::new(-33.45, -70.65);
        GpsAnomaly::new("M1", AnomalyType::DeviceCloning, severity, "x", santiago)
    }

    #[test]
    fn test_clean_verdict() {
        let verdict = ValidationVerdict::new("M1", vec![], 1.0, vec![], ConfidenceBands::default());
        assert!(verdict.is_valid);
        assert_eq!(verdict.risk_level(), Severity::Low);
        assert_eq!(verdict.suggested_status(), MeterStatus::Active);
        assert_eq!(verdict.highest_severity(), None);
    }

    #[test]
    fn test_minor_anomaly_above_verify_band_stays_valid() {
        let bands = ConfidenceBands::default();
        let verdict =
            ValidationVerdict::new("M1", vec![anomaly(Severity::Low)], 0.8, vec![], bands);
        assert!(verdict.is_valid);
    }

    #[test]
    fn test_status_suggestions() {
        let bands = ConfidenceBands::default();
        let suspicious =
            ValidationVerdict::new("M1", vec![anomaly(Severity::High)], 0.4, vec![], bands);
        assert!(!suspicious.is_valid);
        assert_eq!(suspicious.risk_level(), Severity::High);
        assert_eq!(suspicious.suggested_status(), MeterStatus::Suspicious);

        let fraud = ValidationVerdict::new(
            "M1",
            vec![anomaly(Severity::High), anomaly(Severity::Critical)],
            0.12,
            vec![],
            bands,
        );
        assert_eq!(fraud.risk_level(), Severity::Critical);
        assert_eq!(fraud.suggested_status(), MeterStatus::FraudDetected);
        assert_eq!(fraud.highest_severity(), Some(Severity::Critical));
    }

    #[test]
    fn test_serializes_without_bands() {
        let verdict = ValidationVerdict::new("M1", vec![], 1.0, vec![], ConfidenceBands::default());
        let value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(value["isValid"], true);
        assert_eq!(value["meterId"], "M1");
        assert!(value.get("bands").is_none());
    }
}
