//! Advice attached to a verdict.

use meterguard_core::config::ConfidenceBands;
use meterguard_core::models::{AnomalyType, GpsAnomaly};

/// Follow-up actions for a confidence value and its anomalies
///
/// Band advice comes first, then one line per distinct anomaly type in the
/// order the types were first seen. No line appears twice.
pub fn recommend(
    confidence: f64,
    anomalies: &[GpsAnomaly],
    bands: &ConfidenceBands,
) -> Vec<String> {
    let mut lines: Vec<&'static str> = Vec::new();

    if confidence < bands.urgent {
        lines.push("Schedule an urgent field inspection");
        lines.push("Consider suspending service until the meter is verified");
    } else if confidence < bands.inspect {
        lines.push("Schedule a field inspection within 24-48 hours");
        lines.push("Increase monitoring frequency for this meter");
    } else if confidence < bands.verify {
        lines.push("Verify the meter location at the next scheduled maintenance");
    }

    for anomaly in anomalies {
        lines.push(type_advice(anomaly.anomaly_type));
    }

    let mut recommendations: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if !recommendations.iter().any(|r| r == line) {
            recommendations.push(line.to_string());
        }
    }
    recommendations
}

fn type_advice(anomaly_type: AnomalyType) -> &'static str {
    match anomaly_type {
        AnomalyType::LocationMismatch => {
            "Confirm the registered address against the installation site"
        }
        AnomalyType::ImpossibleMovement => {
            "Check the device for GPS spoofing or unauthorized relocation"
        }
        AnomalyType::SignalTampering => "Inspect the GPS module and antenna for tampering",
        AnomalyType::DeviceCloning => {
            "Verify the device serial number against the installation record"
        }
    }
}
