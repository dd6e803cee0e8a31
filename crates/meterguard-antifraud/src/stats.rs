use meterguard_core::models::{AnomalyType, GpsAnomaly, Severity};
use serde::Serialize;
use std::collections::HashMap;

/// Number of entries reported in [`AntifraudStats::top_anomaly_types`]
pub const TOP_TYPES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyTypeCount {
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub count: usize,
}

/// Aggregate view over every stored history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AntifraudStats {
    pub total_meters: usize,
    pub anomalies_detected: usize,
    pub critical_anomalies: usize,
    /// Anomalies per meter, as a percentage
    pub fraud_detection_rate: f64,
    pub top_anomaly_types: Vec<AnomalyTypeCount>,
}

impl AntifraudStats {
    pub fn from_histories(histories: &HashMap<String, Vec<GpsAnomaly>>) -> Self {
        let total_meters = histories.len();
        let anomalies = || histories.values().flatten();

        let anomalies_detected = anomalies().count();
        let critical_anomalies = anomalies().filter(|a| a.severity == Severity::Critical).count();
        let fraud_detection_rate = if total_meters == 0 {
            0.0
        } else {
            anomalies_detected as f64 / total_meters as f64 * 100.0
        };

        // Counted in declaration order; the stable sort keeps it for ties
        let mut top_anomaly_types: Vec<AnomalyTypeCount> = AnomalyType::ALL
            .iter()
            .map(|&anomaly_type| AnomalyTypeCount {
                anomaly_type,
                count: anomalies().filter(|a| a.anomaly_type == anomaly_type).count(),
            })
            .filter(|entry| entry.count > 0)
            .collect();
        top_anomaly_types.sort_by(|a, b| b.count.cmp(&a.count));
        top_anomaly_types.truncate(TOP_TYPES);

        Self {
            total_meters,
            anomalies_detected,
            critical_anomalies,
            fraud_detection_rate,
            top_anomaly_types,
        }
    }
}
