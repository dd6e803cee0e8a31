//! Scoring policy: which check costs how much confidence, and how measured
//! values map to severities.

use meterguard_core::config::{ConfidenceBands, PenaltyTable};
use meterguard_core::models::Severity;
use serde::Serialize;
use std::fmt;

/// The checks run on every report, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    BasicCoordinates,
    AddressCrossCheck,
    ImpossibleMovement,
    HistoricalPattern,
    DeviceIdentity,
}

impl CheckKind {
    pub const PIPELINE: [CheckKind; 5] = [
        CheckKind::BasicCoordinates,
        CheckKind::AddressCrossCheck,
        CheckKind::ImpossibleMovement,
        CheckKind::HistoricalPattern,
        CheckKind::DeviceIdentity,
    ];

    /// Confidence multiplier applied once when this check reports anomalies
    pub fn penalty(&self, table: &PenaltyTable) -> f64 {
        match self {
            CheckKind::BasicCoordinates => table.basic_coordinates,
            CheckKind::AddressCrossCheck => table.address_cross_check,
            CheckKind::ImpossibleMovement => table.impossible_movement,
            CheckKind::HistoricalPattern => table.historical_pattern,
            CheckKind::DeviceIdentity => table.device_identity,
        }
    }

    /// Checks that depend on the meter's stored history
    pub fn reads_history(&self) -> bool {
        matches!(self, CheckKind::ImpossibleMovement | CheckKind::HistoricalPattern)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::BasicCoordinates => "basic_coordinates",
            CheckKind::AddressCrossCheck => "address_cross_check",
            CheckKind::ImpossibleMovement => "impossible_movement",
            CheckKind::HistoricalPattern => "historical_pattern",
            CheckKind::DeviceIdentity => "device_identity",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a reported-vs-registered distance that already exceeds `max_allowed`
pub fn distance_severity(distance: f64, max_allowed: f64) -> Severity {
    if distance > 2.0 * max_allowed {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Severity of a speed that already exceeds `threshold`
pub fn speed_severity(speed: f64, threshold: f64) -> Severity {
    if speed > 2.0 * threshold {
        Severity::Critical
    } else {
        Severity::High
    }
}

/// Map a confidence value onto a risk band
pub fn risk_band(confidence: f64, bands: &ConfidenceBands) -> Severity {
    if confidence < bands.urgent {
        Severity::Critical
    } else if confidence < bands.inspect {
        Severity::High
    } else if confidence < bands.verify {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Running confidence for one validation pass
#[derive(Debug, Clone, Copy)]
pub struct Confidence {
    value: f64,
}

impl Default for Confidence {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

impl Confidence {
    pub fn apply(&mut self, factor: f64) {
        self.value = (self.value * factor).clamp(0.0, 1.0);
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
