//! The individual checks of a validation pass.
//!
//! Each check looks at one aspect of a report and returns the anomalies it
//! found. Checks never see the anomalies of the pass they run in; the
//! history they read holds earlier passes only.

use chrono::{DateTime, Utc};
use meterguard_core::config::AntifraudConfig;
use meterguard_core::error::Result;
use meterguard_core::models::{
    AnomalyEvidence, AnomalyType, Coordinates, GpsAnomaly, MeterLocation, Severity,
};
use meterguard_geo::{
    bucket_key, calculate_distance, has_suspicious_digits, is_suspicious_pattern, is_within_chile,
};
use meterguard_geocode::Geocoder;
use std::collections::HashMap;

/// Minimum plausible serial number length
pub const MIN_SERIAL_LEN: usize = 8;

/// Inputs shared by every check of one pass
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub meter: &'a MeterLocation,
    /// Earlier anomalies of this meter, oldest first
    pub history: &'a [GpsAnomaly],
    pub now: DateTime<Utc>,
    pub config: &'a AntifraudConfig,
}

impl<'a> CheckContext<'a> {
    fn anomaly(
        &self,
        anomaly_type: AnomalyType,
        severity: Severity,
        description: impl Into<String>,
        coordinates: Coordinates,
    ) -> GpsAnomaly {
        GpsAnomaly::new(&self.meter.id, anomaly_type, severity, description, coordinates)
            .with_detected_at(self.now)
    }
}

/// Range, national bounds and fabricated-value checks on the reported position
pub fn basic_coordinates(ctx: &CheckContext<'_>) -> Vec<GpsAnomaly> {
    let coordinates = ctx.meter.coordinates;

    if !coordinates.is_valid() {
        return vec![ctx.anomaly(
            AnomalyType::SignalTampering,
            Severity::Critical,
            format!("Coordinates {} are outside the valid latitude/longitude range", coordinates),
            coordinates,
        )];
    }

    let mut anomalies = Vec::new();

    if !is_within_chile(&coordinates) {
        anomalies.push(ctx.anomaly(
            AnomalyType::LocationMismatch,
            Severity::High,
            format!("Coordinates {} are outside the national territory", coordinates),
            coordinates,
        ));
    }

    if coordinates.is_origin() || has_suspicious_digits(&coordinates) {
        anomalies.push(ctx.anomaly(
            AnomalyType::SignalTampering,
            Severity::Medium,
            format!("Coordinates {} look fabricated", coordinates),
            coordinates,
        ));
    }

    anomalies
}

/// Compare the reported position with the geocoded registered address
///
/// A provider outage is reported as an unverifiable address, not an error.
pub async fn address_cross_check(
    ctx: &CheckContext<'_>,
    geocoder: &Geocoder,
) -> Result<Vec<GpsAnomaly>> {
    let coordinates = ctx.meter.coordinates;
    let address = ctx.meter.address.formatted_address.trim();
    let not_found = || {
        vec![ctx.anomaly(
            AnomalyType::LocationMismatch,
            Severity::Medium,
            format!("Registered address '{}' could not be found", address),
            coordinates,
        )]
    };

    if address.is_empty() {
        return Ok(not_found());
    }

    let results = match geocoder.geocode_address(address).await {
        Ok(results) => results,
        Err(e) if e.is_provider_failure() => {
            tracing::warn!(
                meter_id = %ctx.meter.id,
                error = %e,
                "Address verification unavailable"
            );
            return Ok(vec![ctx.anomaly(
                AnomalyType::LocationMismatch,
                Severity::Medium,
                format!("Registered address '{}' could not be verified", address),
                coordinates,
            )]);
        }
        Err(e) => return Err(e),
    };

    let Some(best) = results.first() else {
        return Ok(not_found());
    };

    let max_allowed = ctx.config.max_allowed_distance;
    let distance = calculate_distance(&coordinates, &best.coordinates);
    if distance <= max_allowed {
        return Ok(Vec::new());
    }

    let evidence = AnomalyEvidence {
        street_view_url: non_empty(geocoder.street_view_url(&coordinates)),
        satellite_image_url: non_empty(geocoder.satellite_image_url(&coordinates)),
        ..Default::default()
    };

    Ok(vec![ctx
        .anomaly(
            AnomalyType::LocationMismatch,
            crate::scoring::distance_severity(distance, max_allowed),
            format!(
                "Reported position is {:.0} m from the registered address (limit {:.0} m)",
                distance, max_allowed
            ),
            coordinates,
        )
        .with_expected(best.coordinates, distance)
        .with_evidence(evidence)])
}

/// Flag travel from the last known position faster than the threshold allows
///
/// Speed is `distance / (hours * 1000)`; the threshold is expressed in the
/// same unit.
pub fn impossible_movement(ctx: &CheckContext<'_>) -> Vec<GpsAnomaly> {
    let lookback = ctx.config.movement_lookback.max(1);
    let Some(prior) = ctx.history.iter().rev().take(lookback).max_by_key(|a| a.detected_at) else {
        return Vec::new();
    };

    let elapsed_ms = (ctx.now - prior.detected_at).num_milliseconds();
    if elapsed_ms <= 0 {
        return Vec::new();
    }

    let hours = elapsed_ms as f64 / 3_600_000.0;
    let current = ctx.meter.coordinates;
    let distance = calculate_distance(&prior.coordinates, &current);
    let speed = distance / (hours * 1000.0);
    let threshold = ctx.config.movement_threshold;

    if speed <= threshold {
        return Vec::new();
    }

    let evidence = AnomalyEvidence {
        movement_pattern: Some(vec![prior.coordinates, current]),
        ..Default::default()
    };

    vec![ctx
        .anomaly(
            AnomalyType::ImpossibleMovement,
            crate::scoring::speed_severity(speed, threshold),
            format!(
                "Moved {:.0} m in {:.1} min (speed {:.2}, limit {:.2})",
                distance,
                hours * 60.0,
                speed,
                threshold
            ),
            current,
        )
        .with_expected(prior.coordinates, distance)
        .with_evidence(evidence)]
}

/// Bursts of recent anomalies and positions that keep repeating
pub fn historical_pattern(ctx: &CheckContext<'_>) -> Vec<GpsAnomaly> {
    let config = ctx.config;
    let coordinates = ctx.meter.coordinates;
    let mut anomalies = Vec::new();

    let window_start = ctx.now - config.pattern_window;
    let recent = ctx.history.iter().filter(|a| a.detected_at > window_start).count();
    if recent >= config.pattern_anomaly_count {
        anomalies.push(ctx.anomaly(
            AnomalyType::SignalTampering,
            Severity::High,
            format!(
                "Pattern anomaly: {} anomalies in the last {} h",
                recent,
                config.pattern_window.num_hours()
            ),
            coordinates,
        ));
    }

    // Buckets in first-seen order so output is deterministic
    let mut order: Vec<(String, Coordinates)> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for anomaly in ctx.history {
        let key = bucket_key(&anomaly.coordinates);
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            order.push((key, anomaly.coordinates));
        }
        *count += 1;
    }

    for (key, bucket) in order {
        let count = counts.get(&key).copied().unwrap_or(0);
        if count > config.repetitive_location_count {
            anomalies.push(ctx.anomaly(
                AnomalyType::SignalTampering,
                Severity::Medium,
                format!("Repetitive location: {} reported {} times", bucket.rounded(6), count),
                bucket.rounded(6),
            ));
        }
    }

    anomalies
}

/// Serial numbers that are missing, too short or obviously made up
pub fn device_identity(ctx: &CheckContext<'_>) -> Vec<GpsAnomaly> {
    let serial = ctx.meter.device_info.serial_number.trim();

    let reason = if serial.is_empty() {
        "missing".to_string()
    } else if serial.chars().count() < MIN_SERIAL_LEN {
        format!("shorter than {} characters", MIN_SERIAL_LEN)
    } else if is_suspicious_pattern(serial) {
        "a repeating or sequential pattern".to_string()
    } else {
        return Vec::new();
    };

    vec![ctx.anomaly(
        AnomalyType::DeviceCloning,
        Severity::High,
        format!("Device serial number '{}' is {}", serial, reason),
        ctx.meter.coordinates,
    )]
}

fn non_empty(url: String) -> Option<String> {
    (!url.is_empty()).then_some(url)
}
