use chrono::{Duration, Utc};
use meterguard_antifraud::{FraudEvaluator, HistoryStore, MemoryHistoryStore};
use meterguard_core::config::AntifraudConfig;
use meterguard_core::models::{
    Accuracy, Address, AnomalyType, Coordinates, DeviceInfo, GeocodingResult, GpsAnomaly,
    MeterLocation, MeterStatus, Severity,
};
use meterguard_geocode::{EvidenceLinks, GeocodeCache, GeocodeProvider, Geocoder, MemoryProvider};
use std::sync::Arc;

const ADDRESS: &str = "Av. Providencia 1234, Santiago";

fn meter(id: &str, coordinates: Coordinates, serial: &str) -> MeterLocation {
    MeterLocation {
        id: id.to_string(),
        customer_id: "C-100".to_string(),
        customer_name: "Comercial Andes".to_string(),
        coordinates,
        address: Address::formatted(ADDRESS),
        installation_date: Utc::now() - Duration::days(400),
        last_reading: None,
        device_info: DeviceInfo {
            serial_number: serial.to_string(),
            model: "GX-200".to_string(),
            manufacturer: "Acme".to_string(),
        },
        status: MeterStatus::Active,
    }
}

fn geocoded(coordinates: Coordinates) -> GeocodingResult {
    GeocodingResult {
        coordinates,
        address: Address::formatted(ADDRESS),
        accuracy: Accuracy::Rooftop,
        place_id: None,
        types: vec!["street_address".to_string()],
    }
}

fn geocoder_at(coordinates: Coordinates) -> Arc<Geocoder> {
    let provider = MemoryProvider::new("memory").with_forward(ADDRESS, vec![geocoded(coordinates)]);
    geocoder_with(vec![Arc::new(provider)])
}

fn geocoder_with(providers: Vec<Arc<dyn GeocodeProvider>>) -> Arc<Geocoder> {
    Arc::new(Geocoder::new(
        providers,
        GeocodeCache::new(std::time::Duration::from_secs(3600)),
        std::time::Duration::from_secs(2),
    ))
}

/// An anomaly recorded at `coordinates` some time ago
fn earlier(coordinates: Coordinates, age: Duration) -> GpsAnomaly {
    GpsAnomaly::new("M1", AnomalyType::LocationMismatch, Severity::Medium, "earlier", coordinates)
        .with_detected_at(Utc::now() - age)
}

fn setup(
    geocoder: Arc<Geocoder>,
    config: AntifraudConfig,
) -> (FraudEvaluator, Arc<MemoryHistoryStore>) {
    let store = Arc::new(MemoryHistoryStore::new());
    (FraudEvaluator::new(geocoder, store.clone(), config), store)
}

#[tokio::test]
async fn test_clean_report_is_valid() {
    let here = Coordinates::new(-33.4263, -70.6196);
    let (evaluator, store) = setup(geocoder_at(here), AntifraudConfig::default());

    let verdict = evaluator.validate_meter_location(&meter("M1", here, "EAC0019F3Z")).await;

    assert!(verdict.is_valid);
    assert!(verdict.anomalies.is_empty());
    assert_eq!(verdict.confidence, 1.0);
    assert!(verdict.recommendations.is_empty());
    assert_eq!(store.meter_count(), 0);
}

#[tokio::test]
async fn test_impossible_movement_after_twelve_minutes() {
    let prior = Coordinates::new(-33.45, -70.65);
    let current = Coordinates::new(-33.4455, -70.65);
    let config = AntifraudConfig { movement_threshold: 2.0, ..Default::default() };
    let (evaluator, store) = setup(geocoder_at(current), config);

    store
        .append(
            "M1",
            vec![earlier(prior, Duration::minutes(12))],
            100,
        )
        .await
        .unwrap();

    let verdict = evaluator.validate_meter_location(&meter("M1", current, "EAC0019F3Z")).await;

    assert_eq!(verdict.anomalies.len(), 1);
    let anomaly = &verdict.anomalies[0];
    assert_eq!(anomaly.anomaly_type, AnomalyType::ImpossibleMovement);
    assert_eq!(anomaly.severity, Severity::High);
    let distance = anomaly.distance.unwrap();
    assert!((distance - 500.0).abs() < 25.0, "distance {distance}");
    assert_eq!(anomaly.expected_coordinates, Some(prior));
    assert_eq!(anomaly.evidence.movement_pattern, Some(vec![prior, current]));
    assert_eq!(verdict.confidence, 0.5);

    // Same pair with a threshold below half the speed escalates
    let strict = AntifraudConfig { movement_threshold: 1.0, ..Default::default() };
    let (evaluator, store) = setup(geocoder_at(current), strict);
    store
        .append(
            "M1",
            vec![earlier(prior, Duration::minutes(12))],
            100,
        )
        .await
        .unwrap();
    let verdict = evaluator.validate_meter_location(&meter("M1", current, "EAC0019F3Z")).await;
    assert_eq!(verdict.anomalies[0].severity, Severity::Critical);
}

#[tokio::test]
async fn test_default_threshold_tolerates_short_hop() {
    let prior = Coordinates::new(-33.45, -70.65);
    let current = Coordinates::new(-33.4455, -70.65);
    let (evaluator, store) = setup(geocoder_at(current), AntifraudConfig::default());
    store
        .append(
            "M1",
            vec![earlier(prior, Duration::minutes(12))],
            100,
        )
        .await
        .unwrap();

    let verdict = evaluator.validate_meter_location(&meter("M1", current, "EAC0019F3Z")).await;
    assert!(verdict.anomalies.is_empty());
}

#[tokio::test]
async fn test_suspicious_serials() {
    let here = Coordinates::new(-33.4263, -70.6196);
    let (evaluator, _) = setup(geocoder_at(here), AntifraudConfig::default());

    for serial in ["11111111", "12345678"] {
        let verdict = evaluator.validate_meter_location(&meter(serial, here, serial)).await;
        let types: Vec<_> = verdict.anomalies.iter().map(|a| a.anomaly_type).collect();
        assert_eq!(types, vec![AnomalyType::DeviceCloning], "serial {serial}");
        assert_eq!(verdict.confidence, 0.4);
        assert!(!verdict.is_valid);
    }

    let verdict = evaluator.validate_meter_location(&meter("ok", here, "EAC0019F3Z")).await;
    assert!(verdict.anomalies.iter().all(|a| a.anomaly_type != AnomalyType::DeviceCloning));
}

#[tokio::test]
async fn test_distant_address_is_location_mismatch_with_evidence() {
    let registered = Coordinates::new(-33.4263, -70.6196);
    let reported = Coordinates::new(-33.4363, -70.6196);
    let provider = MemoryProvider::new("memory").with_forward(ADDRESS, vec![geocoded(registered)]);
    let geocoder = Geocoder::new(
        vec![Arc::new(provider)],
        GeocodeCache::new(std::time::Duration::from_secs(60)),
        std::time::Duration::from_secs(2),
    )
    .with_evidence(EvidenceLinks::new(Some("key".to_string()), "https://maps.googleapis.com"));
    let (evaluator, _) = setup(Arc::new(geocoder), AntifraudConfig::default());

    let verdict = evaluator.validate_meter_location(&meter("M1", reported, "EAC0019F3Z")).await;

    assert_eq!(verdict.anomalies.len(), 1);
    let anomaly = &verdict.anomalies[0];
    assert_eq!(anomaly.anomaly_type, AnomalyType::LocationMismatch);
    // ~1112 m against a 500 m limit
    assert_eq!(anomaly.severity, Severity::High);
    assert_eq!(anomaly.expected_coordinates, Some(registered));
    assert!(anomaly.evidence.street_view_url.is_some());
    assert!(anomaly.evidence.satellite_image_url.is_some());
    assert_eq!(verdict.confidence, 0.7);
    assert!(!verdict.is_valid);
}

#[tokio::test]
async fn test_provider_outage_flags_unverified_address() {
    let provider = Arc::new(MemoryProvider::new("down"));
    provider.set_failing(true);
    let (evaluator, _) = setup(geocoder_with(vec![provider]), AntifraudConfig::default());

    let verdict = evaluator
        .validate_meter_location(&meter("M1", Coordinates::new(-33.4263, -70.6196), "EAC0019F3Z"))
        .await;

    assert_eq!(verdict.anomalies.len(), 1);
    assert_eq!(verdict.anomalies[0].anomaly_type, AnomalyType::LocationMismatch);
    assert_eq!(verdict.anomalies[0].severity, Severity::Medium);
    assert!(verdict.anomalies[0].description.contains("could not be verified"));
}

#[tokio::test]
async fn test_unknown_address_flagged() {
    let empty = geocoder_with(vec![Arc::new(MemoryProvider::new("empty"))]);
    let (evaluator, _) = setup(empty, AntifraudConfig::default());

    let verdict = evaluator
        .validate_meter_location(&meter("M1", Coordinates::new(-33.4263, -70.6196), "EAC0019F3Z"))
        .await;

    assert_eq!(verdict.anomalies.len(), 1);
    assert!(verdict.anomalies[0].description.contains("could not be found"));
}

#[tokio::test]
async fn test_more_failing_checks_never_raise_confidence() {
    let here = Coordinates::new(-33.4263, -70.6196);
    let (evaluator, _) = setup(geocoder_at(here), AntifraudConfig::default());

    let clean = evaluator.validate_meter_location(&meter("A", here, "EAC0019F3Z")).await;
    let bad_serial = evaluator.validate_meter_location(&meter("B", here, "123")).await;
    let abroad = Coordinates::new(-12.05, -77.04);
    let bad_serial_abroad = evaluator.validate_meter_location(&meter("C", abroad, "123")).await;

    assert!(clean.confidence >= bad_serial.confidence);
    assert!(bad_serial.confidence >= bad_serial_abroad.confidence);
    assert!(bad_serial_abroad.confidence > 0.0);
    assert_eq!(bad_serial_abroad.risk_level(), Severity::Critical);
    assert_eq!(bad_serial_abroad.suggested_status(), MeterStatus::FraudDetected);
}

#[tokio::test]
async fn test_history_keeps_newest_hundred() {
    let here = Coordinates::new(-33.4263, -70.6196);
    let config = AntifraudConfig {
        pattern_anomaly_count: usize::MAX,
        repetitive_location_count: usize::MAX,
        ..Default::default()
    };
    let (evaluator, _) = setup(geocoder_at(here), config);
    let report = meter("M1", here, "SHORT");

    let mut ids = Vec::new();
    for _ in 0..150 {
        let verdict = evaluator.validate_meter_location(&report).await;
        assert_eq!(verdict.anomalies.len(), 1);
        ids.push(verdict.anomalies[0].id);
    }

    let history = evaluator.meter_history("M1").await.unwrap();
    let kept: Vec<_> = history.iter().map(|a| a.id).collect();
    assert_eq!(kept.len(), 100);
    assert_eq!(kept, ids[50..].to_vec());
}

#[tokio::test]
async fn test_repeated_reports_become_a_pattern() {
    let here = Coordinates::new(-33.4263, -70.6196);
    let (evaluator, _) = setup(geocoder_at(here), AntifraudConfig::default());
    let report = meter("M1", here, "SHORT");

    // Passes 1-3 each add one device anomaly; pass 4 sees three recent ones
    for _ in 0..3 {
        evaluator.validate_meter_location(&report).await;
    }
    let verdict = evaluator.validate_meter_location(&report).await;

    assert!(verdict
        .anomalies
        .iter()
        .any(|a| a.anomaly_type == AnomalyType::SignalTampering && a.severity == Severity::High));
}

#[tokio::test]
async fn test_cleanup_removes_old_entries_and_empty_meters() {
    let here = Coordinates::new(-33.4263, -70.6196);
    let (evaluator, store) = setup(geocoder_at(here), AntifraudConfig::default());

    let old = |id: &str, days: i64| {
        GpsAnomaly::new(id, AnomalyType::DeviceCloning, Severity::High, "old", here)
            .with_detected_at(Utc::now() - Duration::days(days))
    };
    store.append("stale", vec![old("stale", 45), old("stale", 31)], 100).await.unwrap();
    store.append("mixed", vec![old("mixed", 60), old("mixed", 2)], 100).await.unwrap();

    let removed = evaluator.clean_old_history(30).await.unwrap();

    assert_eq!(removed, 3);
    let all = store.all().await.unwrap();
    assert!(!all.contains_key("stale"));
    let cutoff = Utc::now() - Duration::days(30);
    assert!(all.values().flatten().all(|a| a.detected_at >= cutoff));
    assert_eq!(store.meter_count(), 1);
}

#[tokio::test]
async fn test_stats_and_batch() {
    let here = Coordinates::new(-33.4263, -70.6196);
    let (evaluator, _) = setup(geocoder_at(here), AntifraudConfig::default());

    let meters = vec![
        meter("A", here, "EAC0019F3Z"),
        meter("B", here, "11111111"),
        meter("C", Coordinates::new(95.0, 0.0), "EAC0019F3Z"),
    ];
    let verdicts = evaluator.validate_batch(&meters).await;

    let ids: Vec<_> = verdicts.iter().map(|v| v.meter_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    assert!(verdicts[0].is_valid);

    let stats = evaluator.antifraud_stats().await.unwrap();
    assert_eq!(stats.total_meters, 2);
    assert!(stats.critical_anomalies >= 1);
    assert_eq!(
        stats.fraud_detection_rate,
        stats.anomalies_detected as f64 / 2.0 * 100.0
    );
    assert!(stats.top_anomaly_types.len() <= 5);
}
