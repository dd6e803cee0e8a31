use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use meterguard_core::config::AntifraudConfig;
use meterguard_core::error::{MeterguardError, Result};
use meterguard_core::models::{AnomalyType, GpsAnomaly, MeterLocation, Severity};
use meterguard_geocode::Geocoder;
use std::sync::Arc;

use crate::checks::{self, CheckContext};
use crate::memory::MemoryHistoryStore;
use crate::ports::HistoryStore;
use crate::recommendations::recommend;
use crate::scoring::{CheckKind, Confidence};
use crate::stats::AntifraudStats;
use crate::verdict::ValidationVerdict;

/// Runs the check pipeline over meter reports and keeps their history
pub struct FraudEvaluator {
    geocoder: Arc<Geocoder>,
    store: Arc<dyn HistoryStore>,
    config: AntifraudConfig,
}

impl FraudEvaluator {
    pub fn new(
        geocoder: Arc<Geocoder>,
        store: Arc<dyn HistoryStore>,
        config: AntifraudConfig,
    ) -> Self {
        Self { geocoder, store, config }
    }

    /// Evaluator backed by an in-memory history
    pub fn in_memory(geocoder: Arc<Geocoder>, config: AntifraudConfig) -> Self {
        Self::new(geocoder, Arc::new(MemoryHistoryStore::new()), config)
    }

    pub fn config(&self) -> &AntifraudConfig {
        &self.config
    }

    pub fn geocoder(&self) -> &Arc<Geocoder> {
        &self.geocoder
    }

    /// Validate one report and record its anomalies
    ///
    /// Never fails: a check that cannot run contributes a low-severity
    /// anomaly and the remaining checks still run.
    pub async fn validate_meter_location(&self, meter: &MeterLocation) -> ValidationVerdict {
        let now = Utc::now();
        let history = self.store.history(&meter.id).await;

        let mut anomalies: Vec<GpsAnomaly> = Vec::new();
        let mut confidence = Confidence::default();

        for kind in CheckKind::PIPELINE {
            let outcome = match &history {
                Ok(history) => {
                    let ctx = CheckContext { meter, history, now, config: &self.config };
                    self.run_check(kind, &ctx).await
                }
                Err(e) if kind.reads_history() => {
                    Err(MeterguardError::History { reason: e.to_string() })
                }
                Err(_) => {
                    let ctx = CheckContext { meter, history: &[], now, config: &self.config };
                    self.run_check(kind, &ctx).await
                }
            };

            match outcome {
                Ok(found) if found.is_empty() => {}
                Ok(found) => {
                    tracing::debug!(
                        meter_id = %meter.id,
                        check = %kind,
                        anomalies = found.len(),
                        "Check fired"
                    );
                    confidence.apply(kind.penalty(&self.config.penalties));
                    anomalies.extend(found);
                }
                Err(e) => {
                    tracing::warn!(meter_id = %meter.id, check = %kind, error = %e, "Check failed");
                    confidence.apply(self.config.penalties.pipeline_error);
                    anomalies.push(
                        GpsAnomaly::new(
                            &meter.id,
                            AnomalyType::SignalTampering,
                            Severity::Low,
                            format!("Validation step {} could not be completed", kind),
                            meter.coordinates,
                        )
                        .with_detected_at(now),
                    );
                }
            }
        }

        let limit = self.config.history_limit;
        if let Err(e) = self.store.append(&meter.id, anomalies.clone(), limit).await {
            tracing::warn!(meter_id = %meter.id, error = %e, "Failed to record anomaly history");
        }

        let recommendations = recommend(confidence.value(), &anomalies, &self.config.bands);
        let verdict = ValidationVerdict::new(
            &meter.id,
            anomalies,
            confidence.value(),
            recommendations,
            self.config.bands,
        );

        tracing::info!(
            meter_id = %meter.id,
            is_valid = verdict.is_valid,
            confidence = verdict.confidence,
            anomalies = verdict.anomalies.len(),
            "Meter location validated"
        );

        verdict
    }

    async fn run_check(&self, kind: CheckKind, ctx: &CheckContext<'_>) -> Result<Vec<GpsAnomaly>> {
        match kind {
            CheckKind::BasicCoordinates => Ok(checks::basic_coordinates(ctx)),
            CheckKind::AddressCrossCheck => checks::address_cross_check(ctx, &self.geocoder).await,
            CheckKind::ImpossibleMovement => Ok(checks::impossible_movement(ctx)),
            CheckKind::HistoricalPattern => Ok(checks::historical_pattern(ctx)),
            CheckKind::DeviceIdentity => Ok(checks::device_identity(ctx)),
        }
    }

    /// Validate several reports concurrently; verdicts keep the input order
    pub async fn validate_batch(&self, meters: &[MeterLocation]) -> Vec<ValidationVerdict> {
        join_all(meters.iter().map(|meter| self.validate_meter_location(meter))).await
    }

    /// Stored anomalies of one meter, oldest first
    pub async fn meter_history(&self, meter_id: &str) -> Result<Vec<GpsAnomaly>> {
        self.store.history(meter_id).await
    }

    pub async fn antifraud_stats(&self) -> Result<AntifraudStats> {
        let histories = self.store.all().await?;
        Ok(AntifraudStats::from_histories(&histories))
    }

    /// Drop anomalies older than `days_to_keep` days, returning how many went
    ///
    /// A window reaching past the earliest representable date removes nothing.
    pub async fn clean_old_history(&self, days_to_keep: u32) -> Result<usize> {
        let cutoff = TimeDelta::try_days(i64::from(days_to_keep))
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.store.remove_older_than(cutoff).await?;
        tracing::info!(removed, days_to_keep, "Cleaned anomaly history");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use meterguard_core::models::{
        Accuracy, Address, Coordinates, DeviceInfo, GeocodingResult, MeterStatus,
    };
    use meterguard_geocode::{GeocodeCache, MemoryProvider};
    use std::collections::HashMap;
    use std::time::Duration;

    const ADDRESS: &str = "Av. Providencia 1234, Santiago";

    struct BrokenStore;

    #[async_trait]
    impl HistoryStore for BrokenStore {
        async fn append(&self, _: &str, _: Vec<GpsAnomaly>, _: usize) -> Result<()> {
            Err(MeterguardError::History { reason: "store offline".to_string() })
        }

        async fn history(&self, _: &str) -> Result<Vec<GpsAnomaly>> {
            Err(MeterguardError::History { reason: "store offline".to_string() })
        }

        async fn all(&self) -> Result<HashMap<String, Vec<GpsAnomaly>>> {
            Err(MeterguardError::History { reason: "store offline".to_string() })
        }

        async fn remove_older_than(&self, _: DateTime<Utc>) -> Result<usize> {
            Err(MeterguardError::History { reason: "store offline".to_string() })
        }
    }

    fn santiago() -> Coordinates {
        Coordinates::new(-33.4263, -70.6196)
    }

    fn evaluator_with_store(store: Arc<dyn HistoryStore>) -> FraudEvaluator {
        let provider = MemoryProvider::new("memory").with_forward(
            ADDRESS,
            vec![GeocodingResult {
                coordinates: santiago(),
                address: Address::formatted(ADDRESS),
                accuracy: Accuracy::Rooftop,
                place_id: None,
                types: vec![],
            }],
        );
        let geocoder = Geocoder::new(
            vec![Arc::new(provider)],
            GeocodeCache::new(Duration::from_secs(60)),
            Duration::from_secs(1),
        );
        FraudEvaluator::new(Arc::new(geocoder), store, AntifraudConfig::default())
    }

    fn meter() -> MeterLocation {
        MeterLocation {
            id: "M-1".to_string(),
            customer_id: "C-1".to_string(),
            customer_name: "Comercial Andes".to_string(),
            coordinates: santiago(),
            address: Address::formatted(ADDRESS),
            installation_date: Utc::now(),
            last_reading: None,
            device_info: DeviceInfo {
                serial_number: "EAC0019F3Z".to_string(),
                model: "GX-200".to_string(),
                manufacturer: "Acme".to_string(),
            },
            status: MeterStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_history_outage_is_contained() {
        let evaluator = evaluator_with_store(Arc::new(BrokenStore));
        let verdict = evaluator.validate_meter_location(&meter()).await;

        assert_eq!(verdict.anomalies.len(), 2);
        assert!(verdict.anomalies.iter().all(|a| {
            a.anomaly_type == AnomalyType::SignalTampering && a.severity == Severity::Low
        }));
        assert!(verdict.anomalies[0].description.contains("impossible_movement"));
        assert!(verdict.anomalies[1].description.contains("historical_pattern"));
        assert!((verdict.confidence - 0.64).abs() < 1e-12);
        assert!(!verdict.is_valid);
    }

    #[tokio::test]
    async fn test_store_errors_surface_from_queries() {
        let evaluator = evaluator_with_store(Arc::new(BrokenStore));
        assert!(evaluator.antifraud_stats().await.is_err());
        assert!(evaluator.clean_old_history(30).await.is_err());
        assert!(evaluator.meter_history("M-1").await.is_err());
    }

    #[tokio::test]
    async fn test_huge_retention_window_removes_nothing() {
        let store = Arc::new(MemoryHistoryStore::new());
        let evaluator = evaluator_with_store(store.clone());
        let old =
            GpsAnomaly::new("M-9", AnomalyType::DeviceCloning, Severity::High, "old", santiago())
                .with_detected_at(Utc::now() - TimeDelta::days(400));
        store.append("M-9", vec![old], 100).await.unwrap();

        assert_eq!(evaluator.clean_old_history(100_000_000).await.unwrap(), 0);
        assert_eq!(evaluator.clean_old_history(u32::MAX).await.unwrap(), 0);
        assert_eq!(store.meter_count(), 1);

        assert_eq!(evaluator.clean_old_history(30).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clean_pass_records_nothing() {
        let store = Arc::new(MemoryHistoryStore::new());
        let evaluator = evaluator_with_store(store.clone());
        let verdict = evaluator.validate_meter_location(&meter()).await;

        assert!(verdict.is_valid);
        assert_eq!(verdict.confidence, 1.0);
        assert!(verdict.recommendations.is_empty());
        assert_eq!(store.meter_count(), 0);
    }
}
