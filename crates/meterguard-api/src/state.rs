use meterguard_antifraud::FraudEvaluator;
use meterguard_geocode::Geocoder;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<FraudEvaluator>,
    pub geocoder: Arc<Geocoder>,
    /// Default retention for cleanup requests and the daily sweep
    pub retention_days: u32,
}

impl AppState {
    pub fn new(evaluator: Arc<FraudEvaluator>) -> Self {
        let geocoder = evaluator.geocoder().clone();
        let retention_days = evaluator.config().retention_days;
        Self { evaluator, geocoder, retention_days }
    }
}
