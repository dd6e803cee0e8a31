//! Error types for MeterGuard

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeterguardError {
    // Input errors
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    // Geocoding provider errors
    #[error("Geocoding provider {provider} failed: {reason}")]
    Provider { provider: String, reason: String },

    #[error("Geocoding provider {provider} timed out after {timeout_ms} ms")]
    ProviderTimeout { provider: String, timeout_ms: u64 },

    #[error("All geocoding providers failed: {failures}")]
    AllProvidersFailed { failures: String },

    #[error("No geocoding providers configured. Try: set METERGUARD_GOOGLE_API_KEY or METERGUARD_NOMINATIM_USER_AGENT")]
    NoProviders,

    // History store errors
    #[error("Anomaly history unavailable: {reason}")]
    History { reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MeterguardError {
    /// True for failures originating in an external geocoding provider
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            MeterguardError::Provider { .. }
                | MeterguardError::ProviderTimeout { .. }
                | MeterguardError::AllProvidersFailed { .. }
                | MeterguardError::NoProviders
        )
    }
}

impl From<serde_json::Error> for MeterguardError {
    fn from(err: serde_json::Error) -> Self {
        MeterguardError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MeterguardError>;
