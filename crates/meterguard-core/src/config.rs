use crate::error::{MeterguardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_GOOGLE_BASE_URL: &str = "https://maps.googleapis.com";
pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
/// Longest retention window accepted for the anomaly history
pub const MAX_RETENTION_DAYS: u32 = 36_500;

pub const DEFAULT_USER_AGENT: &str = "MeterGuard/0.1 (geospatial meter validation)";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Confidence multipliers applied when a check finds anomalies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyTable {
    pub basic_coordinates: f64,
    pub address_cross_check: f64,
    pub impossible_movement: f64,
    pub historical_pattern: f64,
    pub device_identity: f64,
    /// Applied when a check itself fails to run
    pub pipeline_error: f64,
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self {
            basic_coordinates: 0.3,
            address_cross_check: 0.7,
            impossible_movement: 0.5,
            historical_pattern: 0.8,
            device_identity: 0.4,
            pipeline_error: 0.8,
        }
    }
}

impl PenaltyTable {
    fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("basic_coordinates", self.basic_coordinates),
            ("address_cross_check", self.address_cross_check),
            ("impossible_movement", self.impossible_movement),
            ("historical_pattern", self.historical_pattern),
            ("device_identity", self.device_identity),
            ("pipeline_error", self.pipeline_error),
        ]
    }
}

/// Confidence thresholds driving recommendations and validity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceBands {
    /// Below this: urgent inspection and service suspension
    pub urgent: f64,
    /// Below this: inspection within 24-48 hours
    pub inspect: f64,
    /// Below this: verify at next maintenance; above it a report stays valid
    pub verify: f64,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self { urgent: 0.3, inspect: 0.5, verify: 0.7 }
    }
}

/// Settings for the geocoder and its providers
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodingConfig {
    /// Key for the commercial provider; `None` drops it from the fallback chain
    pub google_api_key: Option<String>,
    pub google_base_url: String,
    /// Descriptive User-Agent required by the Nominatim usage policy
    pub nominatim_user_agent: String,
    pub nominatim_base_url: String,
    /// ISO 3166-1 alpha-2 code used to bias queries
    pub country: String,
    pub language: String,
    pub cache_ttl: Duration,
    pub provider_timeout: Duration,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            google_base_url: DEFAULT_GOOGLE_BASE_URL.to_string(),
            nominatim_user_agent: DEFAULT_USER_AGENT.to_string(),
            nominatim_base_url: DEFAULT_NOMINATIM_BASE_URL.to_string(),
            country: "cl".to_string(),
            language: "es".to_string(),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            provider_timeout: Duration::from_secs(10),
        }
    }
}

/// Thresholds and scoring policy for the fraud evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct AntifraudConfig {
    /// Meters between reported and registered position before flagging
    pub max_allowed_distance: f64,
    /// Speed limit in distance / (hours * 1000) units
    pub movement_threshold: f64,
    /// Newest history entries considered by the movement check
    pub movement_lookback: usize,
    pub pattern_window: chrono::Duration,
    /// Anomalies inside the window that trigger a pattern anomaly
    pub pattern_anomaly_count: usize,
    /// A coordinate bucket repeating more than this is flagged
    pub repetitive_location_count: usize,
    /// Per-meter history cap
    pub history_limit: usize,
    pub retention_days: u32,
    pub bands: ConfidenceBands,
    pub penalties: PenaltyTable,
}

impl Default for AntifraudConfig {
    fn default() -> Self {
        Self {
            max_allowed_distance: 500.0,
            movement_threshold: 120.0,
            movement_lookback: 5,
            pattern_window: chrono::Duration::hours(24),
            pattern_anomaly_count: 3,
            repetitive_location_count: 10,
            history_limit: 100,
            retention_days: 30,
            bands: ConfidenceBands::default(),
            penalties: PenaltyTable::default(),
        }
    }
}

/// Layered configuration for MeterGuard
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub google_api_key: ConfigValue<Option<String>>,
    pub nominatim_user_agent: ConfigValue<String>,
    pub nominatim_base_url: ConfigValue<String>,
    pub country: ConfigValue<String>,
    pub language: ConfigValue<String>,
    pub cache_ttl_secs: ConfigValue<u64>,
    pub provider_timeout_secs: ConfigValue<u64>,
    pub max_allowed_distance: ConfigValue<f64>,
    pub movement_threshold: ConfigValue<f64>,
    pub history_limit: ConfigValue<usize>,
    pub retention_days: ConfigValue<u32>,
    pub penalties: ConfigValue<PenaltyTable>,
    pub bands: ConfigValue<ConfidenceBands>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let geocoding = GeocodingConfig::default();
        let antifraud = AntifraudConfig::default();
        Self {
            google_api_key: ConfigValue::new(None, ConfigSource::Default),
            nominatim_user_agent: ConfigValue::new(
                geocoding.nominatim_user_agent,
                ConfigSource::Default,
            ),
            nominatim_base_url: ConfigValue::new(
                geocoding.nominatim_base_url,
                ConfigSource::Default,
            ),
            country: ConfigValue::new(geocoding.country, ConfigSource::Default),
            language: ConfigValue::new(geocoding.language, ConfigSource::Default),
            cache_ttl_secs: ConfigValue::new(
                geocoding.cache_ttl.as_secs(),
                ConfigSource::Default,
            ),
            provider_timeout_secs: ConfigValue::new(
                geocoding.provider_timeout.as_secs(),
                ConfigSource::Default,
            ),
            max_allowed_distance: ConfigValue::new(
                antifraud.max_allowed_distance,
                ConfigSource::Default,
            ),
            movement_threshold: ConfigValue::new(
                antifraud.movement_threshold,
                ConfigSource::Default,
            ),
            history_limit: ConfigValue::new(antifraud.history_limit, ConfigSource::Default),
            retention_days: ConfigValue::new(antifraud.retention_days, ConfigSource::Default),
            penalties: ConfigValue::new(antifraud.penalties, ConfigSource::Default),
            bands: ConfigValue::new(antifraud.bands, ConfigSource::Default),
        }
    }

    /// Defaults, then the optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::with_defaults();
        let config = match path {
            Some(path) => config.load_from_file(path)?,
            None => config,
        };
        Ok(config.load_from_env())
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| MeterguardError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| MeterguardError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(geocoding) = file_config.geocoding {
            if let Some(key) = geocoding.google_api_key {
                self.google_api_key.update(Some(key), ConfigSource::File);
            }
            if let Some(user_agent) = geocoding.nominatim_user_agent {
                self.nominatim_user_agent.update(user_agent, ConfigSource::File);
            }
            if let Some(url) = geocoding.nominatim_base_url {
                self.nominatim_base_url.update(url, ConfigSource::File);
            }
            if let Some(country) = geocoding.country {
                self.country.update(country, ConfigSource::File);
            }
            if let Some(language) = geocoding.language {
                self.language.update(language, ConfigSource::File);
            }
            if let Some(ttl) = geocoding.cache_ttl_secs {
                self.cache_ttl_secs.update(ttl, ConfigSource::File);
            }
            if let Some(timeout) = geocoding.provider_timeout_secs {
                self.provider_timeout_secs.update(timeout, ConfigSource::File);
            }
        }

        if let Some(antifraud) = file_config.antifraud {
            if let Some(distance) = antifraud.max_allowed_distance {
                self.max_allowed_distance.update(distance, ConfigSource::File);
            }
            if let Some(threshold) = antifraud.movement_threshold {
                self.movement_threshold.update(threshold, ConfigSource::File);
            }
            if let Some(limit) = antifraud.history_limit {
                self.history_limit.update(limit, ConfigSource::File);
            }
            if let Some(days) = antifraud.retention_days {
                self.retention_days.update(days, ConfigSource::File);
            }
            if let Some(penalties) = antifraud.penalties {
                self.penalties.update(penalties, ConfigSource::File);
            }
            if let Some(bands) = antifraud.confidence_bands {
                self.bands.update(bands, ConfigSource::File);
            }
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // METERGUARD_GOOGLE_API_KEY
        if let Ok(key) = env::var("METERGUARD_GOOGLE_API_KEY") {
            if !key.trim().is_empty() {
                self.google_api_key.update(Some(key), ConfigSource::Environment);
            }
        }

        if let Ok(user_agent) = env::var("METERGUARD_NOMINATIM_USER_AGENT") {
            self.nominatim_user_agent.update(user_agent, ConfigSource::Environment);
        }

        if let Ok(url) = env::var("METERGUARD_NOMINATIM_URL") {
            self.nominatim_base_url.update(url, ConfigSource::Environment);
        }

        if let Ok(country) = env::var("METERGUARD_COUNTRY") {
            self.country.update(country.to_lowercase(), ConfigSource::Environment);
        }

        if let Ok(language) = env::var("METERGUARD_LANGUAGE") {
            self.language.update(language, ConfigSource::Environment);
        }

        if let Some(ttl) = parse_env("METERGUARD_CACHE_TTL_SECS", "integer number of seconds") {
            self.cache_ttl_secs.update(ttl, ConfigSource::Environment);
        }

        if let Some(timeout) =
            parse_env("METERGUARD_PROVIDER_TIMEOUT_SECS", "integer number of seconds")
        {
            self.provider_timeout_secs.update(timeout, ConfigSource::Environment);
        }

        if let Some(distance) = parse_env("METERGUARD_MAX_ALLOWED_DISTANCE", "distance in meters")
        {
            self.max_allowed_distance.update(distance, ConfigSource::Environment);
        }

        if let Some(threshold) = parse_env("METERGUARD_MOVEMENT_THRESHOLD", "number") {
            self.movement_threshold.update(threshold, ConfigSource::Environment);
        }

        if let Some(limit) = parse_env("METERGUARD_HISTORY_LIMIT", "positive integer") {
            self.history_limit.update(limit, ConfigSource::Environment);
        }

        if let Some(days) = parse_env("METERGUARD_RETENTION_DAYS", "integer number of days") {
            self.retention_days.update(days, ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(key) = overrides.google_api_key {
            self.google_api_key.update(Some(key), ConfigSource::Cli);
        }

        if let Some(user_agent) = overrides.nominatim_user_agent {
            self.nominatim_user_agent.update(user_agent, ConfigSource::Cli);
        }

        if let Some(distance) = overrides.max_allowed_distance {
            self.max_allowed_distance.update(distance, ConfigSource::Cli);
        }

        if let Some(threshold) = overrides.movement_threshold {
            self.movement_threshold.update(threshold, ConfigSource::Cli);
        }
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.nominatim_user_agent.value.trim().is_empty() {
            return Err(MeterguardError::ConfigInvalid {
                key: "nominatim_user_agent".to_string(),
                reason: "Nominatim requires a descriptive User-Agent".to_string(),
            });
        }

        if !(self.max_allowed_distance.value > 0.0) {
            return Err(MeterguardError::ConfigInvalid {
                key: "max_allowed_distance".to_string(),
                reason: format!("must be positive, got {}", self.max_allowed_distance.value),
            });
        }

        if !(self.movement_threshold.value > 0.0) {
            return Err(MeterguardError::ConfigInvalid {
                key: "movement_threshold".to_string(),
                reason: format!("must be positive, got {}", self.movement_threshold.value),
            });
        }

        if self.provider_timeout_secs.value == 0 {
            return Err(MeterguardError::ConfigInvalid {
                key: "provider_timeout".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }

        if self.cache_ttl_secs.value == 0 {
            return Err(MeterguardError::ConfigInvalid {
                key: "cache_ttl".to_string(),
                reason: "must be at least one second".to_string(),
            });
        }

        if self.retention_days.value > MAX_RETENTION_DAYS {
            return Err(MeterguardError::ConfigInvalid {
                key: "retention_days".to_string(),
                reason: format!(
                    "must be at most {}, got {}",
                    MAX_RETENTION_DAYS, self.retention_days.value
                ),
            });
        }

        if self.history_limit.value == 0 {
            return Err(MeterguardError::ConfigInvalid {
                key: "history_limit".to_string(),
                reason: "must keep at least one entry".to_string(),
            });
        }

        for (name, factor) in self.penalties.value.entries() {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(MeterguardError::ConfigInvalid {
                    key: format!("penalties.{}", name),
                    reason: format!("must be in (0, 1], got {}", factor),
                });
            }
        }

        let bands = self.bands.value;
        let ordered = 0.0 <= bands.urgent
            && bands.urgent <= bands.inspect
            && bands.inspect <= bands.verify
            && bands.verify <= 1.0;
        if !ordered {
            return Err(MeterguardError::ConfigInvalid {
                key: "confidence_bands".to_string(),
                reason: "expected 0 <= urgent <= inspect <= verify <= 1".to_string(),
            });
        }

        Ok(())
    }

    /// Settings for the geocoder
    pub fn geocoding_config(&self) -> GeocodingConfig {
        GeocodingConfig {
            google_api_key: self.google_api_key.value.clone(),
            google_base_url: DEFAULT_GOOGLE_BASE_URL.to_string(),
            nominatim_user_agent: self.nominatim_user_agent.value.clone(),
            nominatim_base_url: self.nominatim_base_url.value.clone(),
            country: self.country.value.clone(),
            language: self.language.value.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs.value),
            provider_timeout: Duration::from_secs(self.provider_timeout_secs.value),
        }
    }

    /// Settings for the fraud evaluator
    pub fn antifraud_config(&self) -> AntifraudConfig {
        AntifraudConfig {
            max_allowed_distance: self.max_allowed_distance.value,
            movement_threshold: self.movement_threshold.value,
            history_limit: self.history_limit.value,
            retention_days: self.retention_days.value,
            bands: self.bands.value,
            penalties: self.penalties.value,
            ..AntifraudConfig::default()
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        let key_display = match &self.google_api_key.value {
            Some(key) => mask_secret(key),
            None => "(not set)".to_string(),
        };
        map.insert("google_api_key".to_string(), (key_display, self.google_api_key.source));

        map.insert(
            "nominatim_user_agent".to_string(),
            (self.nominatim_user_agent.value.clone(), self.nominatim_user_agent.source),
        );
        map.insert(
            "nominatim_base_url".to_string(),
            (self.nominatim_base_url.value.clone(), self.nominatim_base_url.source),
        );
        map.insert("country".to_string(), (self.country.value.clone(), self.country.source));
        map.insert("language".to_string(), (self.language.value.clone(), self.language.source));
        map.insert(
            "cache_ttl".to_string(),
            (format!("{}s", self.cache_ttl_secs.value), self.cache_ttl_secs.source),
        );
        map.insert(
            "provider_timeout".to_string(),
            (format!("{}s", self.provider_timeout_secs.value), self.provider_timeout_secs.source),
        );
        map.insert(
            "max_allowed_distance".to_string(),
            (format!("{} m", self.max_allowed_distance.value), self.max_allowed_distance.source),
        );
        map.insert(
            "movement_threshold".to_string(),
            (self.movement_threshold.value.to_string(), self.movement_threshold.source),
        );
        map.insert(
            "history_limit".to_string(),
            (self.history_limit.value.to_string(), self.history_limit.source),
        );
        map.insert(
            "retention_days".to_string(),
            (self.retention_days.value.to_string(), self.retention_days.source),
        );
        map.insert(
            "penalties".to_string(),
            (format!("{:?}", self.penalties.value), self.penalties.source),
        );
        map.insert(
            "confidence_bands".to_string(),
            (format!("{:?}", self.bands.value), self.bands.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    geocoding: Option<GeocodingSection>,
    antifraud: Option<AntifraudSection>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GeocodingSection {
    google_api_key: Option<String>,
    nominatim_user_agent: Option<String>,
    nominatim_base_url: Option<String>,
    country: Option<String>,
    language: Option<String>,
    cache_ttl_secs: Option<u64>,
    provider_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct AntifraudSection {
    max_allowed_distance: Option<f64>,
    movement_threshold: Option<f64>,
    history_limit: Option<usize>,
    retention_days: Option<u32>,
    penalties: Option<PenaltyTable>,
    confidence_bands: Option<ConfidenceBands>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub google_api_key: Option<String>,
    pub nominatim_user_agent: Option<String>,
    pub max_allowed_distance: Option<f64>,
    pub movement_threshold: Option<f64>,
}

fn parse_env<T: std::str::FromStr>(name: &str, expected: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected {}", name, raw, expected);
            None
        }
    }
}

fn mask_secret(secret: &str) -> String {
    let skip = secret.chars().count().saturating_sub(4);
    format!("****{}", secret.chars().skip(skip).collect::<String>())
}
