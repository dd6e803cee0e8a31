use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    /// Optional TOML file layered under the environment
    pub config_path: Option<PathBuf>,
    pub cleanup_interval: Duration,
    pub cache_sweep_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origin: "http://localhost:3000".to_string(),
            config_path: None,
            cleanup_interval: Duration::from_secs(24 * 60 * 60),
            cache_sweep_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env::var("METERGUARD_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let cors_origin = env::var("METERGUARD_CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        let config_path = env::var("METERGUARD_CONFIG").ok().map(PathBuf::from);

        let cleanup_interval = env::var("METERGUARD_CLEANUP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&secs: &u64| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.cleanup_interval);

        let cache_sweep_interval = env::var("METERGUARD_CACHE_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&secs: &u64| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_sweep_interval);

        Self { port, cors_origin, config_path, cleanup_interval, cache_sweep_interval }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
