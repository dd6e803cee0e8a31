use futures::future::BoxFuture;
use meterguard_core::config::GeocodingConfig;
use meterguard_core::error::{MeterguardError, Result};
use meterguard_core::models::{Coordinates, GeocodingResult, ReverseGeocodingResult};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheStats, GeocodeCache};
use crate::evidence::EvidenceLinks;
use crate::ports::GeocodeProvider;
use crate::providers::{GoogleGeocoder, NominatimGeocoder};

/// Geocoder walking an ordered chain of providers behind a response cache
///
/// Providers are tried one at a time. The next one is consulted only once the
/// previous one has answered with zero results, failed, or timed out.
pub struct Geocoder {
    providers: Vec<Arc<dyn GeocodeProvider>>,
    cache: GeocodeCache,
    timeout: Duration,
    evidence: EvidenceLinks,
}

impl Geocoder {
    /// Create a geocoder over an explicit provider chain
    pub fn new(
        providers: Vec<Arc<dyn GeocodeProvider>>,
        cache: GeocodeCache,
        timeout: Duration,
    ) -> Self {
        Self { providers, cache, timeout, evidence: EvidenceLinks::default() }
    }

    /// Google first when a key is configured, Nominatim as fallback
    pub fn from_config(config: &GeocodingConfig) -> Self {
        let mut providers: Vec<Arc<dyn GeocodeProvider>> = Vec::new();
        if let Some(google) = GoogleGeocoder::from_config(config) {
            providers.push(Arc::new(google));
        }
        providers.push(Arc::new(NominatimGeocoder::from_config(config)));

        tracing::info!(
            providers = ?providers.iter().map(|p| p.name().to_string()).collect::<Vec<_>>(),
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "Geocoder configured"
        );

        Self::new(providers, GeocodeCache::new(config.cache_ttl), config.provider_timeout)
            .with_evidence(EvidenceLinks::new(
                config.google_api_key.clone(),
                &config.google_base_url,
            ))
    }

    pub fn with_evidence(mut self, evidence: EvidenceLinks) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Resolve an address to coordinates, best match first
    pub async fn geocode_address(&self, address: &str) -> Result<Vec<GeocodingResult>> {
        if address.trim().is_empty() {
            return Err(MeterguardError::InvalidInput {
                field: "address".to_string(),
                reason: "address must not be empty".to_string(),
            });
        }

        if let Some(cached) = self.cache.get_forward(address) {
            tracing::debug!(address = %address, "Geocode cache hit");
            return Ok(cached);
        }

        let results =
            self.run_chain("forward", address, |provider| provider.forward(address)).await?;
        self.cache.put_forward(address, &results);
        Ok(results)
    }

    /// Resolve coordinates to an address, best match first
    pub async fn reverse_geocode(
        &self,
        coordinates: &Coordinates,
    ) -> Result<Vec<ReverseGeocodingResult>> {
        if !coordinates.is_valid() {
            return Err(MeterguardError::InvalidInput {
                field: "coordinates".to_string(),
                reason: format!("{} is outside the WGS 84 range", coordinates),
            });
        }

        if let Some(cached) = self.cache.get_reverse(coordinates) {
            tracing::debug!(coordinates = %coordinates, "Reverse geocode cache hit");
            return Ok(cached);
        }

        let query = coordinates.to_string();
        let results =
            self.run_chain("reverse", &query, |provider| provider.reverse(coordinates)).await?;
        self.cache.put_reverse(coordinates, &results);
        Ok(results)
    }

    /// Try each provider in order until one returns results
    ///
    /// Returns an empty list if at least one provider answered with zero
    /// results and none produced any; fails only when every provider failed.
    async fn run_chain<'a, T, F>(
        &'a self,
        operation: &'static str,
        query: &str,
        call: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(&'a dyn GeocodeProvider) -> BoxFuture<'a, Result<Vec<T>>>,
    {
        if self.providers.is_empty() {
            return Err(MeterguardError::NoProviders);
        }

        let mut failures = Vec::new();
        let mut answered_empty = false;

        for provider in &self.providers {
            let name = provider.name();
            let outcome = match tokio::time::timeout(self.timeout, call(provider.as_ref())).await {
                Ok(outcome) => outcome,
                Err(_) => Err(MeterguardError::ProviderTimeout {
                    provider: name.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(results) if !results.is_empty() => {
                    tracing::debug!(
                        provider = name,
                        operation,
                        query = %query,
                        results = results.len(),
                        "Geocoding resolved"
                    );
                    return Ok(results);
                }
                Ok(_) => {
                    tracing::info!(
                        provider = name,
                        operation,
                        query = %query,
                        "Provider returned zero results"
                    );
                    answered_empty = true;
                }
                Err(e) => {
                    tracing::warn!(
                        provider = name,
                        operation,
                        query = %query,
                        error = %e,
                        "Provider failed"
                    );
                    failures.push(e.to_string());
                }
            }
        }

        if answered_empty {
            Ok(Vec::new())
        } else {
            Err(MeterguardError::AllProvidersFailed { failures: failures.join("; ") })
        }
    }

    /// Haversine distance in meters
    pub fn calculate_distance(a: &Coordinates, b: &Coordinates) -> f64 {
        meterguard_geo::calculate_distance(a, b)
    }

    /// Coarse national plausibility check
    pub fn is_within_chile(coordinates: &Coordinates) -> bool {
        meterguard_geo::is_within_chile(coordinates)
    }

    pub fn street_view_url(&self, coordinates: &Coordinates) -> String {
        self.evidence.street_view_url(coordinates)
    }

    pub fn satellite_image_url(&self, coordinates: &Coordinates) -> String {
        self.evidence.satellite_image_url(coordinates)
    }

    /// Drop expired cache entries, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let removed = self.cache.sweep_expired();
        if removed > 0 {
            tracing::debug!(removed, "Swept expired geocode cache entries");
        }
        removed
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
