//! In-memory provider for development and testing.
//!
//! Answers from fixed tables instead of the network and counts the calls it
//! receives, which makes cache and fallback behaviour observable.

use async_trait::async_trait;
use meterguard_core::error::{MeterguardError, Result};
use meterguard_core::models::{Coordinates, GeocodingResult, ReverseGeocodingResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::cache::{normalize_address, reverse_cache_key};
use crate::ports::GeocodeProvider;

#[derive(Debug, Default)]
pub struct MemoryProvider {
    name: String,
    forward: RwLock<HashMap<String, Vec<GeocodingResult>>>,
    reverse: RwLock<HashMap<String, Vec<ReverseGeocodingResult>>>,
    failing: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Register the answer for a forward query
    pub fn with_forward(self, address: &str, results: Vec<GeocodingResult>) -> Self {
        self.forward
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_address(address), results);
        self
    }

    /// Register the answer for a reverse query
    pub fn with_reverse(
        self,
        coordinates: &Coordinates,
        results: Vec<ReverseGeocodingResult>,
    ) -> Self {
        self.reverse
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reverse_cache_key(coordinates), results);
        self
    }

    /// Sleep before answering, to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every call fail as if the provider were unreachable
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of forward and reverse calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(MeterguardError::Provider {
                provider: self.name.clone(),
                reason: "provider marked as failing".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GeocodeProvider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn forward(&self, address: &str) -> Result<Vec<GeocodingResult>> {
        self.begin_call().await?;
        let table = self.forward.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.get(&normalize_address(address)).cloned().unwrap_or_default())
    }

    async fn reverse(&self, coordinates: &Coordinates) -> Result<Vec<ReverseGeocodingResult>> {
        self.begin_call().await?;
        let table = self.reverse.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.get(&reverse_cache_key(coordinates)).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterguard_core::models::{Accuracy, Address};

    #[tokio::test]
    async fn test_lookup_is_normalized() {
        let result = GeocodingResult {
            coordinates: Coordinates::new(-33.45, -70.65),
            address: Address::formatted("Plaza de Armas, Santiago"),
            accuracy: Accuracy::GeometricCenter,
            place_id: None,
            types: vec![],
        };
        let provider =
            MemoryProvider::new("memory").with_forward("Plaza de Armas, Santiago", vec![result]);

        let found = provider.forward("  plaza de armas,   SANTIAGO ").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(provider.forward("Unknown").await.unwrap().is_empty());
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let provider = MemoryProvider::new("flaky");
        provider.set_failing(true);
        assert!(provider.forward("anything").await.is_err());
        provider.set_failing(false);
        assert!(provider.forward("anything").await.unwrap().is_empty());
    }
}
