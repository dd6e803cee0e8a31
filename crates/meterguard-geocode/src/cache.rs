//! Geocoding response cache.
//!
//! Entries expire after a fixed TTL. Expired entries are evicted lazily when
//! read, or all at once by [`TtlCache::sweep_expired`]. Lock poisoning is
//! recovered from: this is a performance cache and a half-written entry is at
//! worst a redundant provider call.

use meterguard_core::models::{Coordinates, GeocodingResult, ReverseGeocodingResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Normalize a free-text address into a cache key
pub fn normalize_address(address: &str) -> String {
    address.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Quantize coordinates into a `"lat_lng"` cache key
pub fn reverse_cache_key(coordinates: &Coordinates) -> String {
    meterguard_geo::bucket_key(coordinates)
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe map whose entries expire after a fixed time-to-live
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) >= self.ttl
    }

    /// Fresh value for `key`, evicting it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                Some(entry) if !self.is_expired(entry, now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Expired: re-check under the write lock, a writer may have refreshed it
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|entry| self.is_expired(entry, now)) {
            entries.remove(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry { value, inserted_at: Instant::now() };
        self.entries.write().unwrap_or_else(PoisonError::into_inner).insert(key.into(), entry);
    }

    /// Remove every expired entry, returning how many were dropped
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Cache counters for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub forward_entries: usize,
    pub reverse_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Forward and reverse caches sharing one TTL
#[derive(Debug)]
pub struct GeocodeCache {
    forward: TtlCache<Vec<GeocodingResult>>,
    reverse: TtlCache<Vec<ReverseGeocodingResult>>,
}

impl GeocodeCache {
    pub fn new(ttl: Duration) -> Self {
        Self { forward: TtlCache::new(ttl), reverse: TtlCache::new(ttl) }
    }

    pub fn get_forward(&self, address: &str) -> Option<Vec<GeocodingResult>> {
        self.forward.get(&normalize_address(address))
    }

    /// Store a forward answer; empty answers are not cached
    pub fn put_forward(&self, address: &str, results: &[GeocodingResult]) {
        if !results.is_empty() {
            self.forward.insert(normalize_address(address), results.to_vec());
        }
    }

    pub fn get_reverse(&self, coordinates: &Coordinates) -> Option<Vec<ReverseGeocodingResult>> {
        self.reverse.get(&reverse_cache_key(coordinates))
    }

    /// Store a reverse answer; empty answers are not cached
    pub fn put_reverse(&self, coordinates: &Coordinates, results: &[ReverseGeocodingResult]) {
        if !results.is_empty() {
            self.reverse.insert(reverse_cache_key(coordinates), results.to_vec());
        }
    }

    pub fn sweep_expired(&self) -> usize {
        self.forward.sweep_expired() + self.reverse.sweep_expired()
    }

    pub fn clear(&self) {
        self.forward.clear();
        self.reverse.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            forward_entries: self.forward.len(),
            reverse_entries: self.reverse.len(),
            hits: self.forward.hits() + self.reverse.hits(),
            misses: self.forward.misses() + self.reverse.misses(),
        }
    }
}
