//! MeterGuard Geocode - Forward and reverse geocoding with provider fallback
//!
//! This crate defines the [`GeocodeProvider`] port, adapters for the Google
//! Geocoding API and Nominatim, a TTL response cache, and the [`Geocoder`]
//! that walks an ordered provider chain.

pub mod cache;
pub mod evidence;
pub mod geocoder;
pub mod ports;
pub mod providers;

pub use cache::{normalize_address, reverse_cache_key, CacheStats, GeocodeCache, TtlCache};
pub use evidence::EvidenceLinks;
pub use geocoder::Geocoder;
pub use ports::GeocodeProvider;
pub use providers::{GoogleGeocoder, MemoryProvider, NominatimGeocoder};
