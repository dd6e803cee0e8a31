//! Provider adapters folding each backend's response shape into the common models

pub mod google;
pub mod memory;
pub mod nominatim;

pub use google::GoogleGeocoder;
pub use memory::MemoryProvider;
pub use nominatim::NominatimGeocoder;
