pub mod anomaly;
pub mod coordinates;
pub mod geocoding;
pub mod meter;

pub use anomaly::{AnomalyEvidence, AnomalyStatus, AnomalyType, GpsAnomaly, Severity};
pub use coordinates::Coordinates;
pub use geocoding::{Accuracy, Address, GeocodingResult, ReverseGeocodingResult};
pub use meter::{DeviceInfo, MeterLocation, MeterStatus};
