mod antifraud;
mod geocode;
mod health;
mod meters;

pub use antifraud::{cleanup_history, get_stats};
pub use geocode::{geocode_address, reverse_geocode};
pub use health::health_check;
pub use meters::{list_anomalies, validate_batch, validate_meter, MAX_BATCH_SIZE};
