mod request;
mod response;

pub use request::{CleanupParams, GeocodeParams, ReverseParams};
pub use response::{CleanupResponse, HealthResponse};
