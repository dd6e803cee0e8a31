use serde::Deserialize;

/// Query string of `POST /api/v1/antifraud/cleanup`
#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub days: Option<u32>,
}

/// Query string of `GET /api/v1/geocode`
#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    pub address: String,
}

/// Query string of `GET /api/v1/geocode/reverse`
#[derive(Debug, Deserialize)]
pub struct ReverseParams {
    pub lat: f64,
    pub lng: f64,
}
