use clap::{Parser, Subcommand};
use meterguard_core::models::Coordinates;
use std::path::PathBuf;

/// MeterGuard - Geospatial validation of utility meter locations
#[derive(Parser, Debug)]
#[command(name = "meterguard")]
#[command(about = "Geospatial validation of utility meter locations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Google Geocoding API key (overrides file and environment)
    #[arg(long, global = true, value_name = "KEY")]
    pub google_api_key: Option<String>,

    /// User-Agent sent to Nominatim
    #[arg(long, global = true, value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Maximum distance in meters between reported and registered position
    #[arg(long, global = true, value_name = "METERS")]
    pub max_distance: Option<f64>,

    /// Movement speed threshold
    #[arg(long, global = true)]
    pub movement_threshold: Option<f64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an address to coordinates
    Geocode(GeocodeArgs),

    /// Resolve coordinates to an address
    Reverse(ReverseArgs),

    /// Great-circle distance between two points
    Distance(DistanceArgs),

    /// Validate meter reports from a JSON file
    Validate(ValidateArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct GeocodeArgs {
    /// Free-text address, e.g. "Av. Providencia 1234, Santiago"
    pub address: String,
}

#[derive(Parser, Debug)]
pub struct ReverseArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,
}

#[derive(Parser, Debug)]
pub struct DistanceArgs {
    /// Start point as "lat,lng"
    #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinates)]
    pub from: Coordinates,

    /// End point as "lat,lng"
    #[arg(long, allow_hyphen_values = true, value_parser = parse_coordinates)]
    pub to: Coordinates,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// JSON file holding one meter report or an array of them
    pub path: PathBuf,

    /// Skip geocoding; the address check reports the address as unverified
    #[arg(long)]
    pub offline: bool,
}

/// Parse a `"lat,lng"` pair
pub fn parse_coordinates(value: &str) -> Result<Coordinates, String> {
    let (lat, lng) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got '{}'", value))?;

    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("invalid longitude '{}'", lng.trim()))?;

    let coordinates = Coordinates::new(lat, lng);
    if !coordinates.is_valid() {
        return Err(format!("{} is outside the valid latitude/longitude range", coordinates));
    }
    Ok(coordinates)
}
