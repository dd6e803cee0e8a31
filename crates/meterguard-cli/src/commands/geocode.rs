//! Geocode and reverse command implementations

use anyhow::{Context, Result};
use meterguard_core::config::LayeredConfig;
use meterguard_core::models::Coordinates;
use meterguard_geocode::Geocoder;

use crate::cli::{GeocodeArgs, ReverseArgs};
use crate::output::OutputWriter;
use crate::output_types::{GeocodeOutput, GeocodeRow, ReverseOutput};

pub async fn execute_forward(
    args: GeocodeArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let geocoder = Geocoder::from_config(&config.geocoding_config());
    let results = geocoder
        .geocode_address(&args.address)
        .await
        .with_context(|| format!("Failed to geocode '{}'", args.address))?;

    if output.is_json() {
        return output.result(GeocodeOutput { query: args.address, results });
    }

    if results.is_empty() {
        output.warning(format!("No results for '{}'", args.address));
        return Ok(());
    }

    output.section(format!("Results for '{}'", args.address));
    output.table(results.iter().enumerate().map(|(i, r)| GeocodeRow::from_forward(i + 1, r)));
    Ok(())
}

pub async fn execute_reverse(
    args: ReverseArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let coordinates = Coordinates::new(args.lat, args.lng);
    let geocoder = Geocoder::from_config(&config.geocoding_config());
    let results = geocoder
        .reverse_geocode(&coordinates)
        .await
        .with_context(|| format!("Failed to reverse geocode {}", coordinates))?;

    if output.is_json() {
        return output.result(ReverseOutput { coordinates, results });
    }

    if results.is_empty() {
        output.warning(format!("No address found at {}", coordinates));
        return Ok(());
    }

    output.section(format!("Addresses near {}", coordinates));
    output.table(results.iter().enumerate().map(|(i, r)| GeocodeRow::from_reverse(i + 1, r)));
    Ok(())
}
