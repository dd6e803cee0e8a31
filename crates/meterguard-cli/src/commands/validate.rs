//! Validate command implementation

use anyhow::{Context, Result};
use meterguard_antifraud::{FraudEvaluator, ValidationVerdict};
use meterguard_core::config::LayeredConfig;
use meterguard_core::models::MeterLocation;
use meterguard_geocode::{GeocodeCache, Geocoder};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::cli::ValidateArgs;
use crate::output::OutputWriter;
use crate::output_types::{AnomalyRow, ValidateOutput};

/// A report file holds one meter or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum MeterFile {
    Many(Vec<MeterLocation>),
    One(Box<MeterLocation>),
}

fn read_meters(path: &Path) -> Result<Vec<MeterLocation>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let parsed: MeterFile = serde_json::from_str(&content)
        .with_context(|| {
            format!("{} is not a meter report or a list of meter reports", path.display())
        })?;
    Ok(match parsed {
        MeterFile::Many(meters) => meters,
        MeterFile::One(meter) => vec![*meter],
    })
}

pub async fn execute(
    args: ValidateArgs,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let meters = read_meters(&args.path)?;

    let geocoding = config.geocoding_config();
    let geocoder = if args.offline {
        let cache = GeocodeCache::new(geocoding.cache_ttl);
        Geocoder::new(Vec::new(), cache, geocoding.provider_timeout)
    } else {
        Geocoder::from_config(&geocoding)
    };

    let evaluator = FraudEvaluator::in_memory(Arc::new(geocoder), config.antifraud_config());
    let verdicts = evaluator.validate_batch(&meters).await;

    if output.is_json() {
        let results: Vec<ValidateOutput> = verdicts.into_iter().map(ValidateOutput::from).collect();
        return output.result(results);
    }

    for verdict in &verdicts {
        print_verdict(verdict, output);
    }
    Ok(())
}

fn print_verdict(verdict: &ValidationVerdict, output: &OutputWriter) {
    output.section(format!("Meter {}", verdict.meter_id));
    if verdict.is_valid {
        output.success("Location accepted");
    } else {
        output.warning("Location flagged");
    }
    output.kv("Confidence", format!("{:.2}", verdict.confidence));
    output.risk("Risk level", verdict.risk_level());
    if let Some(worst) = verdict.highest_severity() {
        output.risk("Worst anomaly", worst);
    }
    output.kv("Suggested status", format!("{:?}", verdict.suggested_status()));

    if !verdict.anomalies.is_empty() {
        output.table(verdict.anomalies.iter().map(AnomalyRow::from));
    }
    for recommendation in &verdict.recommendations {
        output.info(recommendation);
    }
}
