//! Integration tests for the meterguard binary
//!
//! None of these reach the network: distance and config are local, and
//! validate runs with --offline.

use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output};

fn meterguard() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_meterguard"));
    for key in [
        "METERGUARD_MAX_ALLOWED_DISTANCE",
        "METERGUARD_MOVEMENT_THRESHOLD",
        "METERGUARD_GOOGLE_API_KEY",
    ] {
        command.env_remove(key);
    }
    command
}

fn json_stdout(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

const METER: &str = r#"{
    "id": "M-100",
    "customerId": "C-1",
    "customerName": "Comercial Andes",
    "coordinates": {"lat": -33.4263, "lng": -70.6196},
    "address": {
        "street": "Av. Providencia",
        "number": "1234",
        "city": "Santiago",
        "state": "RM",
        "country": "Chile",
        "formattedAddress": "Av. Providencia 1234, Santiago"
    },
    "installationDate": "2024-01-15T09:00:00Z",
    "deviceInfo": {"serialNumber": "EAC0019F3Z", "model": "GX-200", "manufacturer": "Acme"}
}"#;

#[test]
fn test_distance_json() {
    let output = meterguard()
        .args(["distance", "--from", "-33.45,-70.65", "--to", "-33.4420,-70.6550", "--json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "Command should succeed");
    let parsed = json_stdout(&output);
    assert_eq!(parsed["status"], "success");

    let meters = parsed["data"]["meters"].as_f64().unwrap();
    assert!((meters - 1003.0).abs() < 10.0, "unexpected distance {meters}");
    assert_eq!(parsed["data"]["fromWithinChile"], true);
    assert_eq!(parsed["data"]["toWithinChile"], true);
}

#[test]
fn test_distance_rejects_bad_coordinates() {
    let output = meterguard()
        .args(["distance", "--from", "-33.45", "--to", "-33.4420,-70.6550"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_validate_offline_single_report() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(METER.as_bytes()).unwrap();

    let output = meterguard()
        .args(["validate", "--offline", "--json"])
        .arg(file.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let parsed = json_stdout(&output);
    let verdicts = parsed["data"].as_array().unwrap();
    assert_eq!(verdicts.len(), 1);

    let verdict = &verdicts[0];
    assert_eq!(verdict["meterId"], "M-100");
    let anomalies = verdict["anomalies"].as_array().unwrap();
    assert_eq!(anomalies.len(), 1);
    assert!(anomalies[0]["description"].as_str().unwrap().contains("could not be verified"));
    assert!((verdict["confidence"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert_eq!(verdict["riskLevel"], "low");
    assert_eq!(verdict["suggestedStatus"], "suspicious");
}

#[test]
fn test_validate_human_output_names_worst_anomaly() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(METER.as_bytes()).unwrap();

    let output = meterguard()
        .args(["validate", "--offline"])
        .arg(file.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Meter M-100"));
    assert!(stdout.contains("Worst anomaly"), "stdout: {stdout}");
}

#[test]
fn test_validate_offline_batch_keeps_order() {
    let second = METER.replace("M-100", "M-200").replace("EAC0019F3Z", "1234");
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[{}, {}]", METER, second).unwrap();

    let output = meterguard()
        .args(["validate", "--offline", "--json"])
        .arg(file.path())
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let parsed = json_stdout(&output);
    assert_eq!(parsed["data"][0]["meterId"], "M-100");
    assert_eq!(parsed["data"][1]["meterId"], "M-200");
    assert_eq!(parsed["data"][1]["anomalies"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_validate_missing_file_fails() {
    let output = meterguard()
        .args(["validate", "--offline", "/nonexistent/meters.json"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_config_reports_sources() {
    let output = meterguard()
        .env("METERGUARD_MOVEMENT_THRESHOLD", "90")
        .args(["config", "--json", "--max-distance", "750"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let parsed = json_stdout(&output);
    let entries = parsed["data"].as_array().unwrap();
    let entry = |key: &str| entries.iter().find(|e| e["key"] == key).cloned().unwrap();

    assert_eq!(entry("max_allowed_distance")["source"], "Cli");
    assert_eq!(entry("max_allowed_distance")["value"], "750 m");
    assert_eq!(entry("movement_threshold")["source"], "Environment");
    assert_eq!(entry("history_limit")["source"], "Default");
    assert_eq!(entry("google_api_key")["value"], "(not set)");
}
