//! Fabricated-value heuristics.
//!
//! Tampered devices and hand-entered records tend to carry values like
//! `11111111`, `12345678` or `-11.1111`. A value is flagged when all of its
//! significant characters are identical, or form a strictly ascending or
//! descending run.

use meterguard_core::models::Coordinates;

/// Shortest run considered a pattern
pub const MIN_PATTERN_LEN: usize = 4;

/// True when the alphanumeric characters of `value` repeat or run in sequence
///
/// Case is ignored and separators are skipped, so `"12-34"` reads as `1234`.
pub fn is_suspicious_pattern(value: &str) -> bool {
    let chars: Vec<char> = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if chars.len() < MIN_PATTERN_LEN {
        return false;
    }

    let steps: Vec<i32> = chars.windows(2).map(|w| w[1] as i32 - w[0] as i32).collect();
    let first = steps[0];
    matches!(first, -1..=1) && steps.iter().all(|&step| step == first)
}

/// Digits of a coordinate component as it would be printed
pub fn component_digits(value: f64) -> String {
    value.to_string().chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when either component of `coordinates` looks fabricated
pub fn has_suspicious_digits(coordinates: &Coordinates) -> bool {
    is_suspicious_pattern(&component_digits(coordinates.lat))
        || is_suspicious_pattern(&component_digits(coordinates.lng))
}

/// Quantize coordinates to six decimals (about 11 cm) as a `"lat_lng"` key
pub fn bucket_key(coordinates: &Coordinates) -> String {
    format!("{:.6}_{:.6}", coordinates.lat, coordinates.lng)
}
