//! MeterGuard Core - Domain models, errors, and configuration
//!
//! This crate contains the shared vocabulary of the MeterGuard engine: coordinates,
//! addresses, geocoding results, meters and GPS anomalies, plus the layered
//! configuration consumed by the geocoder and the fraud evaluator.

pub mod config;
pub mod error;
pub mod models;

pub use error::{MeterguardError, Result};
