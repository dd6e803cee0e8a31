use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meterguard_core::error::Result;
use meterguard_core::models::GpsAnomaly;
use std::collections::HashMap;

/// Port for the per-meter anomaly history
///
/// Each meter's entries are kept in detection order, oldest first.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append anomalies for one meter, evicting the oldest beyond `limit`
    ///
    /// Appending and trimming happen atomically with respect to other
    /// operations on the same meter.
    async fn append(&self, meter_id: &str, anomalies: Vec<GpsAnomaly>, limit: usize) -> Result<()>;

    /// Snapshot of one meter's history; empty for unknown meters
    async fn history(&self, meter_id: &str) -> Result<Vec<GpsAnomaly>>;

    /// Snapshot of every meter's history
    async fn all(&self) -> Result<HashMap<String, Vec<GpsAnomaly>>>;

    /// Drop entries detected before `cutoff` and forget meters left empty
    ///
    /// Returns the number of anomalies removed.
    async fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
