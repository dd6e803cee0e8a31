//! In-memory anomaly history.
//!
//! The meter map sits behind an `RwLock` and every meter's history behind its
//! own `Mutex`, so validations of different meters never contend. Appends hold
//! the map's read lock while they push, which keeps cleanup from dropping a
//! meter between lookup and push.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meterguard_core::error::{MeterguardError, Result};
use meterguard_core::models::GpsAnomaly;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use crate::ports::HistoryStore;

type MeterHistory = Arc<Mutex<VecDeque<GpsAnomaly>>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    meters: Arc<RwLock<HashMap<String, MeterHistory>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of meters with at least one stored anomaly
    pub fn meter_count(&self) -> usize {
        self.meters.read().map(|meters| meters.len()).unwrap_or(0)
    }
}

fn poisoned<T>(_: T) -> MeterguardError {
    MeterguardError::History { reason: "history lock poisoned".to_string() }
}

fn push_bounded(
    history: &Mutex<VecDeque<GpsAnomaly>>,
    anomalies: Vec<GpsAnomaly>,
    limit: usize,
) -> Result<()> {
    let mut entries = history.lock().map_err(poisoned)?;
    entries.extend(anomalies);
    while entries.len() > limit {
        entries.pop_front();
    }
    Ok(())
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, meter_id: &str, anomalies: Vec<GpsAnomaly>, limit: usize) -> Result<()> {
        if anomalies.is_empty() {
            return Ok(());
        }

        {
            let meters = self.meters.read().map_err(poisoned)?;
            if let Some(history) = meters.get(meter_id) {
                return push_bounded(history, anomalies, limit);
            }
        }

        let mut meters = self.meters.write().map_err(poisoned)?;
        let history = meters.entry(meter_id.to_string()).or_default();
        push_bounded(history, anomalies, limit)
    }

    async fn history(&self, meter_id: &str) -> Result<Vec<GpsAnomaly>> {
        let meters = self.meters.read().map_err(poisoned)?;
        match meters.get(meter_id) {
            Some(history) => Ok(history.lock().map_err(poisoned)?.iter().cloned().collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn all(&self) -> Result<HashMap<String, Vec<GpsAnomaly>>> {
        let meters = self.meters.read().map_err(poisoned)?;
        let mut snapshot = HashMap::with_capacity(meters.len());
        for (meter_id, history) in meters.iter() {
            let entries = history.lock().map_err(poisoned)?;
            snapshot.insert(meter_id.clone(), entries.iter().cloned().collect());
        }
        Ok(snapshot)
    }

    async fn remove_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut meters = self.meters.write().map_err(poisoned)?;
        let mut removed = 0;
        let mut emptied = Vec::new();

        for (meter_id, history) in meters.iter() {
            let mut entries = history.lock().map_err(poisoned)?;
            let before = entries.len();
            entries.retain(|anomaly| anomaly.detected_at >= cutoff);
            removed += before - entries.len();
            if entries.is_empty() {
                emptied.push(meter_id.clone());
            }
        }

        for meter_id in emptied {
            meters.remove(&meter_id);
        }

        Ok(removed)
    }
}
