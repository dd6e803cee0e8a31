//! Periodic maintenance run by the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Apply the retention policy once, returning the number of anomalies removed
pub async fn run_history_cleanup(state: &AppState) -> usize {
    match state.evaluator.clean_old_history(state.retention_days).await {
        Ok(removed) => removed,
        Err(e) => {
            tracing::error!(error = %e, "Scheduled history cleanup failed");
            0
        }
    }
}

/// Drop expired geocoding cache entries once
pub fn run_cache_sweep(state: &AppState) -> usize {
    let removed = state.geocoder.sweep_expired();
    tracing::debug!(removed, "Geocode cache sweep");
    removed
}

/// Start the retention and cache sweep loops
///
/// The first run of each happens one full period after startup.
pub fn spawn_maintenance(state: Arc<AppState>, config: &ApiConfig) -> Vec<JoinHandle<()>> {
    let cleanup_state = state.clone();
    let cleanup = spawn_every(config.cleanup_interval, move || {
        let state = cleanup_state.clone();
        async move {
            run_history_cleanup(&state).await;
        }
    });

    let sweep = spawn_every(config.cache_sweep_interval, move || {
        run_cache_sweep(&state);
        async {}
    });

    vec![cleanup, sweep]
}

fn spawn_every<F, Fut>(period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            job().await;
        }
    })
}
