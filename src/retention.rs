// src/retention.rs
//! # Retention Sweeper
//! Deletes persisted rows past the retention age. One `sweep` entry point
//! shared by the background schedule and the manual maintenance endpoint.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use metrics::{counter, gauge};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::store::TrendStore;

pub struct RetentionSweeper {
    store: Arc<dyn TrendStore>,
    clock: Arc<dyn Clock>,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn TrendStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Delete rows older than `max_age_days`; returns the exact row count.
    /// A non-positive age is a no-op, never a full wipe.
    pub async fn sweep(&self, max_age_days: i64) -> Result<u64> {
        if max_age_days <= 0 {
            return Ok(0);
        }
        let cutoff = self.clock.now() - Duration::days(max_age_days);
        let deleted = self.store.delete_older_than(cutoff).await?;

        counter!("retention_rows_deleted_total").increment(deleted);
        gauge!("retention_last_sweep_ts").set(self.clock.now().timestamp() as f64);
        tracing::info!(deleted, max_age_days, "retention sweep done");
        Ok(deleted)
    }
}

/// Spawn the periodic sweep, decoupled from request-serving tasks.
/// `interval_secs == 0` disables scheduling entirely.
pub fn spawn_sweeper(
    sweeper: Arc<RetentionSweeper>,
    max_age_days: i64,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("retention scheduler disabled");
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        // First tick fires immediately; skip it so startup isn't a sweep.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sweeper.sweep(max_age_days).await {
                Ok(deleted) => {
                    tracing::info!(target: "retention", deleted, "scheduled sweep tick");
                }
                Err(e) => {
                    // Reported, never fatal to the serving path.
                    tracing::warn!(target: "retention", error = ?e, "scheduled sweep failed");
                    counter!("retention_sweep_errors_total").increment(1);
                }
            }
        }
    }))
}
