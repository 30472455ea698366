//! Passive retention sweep for verification records.
//!
//! Expiry is enforced lazily at verification time; this sweep only reclaims
//! storage. It runs decoupled from request handling, either on demand via
//! `sweep_once` or on an interval via `spawn`.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tracing::{error, info};

use crate::errors::DomainResult;
use crate::repositories::RecordStore;

/// Configuration for the retention sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often the spawned sweep runs
    pub interval_seconds: u64,
    /// Hours a record is kept after creation, independent of code expiry
    pub retention_hours: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,
            retention_hours: 24,
        }
    }
}

/// Removes verification records past their retention window.
pub struct RetentionSweeper<R: RecordStore + 'static> {
    store: Arc<R>,
    config: SweepConfig,
}

impl<R: RecordStore> RetentionSweeper<R> {
    /// Create a new sweeper over the given store
    pub fn new(store: Arc<R>, config: SweepConfig) -> Self {
        Self { store, config }
    }

    /// Run a single sweep cycle, returning the number of purged records.
    pub async fn sweep_once(&self) -> DomainResult<usize> {
        let cutoff = Utc::now() - Duration::hours(self.config.retention_hours);
        let purged = self.store.purge_older_than(cutoff).await?;
        if purged > 0 {
            info!(purged, event = "retention_sweep", "Purged aged verification records");
        }
        Ok(purged)
    }

    /// Spawn the periodic sweep on a detached task.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let interval = StdDuration::from_secs(self.config.interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so startup stays cheap
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once().await {
                    error!(error = %e, event = "retention_sweep_failed", "Retention sweep failed");
                }
            }
        })
    }
}
