//! Scheduler loop: decides when a crawl cycle runs
//!
//! Every poll the scheduler asks the store whether a cycle is due. The store
//! claims the cycle atomically, so several processes sharing one database
//! never start the same cycle twice. Cycles are strictly sequential.

use crate::cache::{warm_start, ChangeCache};
use crate::config::SyncConfig;
use crate::crawler::coordinator::Coordinator;
use crate::output::CycleReport;
use crate::storage::{lock, SharedStorage, Storage, StorageResult};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodically runs the coordinator when the cycle interval has elapsed
pub struct Scheduler {
    coordinator: Coordinator,
    cache: Arc<dyn ChangeCache>,
    storage: SharedStorage,
    cycle_interval_secs: u64,
    poll_interval: Duration,
}

impl Scheduler {
    /// Creates a scheduler
    ///
    /// `cache` and `storage` must be the same handles the coordinator uses.
    pub fn new(
        coordinator: Coordinator,
        cache: Arc<dyn ChangeCache>,
        storage: SharedStorage,
        sync: &SyncConfig,
    ) -> Self {
        Self {
            coordinator,
            cache,
            storage,
            cycle_interval_secs: sync.cycle_interval_secs,
            poll_interval: Duration::from_secs(sync.poll_interval_secs.max(1)),
        }
    }

    /// Checks eligibility once and runs a cycle if one is due
    ///
    /// Returns the cycle report, or `None` when no cycle ran. A store that
    /// cannot answer counts as "not due".
    pub async fn tick(&self, shutdown: &CancellationToken) -> Option<CycleReport> {
        match self.claim_cycle() {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("No cycle due yet");
                return None;
            }
            Err(e) => {
                tracing::error!("Could not check cycle timestamp, skipping: {}", e);
                return None;
            }
        }

        self.warm_cache();
        Some(self.coordinator.run_cycle(shutdown).await)
    }

    /// Runs until `shutdown` fires
    ///
    /// A cycle in progress when shutdown is requested drains its in-flight
    /// links and flushes before the loop exits.
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!(
            "Scheduler started: cycle every {}s, polling every {:?}",
            self.cycle_interval_secs,
            self.poll_interval
        );

        while !shutdown.is_cancelled() {
            self.tick(&shutdown).await;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Scheduler stopped");
    }

    fn claim_cycle(&self) -> StorageResult<bool> {
        let mut storage = lock(&self.storage)?;
        storage.is_cycle_due(self.cycle_interval_secs)
    }

    /// Refills an empty cache from the store
    fn warm_cache(&self) {
        match self.cache.is_empty() {
            Ok(true) => {
                if let Err(e) = warm_start(self.cache.as_ref(), &self.storage) {
                    tracing::warn!("Warm start failed, continuing with a cold cache: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not inspect cache: {}", e),
        }
    }
}
