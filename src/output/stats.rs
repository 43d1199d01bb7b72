//! Cycle and store statistics
//!
//! This module provides the per-cycle report produced by the coordinator and
//! the store summary shown by `recrawl --stats`.

use crate::storage::{Storage, StorageResult};
use chrono::{TimeZone, Utc};

/// Counters collected during one crawl cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Distinct links extracted from the seed page
    pub discovered: usize,

    /// Links placed on the task queue
    pub enqueued: usize,

    /// Links left out because the per-cycle cap was reached
    pub dropped_by_cap: usize,

    /// Links whose freshness check failed or returned no signal
    pub no_signal: usize,

    /// Links whose signal matched the cache
    pub unchanged: usize,

    /// Changed links whose content could not be fetched
    pub fetch_failed: usize,

    /// Changed links whose content was written to disk
    pub saved: usize,

    /// Changed links whose content could not be written
    pub save_failed: usize,

    /// Records written to the store at the end of the cycle
    pub flushed: usize,

    /// Whether the end-of-cycle flush failed
    pub flush_failed: bool,

    /// Whether the cycle stopped early because of a shutdown request
    pub interrupted: bool,
}

impl CycleReport {
    /// Links that went through the whole pipeline, whatever the outcome
    pub fn processed(&self) -> usize {
        self.no_signal + self.unchanged + self.fetch_failed + self.saved + self.save_failed
    }

    /// Logs a one-line summary of the cycle
    pub fn log_summary(&self) {
        tracing::info!(
            "Cycle finished: {} discovered, {} enqueued ({} over cap), {} saved, {} unchanged, \
             {} without signal, {} fetch failures, {} save failures, {} records flushed{}",
            self.discovered,
            self.enqueued,
            self.dropped_by_cap,
            self.saved,
            self.unchanged,
            self.no_signal,
            self.fetch_failed,
            self.save_failed,
            self.flushed,
            if self.interrupted { " (interrupted)" } else { "" }
        );
    }
}

/// Summary of what the store currently holds
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Number of link records
    pub total_records: u64,

    /// Start time of the last cycle (epoch seconds)
    pub last_cycle_started: i64,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        total_records: storage.count_records()?,
        last_cycle_started: storage.cycle_timestamp()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Recrawl Statistics ===\n");
    println!("  Tracked links: {}", stats.total_records);

    if stats.last_cycle_started == 0 {
        println!("  Last cycle started: never");
    } else {
        match Utc.timestamp_opt(stats.last_cycle_started, 0).single() {
            Some(started) => println!("  Last cycle started: {}", started.to_rfc3339()),
            None => println!("  Last cycle started: {} (epoch)", stats.last_cycle_started),
        }
    }
}
