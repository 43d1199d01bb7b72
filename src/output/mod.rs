//! Output module: where crawl results end up
//!
//! This module handles:
//! - Writing downloaded pages to the content directory
//! - Per-cycle reports and store statistics

mod files;
pub mod stats;

pub use files::FileSink;
pub use stats::{load_statistics, print_statistics, CycleReport, StoreStatistics};
