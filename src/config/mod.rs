//! Configuration module for Recrawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and layering command-line overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use recrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("recrawl.toml")).unwrap();
//! println!("Workers: {}", config.crawler.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FreshnessStrategy, OutputConfig, Overrides, RetryConfig, StoreConfig,
    SyncConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_config_with_overrides};
pub use validation::validate;
