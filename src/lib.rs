//! Recrawl: an incremental, change-detecting crawler
//!
//! This crate periodically re-crawls a single seed page, follows the article
//! links it finds, and downloads only the pages whose freshness signal changed
//! since the previous cycle. What has been seen is kept in SQLite so a restart
//! resumes incrementally.

pub mod api;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Recrawl operations
#[derive(Debug, Error)]
pub enum RecrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use cache::{ChangeCache, MemoryCache};
pub use config::Config;
pub use crawler::{Coordinator, Scheduler};
pub use storage::{CrawlRecord, SqliteStorage};
