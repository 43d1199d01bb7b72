//! Crawler module for fetching and change detection
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and freshness signals
//! - Article link extraction from the seed page
//! - Bounded retries for network operations
//! - The per-link worker pipeline
//! - Cycle coordination and the scheduler loop

mod coordinator;
mod fetcher;
mod parser;
mod retry;
mod scheduler;
mod worker;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, content_signal, fetch_last_modified, fetch_text, FetchError};
pub use parser::extract_article_links;
pub use retry::RetryPolicy;
pub use scheduler::Scheduler;
pub use worker::{LinkOutcome, LinkWorker};
