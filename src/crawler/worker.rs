//! Per-link pipeline run by each worker task
//!
//! A link goes through: freshness signal, cache gate, content fetch, save.
//! Failures stay local to the link and are reported as a [`LinkOutcome`].

use crate::cache::ChangeCache;
use crate::config::FreshnessStrategy;
use crate::crawler::fetcher::{content_signal, fetch_last_modified, fetch_text};
use crate::crawler::retry::RetryPolicy;
use crate::output::FileSink;
use crate::storage::CrawlRecord;
use reqwest::Client;
use std::sync::Arc;

/// Result of processing a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// No freshness signal could be obtained
    NoSignal,

    /// The signal matched the cache; nothing was downloaded
    Unchanged,

    /// The link changed but its content could not be fetched
    FetchFailed,

    /// Content was written to disk
    Saved(CrawlRecord),

    /// Content was fetched but writing it failed
    SaveFailed(CrawlRecord),
}

impl LinkOutcome {
    /// The record to persist at the end of the cycle, if any
    pub fn into_record(self) -> Option<CrawlRecord> {
        match self {
            LinkOutcome::Saved(record) | LinkOutcome::SaveFailed(record) => Some(record),
            _ => None,
        }
    }
}

/// Everything a worker needs to process links
pub struct LinkWorker {
    client: Client,
    cache: Arc<dyn ChangeCache>,
    sink: FileSink,
    retry: RetryPolicy,
    freshness: FreshnessStrategy,
}

impl LinkWorker {
    pub fn new(
        client: Client,
        cache: Arc<dyn ChangeCache>,
        sink: FileSink,
        retry: RetryPolicy,
        freshness: FreshnessStrategy,
    ) -> Self {
        Self {
            client,
            cache,
            sink,
            retry,
            freshness,
        }
    }

    /// Runs the full pipeline for one link
    pub async fn process(&self, link: &str) -> LinkOutcome {
        match self.freshness {
            FreshnessStrategy::LastModified => self.process_by_header(link).await,
            FreshnessStrategy::ContentHash => self.process_by_hash(link).await,
        }
    }

    async fn process_by_header(&self, link: &str) -> LinkOutcome {
        let signal = match fetch_last_modified(&self.client, link).await {
            Ok(Some(signal)) => signal,
            Ok(None) => {
                tracing::debug!("No Last-Modified header for {}", link);
                return LinkOutcome::NoSignal;
            }
            Err(e) => {
                tracing::warn!("HEAD request failed for {}: {}", link, e);
                return LinkOutcome::NoSignal;
            }
        };

        if !self.has_changed(link, &signal) {
            tracing::debug!("Unchanged: {}", link);
            return LinkOutcome::Unchanged;
        }

        let content = match self.fetch_content(link).await {
            Some(content) => content,
            None => return LinkOutcome::FetchFailed,
        };

        self.save(link, signal, &content).await
    }

    async fn process_by_hash(&self, link: &str) -> LinkOutcome {
        let content = match self.fetch_content(link).await {
            Some(content) => content,
            None => return LinkOutcome::FetchFailed,
        };

        let signal = content_signal(&content);
        if !self.has_changed(link, &signal) {
            tracing::debug!("Unchanged: {}", link);
            return LinkOutcome::Unchanged;
        }

        self.save(link, signal, &content).await
    }

    /// Cache gate; an unavailable cache lets the link through
    fn has_changed(&self, link: &str, signal: &str) -> bool {
        match self.cache.should_process(link, signal) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!("Cache check failed for {}, treating as changed: {}", link, e);
                true
            }
        }
    }

    async fn fetch_content(&self, link: &str) -> Option<String> {
        match self
            .retry
            .run(link, || fetch_text(&self.client, link))
            .await
        {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", link, e);
                None
            }
        }
    }

    async fn save(&self, link: &str, signal: String, content: &str) -> LinkOutcome {
        let record = CrawlRecord {
            link: link.to_string(),
            signal,
        };

        match self.sink.save(link, content).await {
            Ok(path) => {
                tracing::debug!("Saved {} to {}", link, path.display());
                LinkOutcome::Saved(record)
            }
            Err(e) => {
                tracing::warn!("Failed to save {}: {}", link, e);
                LinkOutcome::SaveFailed(record)
            }
        }
    }
}
