//! Crawl cycle coordinator
//!
//! One cycle:
//! - Fetches the seed page and extracts article links
//! - Enqueues links up to the per-cycle cap
//! - Runs a pool of workers that drain the queue
//! - Collects the records of downloaded pages
//! - Flushes them to the store as a single batch

use crate::cache::ChangeCache;
use crate::config::Config;
use crate::crawler::fetcher::fetch_text;
use crate::crawler::parser::extract_article_links;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::worker::{LinkOutcome, LinkWorker};
use crate::output::{CycleReport, FileSink};
use crate::storage::{lock, CrawlRecord, SharedStorage, Storage, StorageResult};
use crate::RecrawlError;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Runs crawl cycles against a single seed page
pub struct Coordinator {
    seed: Url,
    link_prefix: String,
    max_workers: usize,
    max_links_per_cycle: usize,
    client: Client,
    retry: RetryPolicy,
    worker: Arc<LinkWorker>,
    storage: SharedStorage,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Validated crawler configuration
    /// * `client` - HTTP client shared by every request of every cycle
    /// * `cache` - Change cache consulted before each content fetch
    /// * `storage` - Store that receives the records at the end of a cycle
    pub fn new(
        config: &Config,
        client: Client,
        cache: Arc<dyn ChangeCache>,
        storage: SharedStorage,
    ) -> Result<Self, RecrawlError> {
        let seed = Url::parse(&config.crawler.seed_link)?;
        let retry = RetryPolicy::from_config(&config.retry);
        let sink = FileSink::new(&config.output.directory);

        let worker = LinkWorker::new(
            client.clone(),
            cache,
            sink,
            retry.clone(),
            config.crawler.freshness,
        );

        Ok(Self {
            seed,
            link_prefix: config.crawler.link_prefix.clone(),
            max_workers: config.crawler.max_workers.max(1) as usize,
            max_links_per_cycle: config.crawler.max_links_per_cycle as usize,
            client,
            retry,
            worker: Arc::new(worker),
            storage,
        })
    }

    /// Runs one complete cycle
    ///
    /// Never fails as a whole: every problem is logged and counted in the
    /// returned report. When `shutdown` fires, workers stop taking new links,
    /// in-flight links finish, and whatever was collected is still flushed.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();
        tracing::info!("Starting crawl cycle from {}", self.seed);

        let seed_content = match self
            .retry
            .run(self.seed.as_str(), || fetch_text(&self.client, self.seed.as_str()))
            .await
        {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to fetch seed page {}: {}", self.seed, e);
                report.log_summary();
                return report;
            }
        };

        let links = extract_article_links(&seed_content, &self.seed, &self.link_prefix);
        report.discovered = links.len();
        tracing::info!("Found {} links on seed page", links.len());

        let capacity = links.len().min(self.max_links_per_cycle).max(1);
        let (queue_tx, queue_rx) = mpsc::channel::<String>(capacity);
        for link in links {
            if report.enqueued >= self.max_links_per_cycle {
                report.dropped_by_cap += 1;
                continue;
            }
            if queue_tx.try_send(link).is_err() {
                report.dropped_by_cap += 1;
                continue;
            }
            report.enqueued += 1;
        }
        drop(queue_tx);

        if report.dropped_by_cap > 0 {
            tracing::info!(
                "Link cap of {} reached, {} links left for a later cycle",
                self.max_links_per_cycle,
                report.dropped_by_cap
            );
        }

        let records = self.drain_queue(queue_rx, shutdown, &mut report).await;

        if shutdown.is_cancelled() && report.processed() < report.enqueued {
            report.interrupted = true;
            tracing::info!(
                "Cycle interrupted after {} of {} links",
                report.processed(),
                report.enqueued
            );
        }

        if !records.is_empty() {
            match self.flush(&records) {
                Ok(count) => {
                    report.flushed = count;
                    tracing::debug!("Flushed {} records", count);
                }
                Err(e) => {
                    report.flush_failed = true;
                    tracing::error!("Failed to flush {} records: {}", records.len(), e);
                }
            }
        }

        report.log_summary();
        report
    }

    /// Runs the worker pool until the queue is empty or shutdown is requested
    ///
    /// Workers send their outcomes back over a channel; this task is the only
    /// one that touches the collected records.
    async fn drain_queue(
        &self,
        queue: mpsc::Receiver<String>,
        shutdown: &CancellationToken,
        report: &mut CycleReport,
    ) -> Vec<CrawlRecord> {
        let queue = Arc::new(Mutex::new(queue));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<LinkOutcome>();
        let worker_count = self.max_workers.min(report.enqueued.max(1));

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let queue = Arc::clone(&queue);
            let result_tx = result_tx.clone();
            let worker = Arc::clone(&self.worker);
            let shutdown = shutdown.clone();

            workers.spawn(async move {
                loop {
                    let next = {
                        let mut queue = queue.lock().await;
                        tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => None,
                            link = queue.recv() => link,
                        }
                    };

                    let Some(link) = next else {
                        break;
                    };

                    let outcome = worker.process(&link).await;
                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
                tracing::trace!("Worker {} finished", id);
            });
        }
        drop(result_tx);

        let mut records = Vec::new();
        while let Some(outcome) = result_rx.recv().await {
            tally(report, &outcome);
            if let Some(record) = outcome.into_record() {
                records.push(record);
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        records
    }

    fn flush(&self, records: &[CrawlRecord]) -> StorageResult<usize> {
        let mut storage = lock(&self.storage)?;
        storage.upsert_records(records)
    }
}

fn tally(report: &mut CycleReport, outcome: &LinkOutcome) {
    match outcome {
        LinkOutcome::NoSignal => report.no_signal += 1,
        LinkOutcome::Unchanged => report.unchanged += 1,
        LinkOutcome::FetchFailed => report.fetch_failed += 1,
        LinkOutcome::Saved(_) => report.saved += 1,
        LinkOutcome::SaveFailed(_) => report.save_failed += 1,
    }
}
