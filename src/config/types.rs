use serde::Deserialize;

/// Main configuration structure for Recrawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    pub output: OutputConfig,
    pub store: StoreConfig,
}

/// How a link's freshness signal is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FreshnessStrategy {
    /// `Last-Modified` header from a HEAD request
    LastModified,
    /// SHA-256 digest of the page body
    ContentHash,
}

impl Default for FreshnessStrategy {
    fn default() -> Self {
        Self::LastModified
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page whose links are re-crawled every cycle
    #[serde(rename = "seed-link")]
    pub seed_link: String,

    /// Path prefix that article links must live under
    #[serde(rename = "link-prefix", default = "default_link_prefix")]
    pub link_prefix: String,

    /// Number of concurrent link workers
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: u32,

    /// Maximum number of links enqueued per cycle
    #[serde(rename = "max-links-per-cycle", default = "default_max_links")]
    pub max_links_per_cycle: u32,

    /// Timeout applied to every HTTP request (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub freshness: FreshnessStrategy,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Retry behavior for seed and content fetches
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "delay-ms", default = "default_retry_delay")]
    pub delay_ms: u64,

    /// Factor applied to the delay after each failed attempt; 1.0 keeps it fixed
    #[serde(rename = "backoff-multiplier", default = "default_backoff")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay(),
            backoff_multiplier: default_backoff(),
        }
    }
}

/// Scheduler timing
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Minimum time between the starts of two cycles (seconds)
    #[serde(rename = "cycle-interval-secs", default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Sleep between two eligibility checks (seconds)
    #[serde(rename = "poll-interval-secs", default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that downloaded pages are written to
    pub directory: String,
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Values given on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed_link: Option<String>,
    pub directory: Option<String>,
    pub max_links_per_cycle: Option<u32>,
    pub max_workers: Option<u32>,
}

impl Config {
    /// Applies command-line overrides on top of the loaded file
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(link) = &overrides.seed_link {
            self.crawler.seed_link = link.clone();
        }
        if let Some(directory) = &overrides.directory {
            self.output.directory = directory.clone();
        }
        if let Some(cap) = overrides.max_links_per_cycle {
            self.crawler.max_links_per_cycle = cap;
        }
        if let Some(workers) = overrides.max_workers {
            self.crawler.max_workers = workers;
        }
    }
}

fn default_link_prefix() -> String {
    "/wiki/".to_string()
}

fn default_max_workers() -> u32 {
    10
}

fn default_max_links() -> u32 {
    1000
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_user_agent() -> String {
    format!("recrawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2000
}

fn default_backoff() -> f64 {
    1.0
}

fn default_cycle_interval() -> u64 {
    3600
}

fn default_poll_interval() -> u64 {
    60
}
