//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with user agent and timeouts
//! - HEAD requests that read a link's `Last-Modified` header
//! - GET requests for page content
//! - Error classification and content-hash freshness signals

use crate::config::CrawlerConfig;
use reqwest::{header::LAST_MODIFIED, redirect::Policy, Client};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Network failures, all of which are treated as transient
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects or redirect loop")]
    Redirect,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_connect() {
            FetchError::Connect(error.to_string())
        } else if error.is_redirect() {
            FetchError::Redirect
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Other(error.to_string())
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Every request made through the client carries the configured timeout, so
/// a timeout surfaces as [`FetchError::Timeout`] and is retried like any
/// other failure.
///
/// # Example
///
/// ```no_run
/// use recrawl::config::load_config;
/// use recrawl::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("recrawl.toml")).unwrap();
/// let client = build_http_client(&config.crawler).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_millis(config.request_timeout_ms);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reads a link's `Last-Modified` header with a HEAD request
///
/// # Returns
///
/// * `Ok(Some(String))` - The header value
/// * `Ok(None)` - The response succeeded but carried no usable header
/// * `Err(FetchError)` - The request failed or returned an error status
pub async fn fetch_last_modified(client: &Client, url: &str) -> Result<Option<String>, FetchError> {
    let response = client.head(url).send().await?.error_for_status()?;

    let signal = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(signal)
}

/// Fetches a page body with a GET request
///
/// Non-success statuses are errors.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Freshness signal derived from page content: hex SHA-256 of the body
pub fn content_signal(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}
