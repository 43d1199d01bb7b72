use crate::config::types::{Config, CrawlerConfig, RetryConfig, SyncConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_sync_config(&config.sync)?;

    if config.output.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.store.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&config.seed_link).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed link '{}': {}", config.seed_link, e))
    })?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed link '{}' must use http or https",
            config.seed_link
        )));
    }

    validate_link_prefix(&config.link_prefix)?;

    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    if config.max_links_per_cycle < 1 {
        return Err(ConfigError::Validation(format!(
            "max_links_per_cycle must be >= 1, got {}",
            config.max_links_per_cycle
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !(config.backoff_multiplier >= 1.0) {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    Ok(())
}

fn validate_sync_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.cycle_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "cycle_interval_secs must be >= 1".to_string(),
        ));
    }

    if config.poll_interval_secs < 1 {
        return Err(ConfigError::Validation(
            "poll_interval_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates an article path prefix such as `/wiki/`
fn validate_link_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "link_prefix must start and end with '/', got '{}'",
            prefix
        )));
    }

    if prefix.contains("//") {
        return Err(ConfigError::Validation(format!(
            "link_prefix cannot contain empty segments, got '{}'",
            prefix
        )));
    }

    Ok(())
}
