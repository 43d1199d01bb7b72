use crate::config::types::{Config, Overrides};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use recrawl::config::load_config;
///
/// let config = load_config(Path::new("recrawl.toml")).unwrap();
/// println!("Seed: {}", config.crawler.seed_link);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads a configuration file and applies command-line overrides
///
/// Validation runs after the overrides so a bad flag is rejected the same
/// way a bad file value is.
pub fn load_config_with_overrides(
    path: &Path,
    overrides: &Overrides,
) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_overrides(overrides);
    validate(&config)?;
    Ok(config)
}
