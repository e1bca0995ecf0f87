use crate::config::types::{Config, CrawlerConfig, OutputConfig, ProbeConfig, SeedConfig};
use crate::ConfigError;

/// Upper bound on concurrent runners
const MAX_RUNNERS_LIMIT: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_probe_config(&config.probe)?;
    validate_output_config(&config.output)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_recursion = 0 is valid: seeds are probed but never expanded

    if config.max_runners < 1 || config.max_runners > MAX_RUNNERS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-runners must be between 1 and {}, got {}",
            MAX_RUNNERS_LIMIT, config.max_runners
        )));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates probe configuration
fn validate_probe_config(config: &ProbeConfig) -> Result<(), ConfigError> {
    let timeouts = [
        ("info-timeout-ms", config.info_timeout_ms),
        ("connect-timeout-ms", config.connect_timeout_ms),
        ("peer-list-timeout-secs", config.peer_list_timeout_secs),
        ("close-grace-ms", config.close_grace_ms),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    if config.peer_list_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "peer-list-limit must be >= 1, got {}",
            config.peer_list_limit
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the seed list
///
/// Seeds are not screened here: a private or malformed seed is recorded as a
/// rejected relay by the crawl itself.
fn validate_seeds(seeds: &SeedConfig) -> Result<(), ConfigError> {
    if seeds.relays.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed relay is required".to_string(),
        ));
    }

    if let Some(position) = seeds.relays.iter().position(|s| s.trim().is_empty()) {
        return Err(ConfigError::InvalidUrl(format!(
            "seed relay #{} is empty",
            position + 1
        )));
    }

    Ok(())
}
