use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `crawler.max-recursion`
pub const ENV_MAX_RECURSION: &str = "MAX_RECURSION";
/// Environment variable overriding `crawler.max-runners`
pub const ENV_MAX_RUNNERS: &str = "MAX_RUNNERS";
/// Environment variable overriding `crawler.push-users`
pub const ENV_PUSH_USERS: &str = "PUSH_USERS";
/// Environment variable overriding `seeds.relays` (comma separated)
pub const ENV_RELAY_SEEDS: &str = "RELAY_SEEDS";
/// Environment variable overriding `output.database-path`
pub const ENV_GRAPH_DB_PATH: &str = "GRAPH_DB_PATH";

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
/// use relay_miner::config::load_config;
///
/// let config = load_config(Path::new("relay-miner.toml")).unwrap();
/// println!("Max recursion: {}", config.crawler.max_recursion);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Applies environment overrides to a configuration
///
/// `lookup` returns the value of a variable, if set. Empty values are ignored.
///
/// # Returns
///
/// * `Ok(())` - All present overrides were applied
/// * `Err(ConfigError::Env)` - A variable was set to a value that does not parse
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(value) = var(ENV_MAX_RECURSION) {
        config.crawler.max_recursion = value.parse().map_err(|_| env_error(ENV_MAX_RECURSION, &value))?;
    }

    if let Some(value) = var(ENV_MAX_RUNNERS) {
        config.crawler.max_runners = value.parse().map_err(|_| env_error(ENV_MAX_RUNNERS, &value))?;
    }

    if let Some(value) = var(ENV_PUSH_USERS) {
        config.crawler.push_users = parse_bool(&value).ok_or_else(|| env_error(ENV_PUSH_USERS, &value))?;
    }

    if let Some(value) = var(ENV_RELAY_SEEDS) {
        config.seeds.relays = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(value) = var(ENV_GRAPH_DB_PATH) {
        config.output.database_path = value;
    }

    Ok(())
}

/// Builds the effective configuration for a run
///
/// Reads the file when one is given (otherwise starts from defaults), applies
/// overrides from the process environment, and validates the result.
///
/// # Returns
///
/// * `Ok((Config, Option<String>))` - The configuration and the file hash, if a file was read
/// * `Err(ConfigError)` - Failed to load, override, or validate
pub fn load_effective_config(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            (config, Some(compute_config_hash(path)?))
        }
        None => (Config::default(), None),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;

    Ok((config, hash))
}

/// Accepts `1`/`0`, `t`/`f` and `true`/`false` in common casings
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn env_error(key: &str, value: &str) -> ConfigError {
    ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    }
}
