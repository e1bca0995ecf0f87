//! Configuration module for Relay Miner
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and applying the `MAX_RECURSION`, `MAX_RUNNERS`, `PUSH_USERS`, `RELAY_SEEDS` and
//! `GRAPH_DB_PATH` environment overrides.
//!
//! # Example
//!
//! ```no_run
//! use relay_miner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("relay-miner.toml")).unwrap();
//! println!("Crawler will use {} runners", config.crawler.max_runners);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ProbeConfig, SeedConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_effective_config,
    ENV_GRAPH_DB_PATH, ENV_MAX_RECURSION, ENV_MAX_RUNNERS, ENV_PUSH_USERS, ENV_RELAY_SEEDS,
};
pub use validation::validate;
