//! Relay Miner: a crawler for the Nostr relay network
//!
//! This crate walks the relay network from a set of seed relays, discovering neighbours
//! through NIP-65 relay-list events, screening every address against private and
//! anonymity-network ranges, fetching each relay's NIP-11 information document, and
//! recording relays, software, owners and IPs into a property graph.

pub mod address;
pub mod config;
pub mod crawler;
pub mod output;
pub mod protocol;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Relay Miner operations
#[derive(Debug, Error)]
pub enum MinerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Runner {id} stopped abnormally: {message}")]
    Worker { id: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for {key}: '{value}'")]
    Env { key: String, value: String },
}

/// Errors raised while talking to a relay
///
/// None of these are fatal to a crawl: the affected data source is simply
/// recorded as unknown for that relay.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Response from {url} exceeds {limit} bytes")]
    BodyTooLarge { url: String, limit: usize },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias for Relay Miner operations
pub type Result<T> = std::result::Result<T, MinerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use address::{clean_name, validate_address};
pub use config::Config;
pub use crawler::{Manager, RelayTask};
pub use state::{RejectReason, Validation};
