use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Relay Miner
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub seeds: SeedConfig,
}

/// Crawl scheduling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Hops a seed may expand; 0 probes the seeds without expanding
    #[serde(rename = "max-recursion", default = "default_max_recursion")]
    pub max_recursion: u32,

    /// Number of concurrent runners
    #[serde(rename = "max-runners", default = "default_max_runners")]
    pub max_runners: usize,

    /// Record relay-list authors and the relays they use
    #[serde(rename = "push-users", default)]
    pub push_users: bool,

    /// How long an idle runner sleeps before polling the frontier again (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl CrawlerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_recursion: default_max_recursion(),
            max_runners: default_max_runners(),
            push_users: false,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Per-relay network probe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// User-Agent sent with information document requests
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Overall timeout of the information document request (milliseconds)
    #[serde(rename = "info-timeout-ms", default = "default_info_timeout_ms")]
    pub info_timeout_ms: u64,

    /// Connect timeout for both HTTP and websocket connections (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Wall-clock limit of a relay-list subscription (seconds)
    #[serde(
        rename = "peer-list-timeout-secs",
        default = "default_peer_list_timeout_secs"
    )]
    pub peer_list_timeout_secs: u64,

    /// Time allowed for the relay to acknowledge our close frame (milliseconds)
    #[serde(rename = "close-grace-ms", default = "default_close_grace_ms")]
    pub close_grace_ms: u64,

    /// Maximum number of relay-list events requested
    #[serde(rename = "peer-list-limit", default = "default_peer_list_limit")]
    pub peer_list_limit: u32,
}

impl ProbeConfig {
    pub fn info_timeout(&self) -> Duration {
        Duration::from_millis(self.info_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn peer_list_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_list_timeout_secs)
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            info_timeout_ms: default_info_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            peer_list_timeout_secs: default_peer_list_timeout_secs(),
            close_grace_ms: default_close_grace_ms(),
            peer_list_limit: default_peer_list_limit(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite graph database
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Relays the crawl starts from
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_relays")]
    pub relays: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            relays: default_seed_relays(),
        }
    }
}

fn default_max_recursion() -> u32 {
    2
}

fn default_max_runners() -> usize {
    8
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("relay-miner/{}", env!("CARGO_PKG_VERSION"))
}

fn default_info_timeout_ms() -> u64 {
    3000
}

fn default_connect_timeout_ms() -> u64 {
    1000
}

fn default_peer_list_timeout_secs() -> u64 {
    30
}

fn default_close_grace_ms() -> u64 {
    1000
}

fn default_peer_list_limit() -> u32 {
    10000
}

fn default_database_path() -> String {
    "./relay-graph.db".to_string()
}

fn default_seed_relays() -> Vec<String> {
    vec![
        "wss://relay.artiostr.ch/".to_string(),
        "wss://relay.artio.inf.unibe.ch/".to_string(),
    ]
}
