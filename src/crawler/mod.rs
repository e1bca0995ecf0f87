//! Crawler module for relay discovery
//!
//! This module contains the core crawling logic, including:
//! - NIP-11 information document fetching
//! - The relay-list websocket subscription
//! - Per-relay crawl tasks and the facts derived from them
//! - The shared frontier and visited set
//! - Runners and the manager coordinating them

mod client;
mod facts;
mod fetcher;
mod frontier;
mod manager;
mod peer_list;
mod task;
mod worker;

pub use client::{NetworkRelayClient, Probe, RelayClient};
pub use facts::{
    detected_statements, neighbour_statements, nip_statements, relay_statements,
    user_statements, SEEDED_NIPS,
};
pub use fetcher::{build_http_client, fetch_info_document, MAX_INFO_DOCUMENT_BYTES, NOSTR_JSON};
pub use frontier::{Frontier, VisitedSet};
pub use manager::{CrawlReport, Manager};
pub use peer_list::{fetch_peer_list, PeerList, PeerListConfig, Termination, SUBSCRIPTION_ID};
pub use task::{RelayTask, UNKNOWN_SOFTWARE};
pub use worker::{CrawlCounters, CrawlPolicy, Worker, WorkerStatus};

use crate::config::Config;
use crate::storage::GraphStore;
use crate::MinerError;
use std::sync::Arc;

/// Runs a complete crawl against the network
///
/// Builds the network probe from `config.probe` and crawls from the configured seeds.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - Graph collaborator receiving every fact
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(MinerError)` - Crawl failed
pub async fn crawl(config: &Config, store: Arc<dyn GraphStore>) -> Result<CrawlReport, MinerError> {
    let probe = Probe::network(&config.probe)?;
    let manager = Manager::new(config.crawler.clone(), store, probe);
    manager.run(&config.seeds.relays).await
}
