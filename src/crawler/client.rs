//! Network access used by a relay task
//!
//! `RelayClient` is the seam between crawl logic and the network: production code
//! uses `NetworkRelayClient`, tests substitute scripted relays.

use crate::address::{Resolver, SystemResolver};
use crate::config::ProbeConfig;
use crate::crawler::fetcher::{build_http_client, fetch_info_document};
use crate::crawler::peer_list::{fetch_peer_list, PeerList, PeerListConfig};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Talks to a relay
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Fetches the raw NIP-11 information document from an `http(s)://` URL
    async fn fetch_info(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Collects relay-list events from a `ws(s)://` URL
    async fn fetch_peer_list(&self, url: &str) -> Result<PeerList, FetchError>;
}

/// `RelayClient` speaking HTTP and websockets
pub struct NetworkRelayClient {
    http: Client,
    peer_list: PeerListConfig,
}

impl NetworkRelayClient {
    /// Builds a client from the probe configuration
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(config)?,
            peer_list: PeerListConfig::from(config),
        })
    }
}

#[async_trait]
impl RelayClient for NetworkRelayClient {
    async fn fetch_info(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        fetch_info_document(&self.http, url).await
    }

    async fn fetch_peer_list(&self, url: &str) -> Result<PeerList, FetchError> {
        fetch_peer_list(url, &self.peer_list).await
    }
}

/// Everything a relay task needs to reach the outside world
#[derive(Clone)]
pub struct Probe {
    pub resolver: Arc<dyn Resolver>,
    pub client: Arc<dyn RelayClient>,
}

impl Probe {
    pub fn new(resolver: Arc<dyn Resolver>, client: Arc<dyn RelayClient>) -> Self {
        Self { resolver, client }
    }

    /// Probe using system DNS and real network connections
    pub fn network(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            Arc::new(SystemResolver),
            Arc::new(NetworkRelayClient::new(config)?),
        ))
    }
}
