//! The crawl unit: one relay address and everything learned about it

use crate::address::{clean_name, info_document_url, resolve_host, validate_address, websocket_url, Resolver};
use crate::crawler::client::Probe;
use crate::protocol::{find_neighbours, Event, InfoDocument};
use crate::state::Validation;
use std::net::IpAddr;
use url::Url;

/// Software name recorded when a relay does not announce one
pub const UNKNOWN_SOFTWARE: &str = "N/A";

/// Crawl state of a single relay
///
/// A task is created for a seed or for a newly discovered neighbour, loaded by
/// exactly one runner, persisted and dropped.
#[derive(Debug, Clone)]
pub struct RelayTask {
    /// Address as it was referenced
    pub address: String,
    /// Deduplication and storage key (see [`clean_name`])
    pub normalized: String,
    pub validation: Validation,
    /// Parsed address, set once validation passes
    pub url: Option<Url>,
    pub resolved_ips: Vec<IpAddr>,
    pub info: Option<InfoDocument>,
    /// Response body of the information document, kept verbatim
    pub raw_info: Option<Vec<u8>>,
    /// Only fetched when `recursion_budget > 0`
    pub peer_events: Vec<Event>,
    /// Sorted, deduplicated neighbour addresses
    pub neighbors: Vec<String>,
    /// Peer events skipped for having the wrong kind
    pub non_conforming_events: usize,
    /// Normalized address of the relay that discovered this one
    pub discovered_by: Option<String>,
    pub recursion_budget: u32,
}

impl RelayTask {
    fn new(address: &str, discovered_by: Option<String>, recursion_budget: u32) -> Self {
        Self {
            address: address.trim().to_string(),
            normalized: clean_name(address),
            validation: Validation::Unchecked,
            url: None,
            resolved_ips: Vec::new(),
            info: None,
            raw_info: None,
            peer_events: Vec::new(),
            neighbors: Vec::new(),
            non_conforming_events: 0,
            discovered_by,
            recursion_budget,
        }
    }

    /// Creates a task for a seed relay
    pub fn seed(address: &str, recursion_budget: u32) -> Self {
        Self::new(address, None, recursion_budget)
    }

    /// Creates the task for a neighbour found on this relay
    ///
    /// Returns `None` when this task has no budget left to expand.
    pub fn child(&self, address: &str) -> Option<Self> {
        let budget = self.recursion_budget.checked_sub(1)?;
        Some(Self::new(address, Some(self.normalized.clone()), budget))
    }

    /// Screens the address and resolves its host
    ///
    /// Makes no connection to the relay itself. Returns true when the task is valid.
    pub async fn validate(&mut self, resolver: &dyn Resolver) -> bool {
        let url = match validate_address(&self.address) {
            Ok(url) => url,
            Err(reason) => {
                tracing::info!("Rejected {}: {}", self.address, reason);
                self.validation = Validation::Rejected(reason);
                return false;
            }
        };

        match resolve_host(resolver, &url).await {
            Ok(ips) => {
                self.resolved_ips = ips;
                self.url = Some(url);
                self.validation = Validation::Valid;
                true
            }
            Err(reason) => {
                tracing::info!("Rejected {}: {}", self.address, reason);
                self.validation = Validation::Rejected(reason);
                false
            }
        }
    }

    /// Validates the relay, then fetches its information document and, when budget
    /// remains, its relay lists
    ///
    /// Fetch failures leave the affected data unknown; they never fail the task.
    pub async fn load(&mut self, probe: &Probe) {
        if !self.validate(probe.resolver.as_ref()).await {
            return;
        }

        // Every request goes to the host that passed validation
        let Some(url) = self.url.clone() else {
            return;
        };
        let info_url = info_document_url(&url);
        match probe.client.fetch_info(&info_url).await {
            Ok(bytes) => {
                self.info = Some(InfoDocument::parse(&bytes));
                self.raw_info = Some(bytes);
            }
            Err(e) => tracing::warn!("No information document for {}: {}", self.address, e),
        }

        if self.recursion_budget == 0 {
            return;
        }

        let ws_url = websocket_url(&url);
        match probe.client.fetch_peer_list(&ws_url).await {
            Ok(peer_list) => {
                let scan = find_neighbours(&peer_list.events);
                if scan.wrong_kind > 0 {
                    tracing::debug!(
                        "{} returned {} events of the wrong kind",
                        self.address,
                        scan.wrong_kind
                    );
                }
                self.neighbors = scan.relays;
                self.non_conforming_events = scan.wrong_kind;
                self.peer_events = peer_list.events;
            }
            Err(e) => tracing::warn!("No relay lists from {}: {}", self.address, e),
        }
    }

    /// Announced software, or `"N/A"`
    pub fn software(&self) -> &str {
        self.info
            .as_ref()
            .and_then(|info| info.software.as_deref())
            .unwrap_or(UNKNOWN_SOFTWARE)
    }

    /// Public key of the relay operator, if announced
    pub fn public_key(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.pubkey.as_deref())
    }

    /// The raw information document as text, with invalid UTF-8 replaced
    pub fn raw_info_text(&self) -> Option<String> {
        self.raw_info
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}
