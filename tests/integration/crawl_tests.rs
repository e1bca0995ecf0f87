//! Integration tests for the crawler
//!
//! These tests drive the full manager and runner pool against scripted relays
//! and an in-memory graph, without touching DNS or the network.

use async_trait::async_trait;
use relay_miner::address::{clean_name, Resolver};
use relay_miner::config::CrawlerConfig;
use relay_miner::crawler::{Manager, PeerList, Probe, RelayClient, Termination};
use relay_miner::protocol::{Event, RELAY_LIST_KIND};
use relay_miner::storage::{
    GraphQuery, MemoryGraphStore, NodeKey, NodeLabel, PropertyValue, RelationKind,
};
use relay_miner::{FetchError, MinerError};
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Resolves every host to a public address, except `*.invalid`
struct FakeResolver;

#[async_trait]
impl Resolver for FakeResolver {
    async fn lookup(&self, host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
        if host.ends_with(".invalid") {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such host"));
        }
        Ok(vec!["93.184.216.34".parse().unwrap()])
    }
}

/// Relays answering from a script, recording every call
#[derive(Default)]
struct ScriptedRelays {
    /// Relay lists per normalized relay name, as (author, relays) pairs
    lists: HashMap<String, Vec<(String, Vec<String>)>>,
    info_calls: Mutex<Vec<String>>,
    peer_calls: Mutex<Vec<String>>,
}

impl ScriptedRelays {
    fn with_list(mut self, relay: &str, author: &str, relays: &[&str]) -> Self {
        self.lists
            .entry(relay.to_string())
            .or_default()
            .push((author.to_string(), relays.iter().map(|r| r.to_string()).collect()));
        self
    }

    fn info_calls_for(&self, relay: &str) -> usize {
        self.info_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.as_str() == relay)
            .count()
    }

    fn total_info_calls(&self) -> usize {
        self.info_calls.lock().unwrap().len()
    }

    fn total_peer_calls(&self) -> usize {
        self.peer_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RelayClient for ScriptedRelays {
    async fn fetch_info(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let name = clean_name(url);
        self.info_calls.lock().unwrap().push(name.clone());
        Ok(format!(
            r#"{{"name":"{}","software":"strfry","pubkey":"owner-{}","supported_nips":[1,11]}}"#,
            name, name
        )
        .into_bytes())
    }

    async fn fetch_peer_list(&self, url: &str) -> Result<PeerList, FetchError> {
        let name = clean_name(url);
        self.peer_calls.lock().unwrap().push(name.clone());

        let events = self
            .lists
            .get(&name)
            .map(|lists| {
                lists
                    .iter()
                    .map(|(author, relays)| Event {
                        pubkey: author.clone(),
                        kind: RELAY_LIST_KIND,
                        tags: relays
                            .iter()
                            .map(|r| vec!["r".to_string(), r.clone()])
                            .collect(),
                        ..Event::default()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(PeerList {
            events,
            termination: Termination::EndOfStoredEvents,
        })
    }
}

fn crawler_config(max_recursion: u32, push_users: bool) -> CrawlerConfig {
    CrawlerConfig {
        max_recursion,
        max_runners: 4,
        push_users,
        poll_interval_ms: 10,
    }
}

fn manager(
    config: CrawlerConfig,
    relays: Arc<ScriptedRelays>,
    store: Arc<MemoryGraphStore>,
) -> Manager {
    Manager::new(config, store, Probe::new(Arc::new(FakeResolver), relays))
}

fn seeds(addresses: &[&str]) -> Vec<String> {
    addresses.iter().map(|a| a.to_string()).collect()
}

fn relay(name: &str) -> NodeKey {
    NodeKey::new(NodeLabel::Relay, name)
}

#[tokio::test]
async fn test_zero_recursion_probes_seed_only() {
    let relays = Arc::new(
        ScriptedRelays::default().with_list("relay.one", "alice", &["wss://relay.two/"]),
    );
    let store = Arc::new(MemoryGraphStore::new());

    let report = manager(crawler_config(0, false), relays.clone(), store.clone())
        .run(&seeds(&["wss://relay.one/"]))
        .await
        .unwrap();

    assert_eq!(report.relays_processed, 1);
    assert_eq!(report.neighbours_enqueued, 0);
    assert_eq!(relays.total_info_calls(), 1);
    assert_eq!(relays.total_peer_calls(), 0);
    assert!(store.node(NodeLabel::Relay, "relay.two").is_none());
}

#[tokio::test]
async fn test_one_hop_skips_visited_neighbour() {
    let relays = Arc::new(ScriptedRelays::default().with_list(
        "relay.one",
        "alice",
        &["wss://a.example/", "wss://b.example/", "wss://relay.zero/"],
    ));
    let store = Arc::new(MemoryGraphStore::new());

    let report = manager(crawler_config(1, false), relays.clone(), store.clone())
        .run(&seeds(&["wss://relay.one/", "wss://relay.zero/"]))
        .await
        .unwrap();

    assert_eq!(report.neighbours_enqueued, 2);
    assert_eq!(report.relays_processed, 4);
    assert_eq!(relays.info_calls_for("relay.zero"), 1);
    assert_eq!(relays.info_calls_for("a.example"), 1);
    assert_eq!(relays.info_calls_for("b.example"), 1);

    // Children have no budget left, so only the two seeds were asked for lists
    assert_eq!(relays.total_peer_calls(), 2);

    for child in ["a.example", "b.example", "relay.zero"] {
        assert!(store.has_relationship(
            RelationKind::Detected,
            &relay("relay.one"),
            &relay(child)
        ));
    }
}

#[tokio::test]
async fn test_private_seed_is_recorded_without_network_calls() {
    let relays = Arc::new(ScriptedRelays::default());
    let store = Arc::new(MemoryGraphStore::new());

    let report = manager(crawler_config(2, false), relays.clone(), store.clone())
        .run(&seeds(&["10.0.0.5"]))
        .await
        .unwrap();

    assert_eq!(report.relays_rejected, 1);
    assert_eq!(relays.total_info_calls(), 0);
    assert_eq!(relays.total_peer_calls(), 0);

    let props = store.node(NodeLabel::Relay, "10.0.0.5").unwrap();
    assert_eq!(props.get("isValid"), Some(&PropertyValue::Bool(false)));
    assert_eq!(
        props.get("validReason"),
        Some(&PropertyValue::Text("Private IP address".to_string()))
    );
    assert_eq!(store.count_nodes(NodeLabel::Software).unwrap(), 0);
}

#[tokio::test]
async fn test_shared_neighbour_scheduled_once() {
    let relays = Arc::new(
        ScriptedRelays::default()
            .with_list("relay.one", "alice", &["wss://relay.shared/"])
            .with_list("relay.two", "bob", &["wss://relay.shared", "relay.shared"]),
    );
    let store = Arc::new(MemoryGraphStore::new());

    let report = manager(crawler_config(2, false), relays.clone(), store.clone())
        .run(&seeds(&["wss://relay.one/", "wss://relay.two/"]))
        .await
        .unwrap();

    assert_eq!(report.neighbours_enqueued, 1);
    assert_eq!(relays.info_calls_for("relay.shared"), 1);
    assert!(store.has_relationship(
        RelationKind::Detected,
        &relay("relay.one"),
        &relay("relay.shared")
    ));
    assert!(store.has_relationship(
        RelationKind::Detected,
        &relay("relay.two"),
        &relay("relay.shared")
    ));
}

#[tokio::test]
async fn test_recursion_budget_bounds_the_chain() {
    let relays = Arc::new(
        ScriptedRelays::default()
            .with_list("relay.one", "a", &["wss://relay.two/"])
            .with_list("relay.two", "b", &["wss://relay.three/"])
            .with_list("relay.three", "c", &["wss://relay.four/"]),
    );
    let store = Arc::new(MemoryGraphStore::new());

    manager(crawler_config(2, false), relays.clone(), store.clone())
        .run(&seeds(&["wss://relay.one/"]))
        .await
        .unwrap();

    assert_eq!(relays.info_calls_for("relay.three"), 1);
    assert_eq!(relays.info_calls_for("relay.four"), 0);
    assert_eq!(relays.total_peer_calls(), 2);
    assert!(store.node(NodeLabel::Relay, "relay.four").is_none());
}

#[tokio::test]
async fn test_rejected_neighbour_is_recorded_not_queued() {
    let relays = Arc::new(ScriptedRelays::default().with_list(
        "relay.one",
        "alice",
        &["ws://192.168.1.10/", "wss://hidden.onion/", "wss://gone.invalid/"],
    ));
    let store = Arc::new(MemoryGraphStore::new());

    let report = manager(crawler_config(1, false), relays.clone(), store.clone())
        .run(&seeds(&["wss://relay.one/"]))
        .await
        .unwrap();

    assert_eq!(report.neighbours_enqueued, 0);
    assert_eq!(relays.total_info_calls(), 1);

    let summary = store.rejection_summary().unwrap();
    assert_eq!(summary.get("Private IP address"), Some(&1));
    assert_eq!(summary.get("TOR network address"), Some(&1));
    assert_eq!(summary.get("DNS resolution failed"), Some(&1));
}

#[tokio::test]
async fn test_push_users_records_authors() {
    let relays = Arc::new(ScriptedRelays::default().with_list(
        "relay.one",
        "alice",
        &["wss://relay.two/", "wss://relay.three/"],
    ));
    let store = Arc::new(MemoryGraphStore::new());

    manager(crawler_config(1, true), relays, store.clone())
        .run(&seeds(&["wss://relay.one/"]))
        .await
        .unwrap();

    let alice = NodeKey::new(NodeLabel::User, "alice");
    assert!(store.has_relationship(RelationKind::Uses, &alice, &relay("relay.two")));
    assert!(store.has_relationship(RelationKind::Uses, &alice, &relay("relay.three")));
}

#[tokio::test]
async fn test_facts_for_loaded_relay() {
    let relays = Arc::new(ScriptedRelays::default());
    let store = Arc::new(MemoryGraphStore::new());

    manager(crawler_config(0, false), relays, store.clone())
        .run(&seeds(&["wss://relay.one/"]))
        .await
        .unwrap();

    assert_eq!(store.count_nodes(NodeLabel::Nip).unwrap(), 100);
    assert!(store.has_relationship(
        RelationKind::UsesSoftware,
        &relay("relay.one"),
        &NodeKey::new(NodeLabel::Software, "strfry")
    ));
    assert!(store.has_relationship(
        RelationKind::Owns,
        &NodeKey::new(NodeLabel::User, "owner-relay.one"),
        &relay("relay.one")
    ));
    assert!(store.has_relationship(
        RelationKind::HasIp,
        &relay("relay.one"),
        &NodeKey::new(NodeLabel::Ip, "93.184.216.34")
    ));
    assert!(store.has_relationship(
        RelationKind::AltName,
        &relay("relay.one"),
        &NodeKey::new(NodeLabel::RelayAlternativeName, "wss://relay.one/")
    ));
    assert_eq!(store.count_relationships(RelationKind::Implements).unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_seeds_processed_once() {
    let relays = Arc::new(ScriptedRelays::default());
    let store = Arc::new(MemoryGraphStore::new());

    let report = manager(crawler_config(0, false), relays.clone(), store)
        .run(&seeds(&["wss://relay.one/", "relay.one", "https://relay.one"]))
        .await
        .unwrap();

    assert_eq!(report.relays_processed, 1);
    assert_eq!(relays.total_info_calls(), 1);
}

#[tokio::test]
async fn test_store_failure_at_startup_aborts() {
    let relays = Arc::new(ScriptedRelays::default());
    let store = Arc::new(MemoryGraphStore::new());
    store.fail_writes(true);

    let result = manager(crawler_config(0, false), relays.clone(), store)
        .run(&seeds(&["wss://relay.one/"]))
        .await;

    assert!(matches!(result, Err(MinerError::Storage(_))));
    assert_eq!(relays.total_info_calls(), 0);
}

/// Relay client that panics on first contact
struct PanickingRelays;

#[async_trait]
impl RelayClient for PanickingRelays {
    async fn fetch_info(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        panic!("unexpected document from {}", url);
    }

    async fn fetch_peer_list(&self, _url: &str) -> Result<PeerList, FetchError> {
        Ok(PeerList {
            events: Vec::new(),
            termination: Termination::EndOfStoredEvents,
        })
    }
}

#[tokio::test]
async fn test_panicking_runner_is_reported() {
    let store = Arc::new(MemoryGraphStore::new());
    let manager = Manager::new(
        crawler_config(0, false),
        store,
        Probe::new(Arc::new(FakeResolver), Arc::new(PanickingRelays)),
    );

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        manager.run(&seeds(&["wss://relay.one/"])),
    )
    .await
    .expect("crawl must not hang after a runner panic");

    assert!(matches!(result, Err(MinerError::Worker { .. })));
    assert!(manager.frontier().is_empty());
    assert_eq!(manager.frontier().outstanding(), 0);
}
