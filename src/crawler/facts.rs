//! Graph statements derived from crawl results

use crate::address::clean_name;
use crate::crawler::task::RelayTask;
use crate::protocol::Event;
use crate::storage::{NodeKey, NodeLabel, RelationKind, Statement};

/// NIP numbers merged before crawling starts
pub const SEEDED_NIPS: std::ops::RangeInclusive<u32> = 0..=99;

fn relay_key(normalized: &str) -> NodeKey {
    NodeKey::new(NodeLabel::Relay, normalized)
}

/// `NIP` nodes for every number in [`SEEDED_NIPS`]
pub fn nip_statements() -> Vec<Statement> {
    SEEDED_NIPS
        .map(|nip| Statement::merge_node(NodeLabel::Nip, nip.to_string()))
        .collect()
}

/// Relay node, its alternative name, and its validity
fn relay_identity(task: &RelayTask) -> Vec<Statement> {
    let relay = relay_key(&task.normalized);
    let alt = NodeKey::new(NodeLabel::RelayAlternativeName, task.address.as_str());

    vec![
        Statement::merge_node(NodeLabel::Relay, task.normalized.as_str())
            .with("isValid", task.validation.is_valid())
            .with("validReason", task.validation.reason()),
        Statement::merge_node(NodeLabel::RelayAlternativeName, task.address.as_str()),
        Statement::merge_relationship(RelationKind::AltName, relay, alt),
    ]
}

/// Everything learned about a loaded relay
///
/// Invalid relays only get their identity, rejection reason and discoverer.
pub fn relay_statements(task: &RelayTask) -> Vec<Statement> {
    let relay = relay_key(&task.normalized);
    let mut statements = relay_identity(task);

    if let Some(parent) = &task.discovered_by {
        statements.push(Statement::merge_relationship(
            RelationKind::Detected,
            relay_key(parent),
            relay.clone(),
        ));
    }

    if !task.validation.is_valid() {
        return statements;
    }

    let mut details = Statement::merge_node(NodeLabel::Relay, task.normalized.as_str())
        .with("software", task.software());
    if let Some(info) = &task.info {
        if let Some(version) = &info.version {
            details = details.with("version", version.as_str());
        }
        if let Some(name) = &info.name {
            details = details.with("displayName", name.as_str());
        }
    }
    if let Some(raw) = task.raw_info_text() {
        details = details.with("info", raw);
    }
    statements.push(details);

    let software = NodeKey::new(NodeLabel::Software, task.software());
    statements.push(Statement::merge_node(NodeLabel::Software, task.software()));
    statements.push(Statement::merge_relationship(
        RelationKind::UsesSoftware,
        relay.clone(),
        software,
    ));

    if let Some(info) = &task.info {
        for nip in &info.supported_nips {
            statements.push(Statement::merge_node(NodeLabel::Nip, nip.to_string()));
            statements.push(Statement::merge_relationship(
                RelationKind::Implements,
                relay.clone(),
                NodeKey::new(NodeLabel::Nip, nip.to_string()),
            ));
        }
    }

    if let Some(pubkey) = task.public_key() {
        statements.push(Statement::merge_node(NodeLabel::User, pubkey));
        statements.push(Statement::merge_relationship(
            RelationKind::Owns,
            NodeKey::new(NodeLabel::User, pubkey),
            relay.clone(),
        ));
    }

    for ip in &task.resolved_ips {
        let ip = ip.to_string();
        statements.push(Statement::merge_node(NodeLabel::Ip, ip.as_str()));
        statements.push(Statement::merge_relationship(
            RelationKind::HasIp,
            relay.clone(),
            NodeKey::new(NodeLabel::Ip, ip),
        ));
    }

    statements
}

/// A newly discovered neighbour after its pre-screen
pub fn neighbour_statements(parent: &str, child: &RelayTask) -> Vec<Statement> {
    let mut statements = relay_identity(child);
    statements.push(Statement::merge_relationship(
        RelationKind::Detected,
        relay_key(parent),
        relay_key(&child.normalized),
    ));
    statements
}

/// Detection of a relay that was already scheduled
pub fn detected_statements(parent: &str, normalized: &str) -> Vec<Statement> {
    vec![
        Statement::merge_node(NodeLabel::Relay, normalized),
        Statement::merge_relationship(
            RelationKind::Detected,
            relay_key(parent),
            relay_key(normalized),
        ),
    ]
}

/// Authors of relay lists and the relays they use
pub fn user_statements(events: &[Event]) -> Vec<Statement> {
    let mut statements = Vec::new();

    for event in events.iter().filter(|e| e.is_relay_list()) {
        if event.pubkey.is_empty() {
            continue;
        }
        let user = NodeKey::new(NodeLabel::User, event.pubkey.as_str());
        statements.push(Statement::merge_node(NodeLabel::User, event.pubkey.as_str()));

        for url in event.relay_urls() {
            let normalized = clean_name(url);
            if normalized.is_empty() {
                continue;
            }
            statements.push(Statement::merge_node(NodeLabel::Relay, normalized.as_str()));
            statements.push(Statement::merge_relationship(
                RelationKind::Uses,
                user.clone(),
                relay_key(&normalized),
            ));
        }
    }

    statements
}
