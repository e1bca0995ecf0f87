//! Storage traits and error types
//!
//! This module defines the graph collaborator interface, the statement model the
//! crawler emits, and associated error types.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store has been closed")]
    Closed,

    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Node labels of the relay graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    Relay,
    RelayAlternativeName,
    Software,
    Nip,
    User,
    Ip,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 6] = [
        NodeLabel::Relay,
        NodeLabel::RelayAlternativeName,
        NodeLabel::Software,
        NodeLabel::Nip,
        NodeLabel::User,
        NodeLabel::Ip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Relay => "Relay",
            NodeLabel::RelayAlternativeName => "RelayAlternativeName",
            NodeLabel::Software => "Software",
            NodeLabel::Nip => "NIP",
            NodeLabel::User => "User",
            NodeLabel::Ip => "IP",
        }
    }

    /// Name of the property that identifies a node of this label
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeLabel::Relay | NodeLabel::RelayAlternativeName => "name",
            NodeLabel::Software => "software",
            NodeLabel::Nip => "number",
            NodeLabel::User => "pubkey",
            NodeLabel::Ip => "address",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship kinds of the relay graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// Relay to one of the spellings it was referenced by
    AltName,
    /// Discovering relay to discovered relay
    Detected,
    /// Relay to a NIP it lists as supported
    Implements,
    UsesSoftware,
    Owns,
    HasIp,
    /// User to a relay named in their relay list
    Uses,
}

impl RelationKind {
    pub const ALL: [RelationKind; 7] = [
        RelationKind::AltName,
        RelationKind::Detected,
        RelationKind::Implements,
        RelationKind::UsesSoftware,
        RelationKind::Owns,
        RelationKind::HasIp,
        RelationKind::Uses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::AltName => "ALT_NAME",
            RelationKind::Detected => "DETECTED",
            RelationKind::Implements => "IMPLEMENTS",
            RelationKind::UsesSoftware => "USES_SOFTWARE",
            RelationKind::Owns => "OWNS",
            RelationKind::HasIp => "HAS_IP",
            RelationKind::Uses => "USES",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar node property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Bool(bool),
    Integer(i64),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

/// Identity of a node: its label plus the value of its key property
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub label: NodeLabel,
    pub key: String,
}

impl NodeKey {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.label, self.key)
    }
}

/// A declarative upsert against the graph
///
/// Executing the same statement twice leaves the graph as executing it once.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Create the node if absent and merge `properties` into it
    MergeNode {
        node: NodeKey,
        properties: BTreeMap<&'static str, PropertyValue>,
    },
    /// Link two existing nodes; a no-op when either endpoint is missing
    MergeRelationship {
        kind: RelationKind,
        from: NodeKey,
        to: NodeKey,
    },
}

impl Statement {
    pub fn merge_node(label: NodeLabel, key: impl Into<String>) -> Self {
        Statement::MergeNode {
            node: NodeKey::new(label, key),
            properties: BTreeMap::new(),
        }
    }

    /// Adds a property to a `MergeNode` statement; ignored on relationships
    pub fn with(mut self, name: &'static str, value: impl Into<PropertyValue>) -> Self {
        if let Statement::MergeNode { properties, .. } = &mut self {
            properties.insert(name, value.into());
        }
        self
    }

    pub fn merge_relationship(kind: RelationKind, from: NodeKey, to: NodeKey) -> Self {
        Statement::MergeRelationship { kind, from, to }
    }
}

/// Graph collaborator used by the crawler
///
/// Implementations must tolerate concurrent idempotent upserts from many runners.
pub trait GraphStore: Send + Sync {
    /// Executes one upsert statement
    fn execute(&self, statement: &Statement) -> StorageResult<()>;

    /// Removes every node and relationship
    fn clean(&self) -> StorageResult<()>;

    /// Releases the underlying connection; later calls fail with `StorageError::Closed`
    fn close(&self) -> StorageResult<()>;
}

/// Read-side queries used for reporting
pub trait GraphQuery {
    fn count_nodes(&self, label: NodeLabel) -> StorageResult<u64>;

    fn count_relationships(&self, kind: RelationKind) -> StorageResult<u64>;

    /// Returns `(valid, invalid)` relay counts
    fn relay_validity_counts(&self) -> StorageResult<(u64, u64)>;

    /// Number of relays per software name
    fn software_breakdown(&self) -> StorageResult<HashMap<String, u64>>;

    /// Number of invalid relays per rejection reason
    fn rejection_summary(&self) -> StorageResult<HashMap<String, u64>>;
}
