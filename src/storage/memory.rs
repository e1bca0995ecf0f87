//! In-memory graph store
//!
//! Used by tests and experiments that should not touch disk. Shares the merge
//! semantics of the SQLite backend: node properties are patched, relationships are
//! only created between existing nodes, and both are idempotent.

use crate::storage::traits::{
    GraphQuery, GraphStore, NodeKey, NodeLabel, PropertyValue, RelationKind, Statement,
    StorageError, StorageResult,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

type Properties = BTreeMap<String, PropertyValue>;

#[derive(Debug, Default)]
struct MemoryGraph {
    nodes: BTreeMap<NodeKey, Properties>,
    relationships: BTreeSet<(RelationKind, NodeKey, NodeKey)>,
    executed: usize,
    closed: bool,
    fail_writes: bool,
}

/// Graph store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    graph: Mutex<MemoryGraph>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, MemoryGraph>> {
        self.graph.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Makes every following `execute` fail, to exercise error paths
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut graph) = self.lock() {
            graph.fail_writes = fail;
        }
    }

    /// Number of statements executed successfully
    pub fn executed(&self) -> usize {
        self.lock().map(|g| g.executed).unwrap_or(0)
    }

    /// Properties of a node, if present
    pub fn node(&self, label: NodeLabel, key: &str) -> Option<Properties> {
        let graph = self.lock().ok()?;
        graph.nodes.get(&NodeKey::new(label, key)).cloned()
    }

    /// Keys of every node with the given label, sorted
    pub fn node_keys(&self, label: NodeLabel) -> Vec<String> {
        self.lock()
            .map(|g| {
                g.nodes
                    .keys()
                    .filter(|k| k.label == label)
                    .map(|k| k.key.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_relationship(&self, kind: RelationKind, from: &NodeKey, to: &NodeKey) -> bool {
        self.lock()
            .map(|g| {
                g.relationships
                    .contains(&(kind, from.clone(), to.clone()))
            })
            .unwrap_or(false)
    }

    /// Endpoints of every relationship of the given kind
    pub fn relationships(&self, kind: RelationKind) -> Vec<(NodeKey, NodeKey)> {
        self.lock()
            .map(|g| {
                g.relationships
                    .iter()
                    .filter(|(k, _, _)| *k == kind)
                    .map(|(_, from, to)| (from.clone(), to.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().map(|g| g.closed).unwrap_or(true)
    }
}

impl GraphStore for MemoryGraphStore {
    fn execute(&self, statement: &Statement) -> StorageResult<()> {
        let mut graph = self.lock()?;
        if graph.closed {
            return Err(StorageError::Closed);
        }
        if graph.fail_writes {
            return Err(StorageError::Serialization(
                "write rejected by test store".to_string(),
            ));
        }

        match statement {
            Statement::MergeNode { node, properties } => {
                let entry = graph.nodes.entry(node.clone()).or_default();
                entry.insert(
                    node.label.key_property().to_string(),
                    PropertyValue::Text(node.key.clone()),
                );
                for (name, value) in properties {
                    entry.insert(name.to_string(), value.clone());
                }
            }
            Statement::MergeRelationship { kind, from, to } => {
                if graph.nodes.contains_key(from) && graph.nodes.contains_key(to) {
                    graph
                        .relationships
                        .insert((*kind, from.clone(), to.clone()));
                }
            }
        }

        graph.executed += 1;
        Ok(())
    }

    fn clean(&self) -> StorageResult<()> {
        let mut graph = self.lock()?;
        if graph.closed {
            return Err(StorageError::Closed);
        }
        graph.nodes.clear();
        graph.relationships.clear();
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        let mut graph = self.lock()?;
        if graph.closed {
            return Err(StorageError::Closed);
        }
        graph.closed = true;
        Ok(())
    }
}

impl GraphQuery for MemoryGraphStore {
    fn count_nodes(&self, label: NodeLabel) -> StorageResult<u64> {
        let graph = self.lock()?;
        Ok(graph.nodes.keys().filter(|k| k.label == label).count() as u64)
    }

    fn count_relationships(&self, kind: RelationKind) -> StorageResult<u64> {
        let graph = self.lock()?;
        Ok(graph
            .relationships
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .count() as u64)
    }

    fn relay_validity_counts(&self) -> StorageResult<(u64, u64)> {
        let graph = self.lock()?;
        let mut valid = 0;
        let mut invalid = 0;
        for (key, props) in &graph.nodes {
            if key.label != NodeLabel::Relay {
                continue;
            }
            match props.get("isValid") {
                Some(PropertyValue::Bool(true)) => valid += 1,
                Some(PropertyValue::Bool(false)) => invalid += 1,
                _ => {}
            }
        }
        Ok((valid, invalid))
    }

    fn software_breakdown(&self) -> StorageResult<HashMap<String, u64>> {
        let graph = self.lock()?;
        let mut breakdown = HashMap::new();
        for (kind, _, to) in &graph.relationships {
            if *kind == RelationKind::UsesSoftware {
                *breakdown.entry(to.key.clone()).or_insert(0) += 1;
            }
        }
        Ok(breakdown)
    }

    fn rejection_summary(&self) -> StorageResult<HashMap<String, u64>> {
        let graph = self.lock()?;
        let mut summary = HashMap::new();
        for (key, props) in &graph.nodes {
            if key.label != NodeLabel::Relay {
                continue;
            }
            if props.get("isValid") != Some(&PropertyValue::Bool(false)) {
                continue;
            }
            let reason = match props.get("validReason") {
                Some(PropertyValue::Text(reason)) => reason.clone(),
                _ => String::new(),
            };
            *summary.entry(reason).or_insert(0) += 1;
        }
        Ok(summary)
    }
}
