//! Statistics generation from the relay graph
//!
//! This module provides functionality for extracting and displaying
//! graph statistics from the storage layer.

use crate::storage::{GraphQuery, NodeLabel, RelationKind};
use crate::MinerError;
use std::collections::{BTreeMap, HashMap};

/// Relay graph statistics summary
#[derive(Debug, Clone)]
pub struct GraphStatistics {
    /// Count of nodes by label
    pub nodes_by_label: BTreeMap<NodeLabel, u64>,

    /// Count of relationships by kind
    pub relationships_by_kind: BTreeMap<RelationKind, u64>,

    pub valid_relays: u64,
    pub invalid_relays: u64,

    /// Relays per announced software
    pub software: HashMap<String, u64>,

    /// Invalid relays per rejection reason
    pub rejections: HashMap<String, u64>,
}

impl GraphStatistics {
    /// Relays with a recorded validity
    pub fn checked_relays(&self) -> u64 {
        self.valid_relays + self.invalid_relays
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The graph to query
///
/// # Returns
///
/// * `Ok(GraphStatistics)` - Successfully loaded statistics
/// * `Err(MinerError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn GraphQuery) -> Result<GraphStatistics, MinerError> {
    let mut nodes_by_label = BTreeMap::new();
    for label in NodeLabel::ALL {
        nodes_by_label.insert(label, storage.count_nodes(label)?);
    }

    let mut relationships_by_kind = BTreeMap::new();
    for kind in RelationKind::ALL {
        relationships_by_kind.insert(kind, storage.count_relationships(kind)?);
    }

    let (valid_relays, invalid_relays) = storage.relay_validity_counts()?;

    Ok(GraphStatistics {
        nodes_by_label,
        relationships_by_kind,
        valid_relays,
        invalid_relays,
        software: storage.software_breakdown()?,
        rejections: storage.rejection_summary()?,
    })
}

/// Sorts counts descending, then by name
fn sorted_counts(counts: &HashMap<String, u64>) -> Vec<(&String, &u64)> {
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    sorted
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &GraphStatistics) {
    println!("=== Relay Graph Statistics ===\n");

    println!("Nodes:");
    for (label, count) in &stats.nodes_by_label {
        println!("  {}: {}", label, count);
    }
    println!();

    println!("Relationships:");
    for (kind, count) in &stats.relationships_by_kind {
        println!("  {}: {}", kind, count);
    }
    println!();

    if !stats.software.is_empty() {
        println!("Software:");
        for (software, count) in sorted_counts(&stats.software) {
            println!("  {}: {}", software, count);
        }
        println!();
    }

    if !stats.rejections.is_empty() {
        println!("Rejections:");
        for (reason, count) in sorted_counts(&stats.rejections) {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    let checked = stats.checked_relays();
    let valid_rate = if checked > 0 {
        (stats.valid_relays as f64 / checked as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Valid Relays: {:.1}% ({} / {} relays checked)",
        valid_rate, stats.valid_relays, checked
    );
}
