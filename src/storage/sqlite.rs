//! SQLite storage implementation
//!
//! This module provides a SQLite-backed property graph implementing `GraphStore`
//! and `GraphQuery`.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    GraphQuery, GraphStore, NodeKey, NodeLabel, PropertyValue, RelationKind, Statement,
    StorageError, StorageResult,
};
use chrono::Utc;
use rusqlite::{named_params, Connection};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const MERGE_NODE_SQL: &str = "
    INSERT INTO nodes (label, key, properties, created_at, updated_at)
    VALUES (:label, :key, :properties, :now, :now)
    ON CONFLICT(label, key) DO UPDATE SET
        properties = json_patch(nodes.properties, excluded.properties),
        updated_at = excluded.updated_at
";

const MERGE_RELATIONSHIP_SQL: &str = "
    INSERT OR IGNORE INTO relationships (kind, from_node, to_node, created_at)
    SELECT :kind, f.id, t.id, :now
    FROM nodes f, nodes t
    WHERE f.label = :from_label AND f.key = :from_key
      AND t.label = :to_label AND t.key = :to_key
";

/// SQLite graph backend
///
/// The connection sits behind a mutex so runners can share one store; `close`
/// takes it out of the `Option`.
pub struct SqliteGraphStore {
    conn: Mutex<Option<Connection>>,
}

impl SqliteGraphStore {
    /// Opens or creates a graph database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteGraphStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for concurrent writers
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Option<Connection>>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StorageResult<T>) -> StorageResult<T> {
        let guard = self.lock()?;
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;
        f(conn)
    }

    /// Reads the JSON properties of a node, if it exists
    pub fn node_properties(&self, node: &NodeKey) -> StorageResult<Option<serde_json::Value>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT properties FROM nodes WHERE label = :label AND key = :key")?;
            let mut rows = stmt.query(named_params! {
                ":label": node.label.as_str(),
                ":key": node.key,
            })?;
            match rows.next()? {
                Some(row) => {
                    let raw: String = row.get(0)?;
                    Ok(Some(serde_json::from_str(&raw)?))
                }
                None => Ok(None),
            }
        })
    }
}

/// Builds the JSON properties of a node, including its key property
fn properties_json(
    node: &NodeKey,
    properties: &BTreeMap<&'static str, PropertyValue>,
) -> StorageResult<String> {
    let mut map = serde_json::Map::new();
    map.insert(
        node.label.key_property().to_string(),
        serde_json::Value::String(node.key.clone()),
    );
    for (name, value) in properties {
        map.insert(name.to_string(), serde_json::to_value(value)?);
    }
    Ok(serde_json::Value::Object(map).to_string())
}

impl GraphStore for SqliteGraphStore {
    fn execute(&self, statement: &Statement) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            match statement {
                Statement::MergeNode { node, properties } => {
                    let properties = properties_json(node, properties)?;
                    conn.execute(
                        MERGE_NODE_SQL,
                        named_params! {
                            ":label": node.label.as_str(),
                            ":key": node.key,
                            ":properties": properties,
                            ":now": now,
                        },
                    )?;
                }
                Statement::MergeRelationship { kind, from, to } => {
                    conn.execute(
                        MERGE_RELATIONSHIP_SQL,
                        named_params! {
                            ":kind": kind.as_str(),
                            ":from_label": from.label.as_str(),
                            ":from_key": from.key,
                            ":to_label": to.label.as_str(),
                            ":to_key": to.key,
                            ":now": now,
                        },
                    )?;
                }
            }
            Ok(())
        })
    }

    fn clean(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute_batch("DELETE FROM relationships; DELETE FROM nodes;")?;
            Ok(())
        })
    }

    fn close(&self) -> StorageResult<()> {
        let mut guard = self.lock()?;
        match guard.take() {
            Some(conn) => conn.close().map_err(|(_, err)| StorageError::Sqlite(err)),
            None => Err(StorageError::Closed),
        }
    }
}

impl GraphQuery for SqliteGraphStore {
    fn count_nodes(&self, label: NodeLabel) -> StorageResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM nodes WHERE label = :label",
                named_params! { ":label": label.as_str() },
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    fn count_relationships(&self, kind: RelationKind) -> StorageResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM relationships WHERE kind = :kind",
                named_params! { ":kind": kind.as_str() },
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    fn relay_validity_counts(&self) -> StorageResult<(u64, u64)> {
        self.with_conn(|conn| {
            let (valid, invalid): (i64, i64) = conn.query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN json_extract(properties, '$.isValid') = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN json_extract(properties, '$.isValid') = 0 THEN 1 ELSE 0 END), 0)
                 FROM nodes WHERE label = :label",
                named_params! { ":label": NodeLabel::Relay.as_str() },
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok((valid as u64, invalid as u64))
        })
    }

    fn software_breakdown(&self) -> StorageResult<HashMap<String, u64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.key, COUNT(*) FROM relationships r
                 JOIN nodes s ON s.id = r.to_node
                 WHERE r.kind = :kind
                 GROUP BY s.key",
            )?;
            let rows = stmt.query_map(
                named_params! { ":kind": RelationKind::UsesSoftware.as_str() },
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )?;

            let mut breakdown = HashMap::new();
            for row in rows {
                let (software, count) = row?;
                breakdown.insert(software, count as u64);
            }
            Ok(breakdown)
        })
    }

    fn rejection_summary(&self) -> StorageResult<HashMap<String, u64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT json_extract(properties, '$.validReason'), COUNT(*) FROM nodes
                 WHERE label = :label AND json_extract(properties, '$.isValid') = 0
                 GROUP BY 1",
            )?;
            let rows = stmt.query_map(
                named_params! { ":label": NodeLabel::Relay.as_str() },
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
            )?;

            let mut summary = HashMap::new();
            for row in rows {
                let (reason, count) = row?;
                summary.insert(reason.unwrap_or_default(), count as u64);
            }
            Ok(summary)
        })
    }
}
