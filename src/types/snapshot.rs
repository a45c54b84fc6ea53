//! Graph snapshots: the unit compared by the diff engine and persisted as a version.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use super::edge::{Edge, EdgeId};
use super::node::{Node, NodeId};
use super::version::VersionId;

/// Error for input that cannot be interpreted as a graph at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The root value is not a JSON object.
    #[error("Graph snapshot must be an object, got {0}")]
    NotAnObject(&'static str),
    /// `nodes` or `edges` is neither an array nor an object.
    #[error("Field `{field}` must be an array or an object, got {found}")]
    InvalidCollection {
        /// Offending field name.
        field: &'static str,
        /// JSON type that was found.
        found: &'static str,
    },
}

/// A graph at one point in time.
///
/// Uses BTreeMap for deterministic iteration, so diffs and fingerprints are
/// stable for the same content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes by id.
    pub nodes: BTreeMap<NodeId, Node>,
    /// Edges by id.
    pub edges: BTreeMap<EdgeId, Edge>,
    /// Version this snapshot was derived from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<VersionId>,
}

impl GraphSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from node and edge lists. Later duplicates win.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            edges: edges.into_iter().map(|e| (e.id.clone(), e)).collect(),
            baseline: None,
        }
    }

    /// Mark the version this snapshot was derived from.
    pub fn with_baseline(mut self, baseline: VersionId) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Insert or replace a node.
    pub fn upsert_node(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Insert or replace an edge.
    pub fn upsert_edge(&mut self, edge: Edge) -> Option<Edge> {
        self.edges.insert(edge.id.clone(), edge)
    }

    /// Remove a node. Edges that referenced it are left dangling.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        self.nodes.remove(id)
    }

    /// Remove an edge.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        self.edges.remove(id)
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Edges whose source or target is missing from this snapshot.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges
            .values()
            .filter(|e| !self.nodes.contains_key(&e.source) || !self.nodes.contains_key(&e.target))
    }

    /// Whether the snapshot has no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Content fingerprint (xxh64 of canonical nodes and edges).
    ///
    /// The baseline reference is excluded: two snapshots with the same
    /// graph content share a fingerprint.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(&(&self.nodes, &self.edges))
    }

    /// Parse a snapshot from loosely-shaped JSON.
    ///
    /// `nodes` and `edges` may be arrays or id-keyed objects. Entries that
    /// fail to parse are skipped and logged; only a root that is not an
    /// object, or collections of the wrong JSON type, are rejected.
    pub fn from_json(value: &Value) -> Result<Self, SnapshotError> {
        let root = value
            .as_object()
            .ok_or_else(|| SnapshotError::NotAnObject(json_type(value)))?;

        let mut snapshot = Self::new();

        for entry in collection_entries(root.get("nodes"), "nodes")? {
            match serde_json::from_value::<Node>(entry) {
                Ok(node) if !node.content.is_well_formed() => {
                    tracing::warn!(
                        node_id = %node.id,
                        kind = node.content.kind(),
                        "Skipping malformed node"
                    );
                }
                Ok(node) => {
                    snapshot.upsert_node(node);
                }
                Err(e) => tracing::warn!(error = %e, "Skipping malformed node"),
            }
        }

        for entry in collection_entries(root.get("edges"), "edges")? {
            match serde_json::from_value::<Edge>(entry) {
                Ok(edge) => {
                    snapshot.upsert_edge(edge);
                }
                Err(e) => tracing::warn!(error = %e, "Skipping malformed edge"),
            }
        }

        snapshot.baseline = root
            .get("baseline")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        Ok(snapshot)
    }
}

/// Flatten an array or id-keyed object into entry values.
///
/// For object form, the key is used as the entry id when the entry has none.
fn collection_entries(
    value: Option<&Value>,
    field: &'static str,
) -> Result<Vec<Value>, SnapshotError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .map(|(key, entry)| {
                let mut entry = entry.clone();
                if let Value::Object(fields) = &mut entry {
                    fields
                        .entry("id")
                        .or_insert_with(|| Value::String(key.clone()));
                }
                entry
            })
            .collect()),
        Some(other) => Err(SnapshotError::InvalidCollection {
            field,
            found: json_type(other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::node::{NodeContent, Position};
    use serde_json::json;

    #[test]
    fn test_from_json_skips_malformed_entries() {
        let snapshot = GraphSnapshot::from_json(&json!({
            "nodes": [
                { "id": "a", "kind": "topic", "label": "A", "position": { "x": 0.0, "y": 0.0 } },
                { "id": "b", "kind": "topic", "label": "no position" },
                { "kind": "topic", "position": { "x": 0.0, "y": 0.0 } },
                { "id": "c", "kind": "topic", "label": 42, "position": { "x": 0.0, "y": 0.0 } },
                { "id": "d", "label": "no kind", "position": { "x": 0.0, "y": 0.0 } }
            ],
            "edges": [
                { "id": "e1", "source": "a", "target": "zzz" },
                { "id": "e2", "source": "a" }
            ]
        }))
        .unwrap();

        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.dangling_edges().count(), 1);
    }

    #[test]
    fn test_from_json_keeps_unknown_kinds() {
        let snapshot = GraphSnapshot::from_json(&json!({
            "nodes": [
                { "id": "a", "kind": "topic", "label": "A", "position": { "x": 0.0, "y": 0.0 } },
                { "id": "b", "kind": "checklist", "label": "Ship it", "items": ["x", "y"],
                  "position": { "x": 10.0, "y": 0.0 } }
            ]
        }))
        .unwrap();

        let b = snapshot.node(&NodeId::new("b")).unwrap();
        assert_eq!(b.content.kind(), "checklist");
        assert_eq!(b.display_text(), "Ship it");

        let round_trip: Node = serde_json::from_value(serde_json::to_value(b).unwrap()).unwrap();
        assert_eq!(&round_trip, b);
        assert_eq!(serde_json::to_value(b).unwrap()["items"], json!(["x", "y"]));
    }

    #[test]
    fn test_from_json_object_form_uses_keys() {
        let snapshot = GraphSnapshot::from_json(&json!({
            "nodes": {
                "a": { "kind": "title", "label": "Roadmap", "position": { "x": 0.0, "y": 0.0 } }
            }
        }))
        .unwrap();

        assert!(snapshot.node(&NodeId::new("a")).is_some());
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert_eq!(
            GraphSnapshot::from_json(&json!([1, 2, 3])),
            Err(SnapshotError::NotAnObject("array"))
        );
        assert!(matches!(
            GraphSnapshot::from_json(&json!({ "nodes": "oops" })),
            Err(SnapshotError::InvalidCollection { field: "nodes", .. })
        ));
    }

    #[test]
    fn test_fingerprint_ignores_baseline() {
        let mut a = GraphSnapshot::new();
        a.upsert_node(Node::new("n", NodeContent::topic("N"), Position::new(1.0, 1.0)));
        let b = a.clone().with_baseline(VersionId::random());

        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = a.clone();
        c.upsert_node(Node::new("n", NodeContent::topic("N2"), Position::new(1.0, 1.0)));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
