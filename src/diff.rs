//! Structural diff between two graph snapshots.
//!
//! Entities are matched by id. An id present only in the current snapshot
//! is an addition, one present only in the baseline is a removal, and one
//! present in both is a modification iff its canonical serialization
//! differs.
//!
//! ## Emission Order
//!
//! ```text
//! node add → node modify → node remove → edge add → edge modify → edge remove
//! ```
//!
//! Within each phase, ids are ascending (BTreeMap order), so the same pair of
//! snapshots always yields the same change set.

use crate::canonical::canonical_eq;
use crate::types::{
    ChangeAction, ChangeRecord, ChangeSet, Edge, EntityType, GraphSnapshot, Node, NodeId,
};

/// Placeholder used when an edge endpoint cannot be resolved.
pub const UNKNOWN_NODE_LABEL: &str = "Unknown node";

/// Compare `baseline` against `current` and describe what changed.
///
/// Total: never fails. Dangling edge endpoints are rendered with
/// [`UNKNOWN_NODE_LABEL`].
pub fn diff(baseline: &GraphSnapshot, current: &GraphSnapshot) -> ChangeSet {
    let mut records = Vec::new();

    // Nodes
    for (id, node) in &current.nodes {
        if !baseline.nodes.contains_key(id) {
            records.push(node_record(ChangeAction::Add, node, None, Some(node)));
        }
    }
    for (id, after) in &current.nodes {
        if let Some(before) = baseline.nodes.get(id) {
            if !canonical_eq(before, after) {
                records.push(node_record(ChangeAction::Modify, after, Some(before), Some(after)));
            }
        }
    }
    for (id, node) in &baseline.nodes {
        if !current.nodes.contains_key(id) {
            records.push(node_record(ChangeAction::Remove, node, Some(node), None));
        }
    }

    // Edges
    for (id, edge) in &current.edges {
        if !baseline.edges.contains_key(id) {
            records.push(ChangeRecord {
                entity_type: EntityType::Connection,
                action: ChangeAction::Add,
                entity_id: id.to_string(),
                before: None,
                after: Some(edge_display_text(edge, current, baseline)),
            });
        }
    }
    for (id, after) in &current.edges {
        if let Some(before) = baseline.edges.get(id) {
            if !canonical_eq(before, after) {
                records.push(ChangeRecord {
                    entity_type: EntityType::Connection,
                    action: ChangeAction::Modify,
                    entity_id: id.to_string(),
                    before: Some(edge_display_text(before, baseline, current)),
                    after: Some(edge_display_text(after, current, baseline)),
                });
            }
        }
    }
    for (id, edge) in &baseline.edges {
        if !current.edges.contains_key(id) {
            records.push(ChangeRecord {
                entity_type: EntityType::Connection,
                action: ChangeAction::Remove,
                entity_id: id.to_string(),
                before: Some(edge_display_text(edge, baseline, current)),
                after: None,
            });
        }
    }

    let changes = ChangeSet::new(records);
    tracing::debug!(
        baseline_nodes = baseline.nodes.len(),
        current_nodes = current.nodes.len(),
        changes = changes.len(),
        "Computed graph diff"
    );
    changes
}

fn node_record(
    action: ChangeAction,
    node: &Node,
    before: Option<&Node>,
    after: Option<&Node>,
) -> ChangeRecord {
    ChangeRecord {
        entity_type: EntityType::Node,
        action,
        entity_id: node.id.to_string(),
        before: before.map(Node::display_text),
        after: after.map(Node::display_text),
    }
}

/// Render an edge as `source → target` using node labels.
///
/// Labels are looked up in `primary` first, then in `fallback`.
pub fn edge_display_text(edge: &Edge, primary: &GraphSnapshot, fallback: &GraphSnapshot) -> String {
    format!(
        "{} → {}",
        endpoint_label(&edge.source, primary, fallback),
        endpoint_label(&edge.target, primary, fallback)
    )
}

fn endpoint_label(id: &NodeId, primary: &GraphSnapshot, fallback: &GraphSnapshot) -> String {
    primary
        .node(id)
        .or_else(|| fallback.node(id))
        .map(Node::display_text)
        .unwrap_or_else(|| UNKNOWN_NODE_LABEL.to_string())
}
