//! Human-readable change records produced by the diff engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of graph entity a change touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// A node.
    Node,
    /// An edge.
    Connection,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => write!(f, "node"),
            Self::Connection => write!(f, "connection"),
        }
    }
}

/// What happened to the entity.
///
/// Declaration order is emission order within an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// Present only in the current snapshot.
    Add,
    /// Present in both with differing content.
    Modify,
    /// Present only in the baseline.
    Remove,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Modify => write!(f, "modify"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// One descriptive change between two snapshots.
///
/// Carries display text only; it is not meant to be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Node or connection.
    pub entity_type: EntityType,
    /// Add, modify or remove.
    pub action: ChangeAction,
    /// Id of the changed entity.
    pub entity_id: String,
    /// Display text before the change (`None` for additions).
    pub before: Option<String>,
    /// Display text after the change (`None` for removals).
    pub after: Option<String>,
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => {
                write!(
                    f,
                    "{} {} {}: {} -> {}",
                    self.action, self.entity_type, self.entity_id, before, after
                )
            }
            (None, Some(text)) | (Some(text), None) => {
                write!(f, "{} {} {}: {}", self.action, self.entity_type, self.entity_id, text)
            }
            (None, None) => write!(f, "{} {} {}", self.action, self.entity_type, self.entity_id),
        }
    }
}

/// Counts of changes per entity type and action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Nodes added.
    pub nodes_added: usize,
    /// Nodes modified.
    pub nodes_modified: usize,
    /// Nodes removed.
    pub nodes_removed: usize,
    /// Connections added.
    pub edges_added: usize,
    /// Connections modified.
    pub edges_modified: usize,
    /// Connections removed.
    pub edges_removed: usize,
}

/// Ordered list of change records.
///
/// Ordering: nodes before connections; within each, additions, then
/// modifications, then removals.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(Vec<ChangeRecord>);

impl ChangeSet {
    /// Wrap records already in emission order.
    pub fn new(records: Vec<ChangeRecord>) -> Self {
        Self(records)
    }

    /// All records in order.
    pub fn records(&self) -> &[ChangeRecord] {
        &self.0
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no changes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.0.iter()
    }

    /// Records matching an entity type and action.
    pub fn filter(&self, entity_type: EntityType, action: ChangeAction) -> Vec<&ChangeRecord> {
        self.0
            .iter()
            .filter(|r| r.entity_type == entity_type && r.action == action)
            .collect()
    }

    /// Added nodes.
    pub fn added_nodes(&self) -> Vec<&ChangeRecord> {
        self.filter(EntityType::Node, ChangeAction::Add)
    }

    /// Modified nodes.
    pub fn modified_nodes(&self) -> Vec<&ChangeRecord> {
        self.filter(EntityType::Node, ChangeAction::Modify)
    }

    /// Removed nodes.
    pub fn removed_nodes(&self) -> Vec<&ChangeRecord> {
        self.filter(EntityType::Node, ChangeAction::Remove)
    }

    /// Added connections.
    pub fn added_edges(&self) -> Vec<&ChangeRecord> {
        self.filter(EntityType::Connection, ChangeAction::Add)
    }

    /// Modified connections.
    pub fn modified_edges(&self) -> Vec<&ChangeRecord> {
        self.filter(EntityType::Connection, ChangeAction::Modify)
    }

    /// Removed connections.
    pub fn removed_edges(&self) -> Vec<&ChangeRecord> {
        self.filter(EntityType::Connection, ChangeAction::Remove)
    }

    /// Per-type, per-action counts.
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for record in &self.0 {
            let slot = match (record.entity_type, record.action) {
                (EntityType::Node, ChangeAction::Add) => &mut summary.nodes_added,
                (EntityType::Node, ChangeAction::Modify) => &mut summary.nodes_modified,
                (EntityType::Node, ChangeAction::Remove) => &mut summary.nodes_removed,
                (EntityType::Connection, ChangeAction::Add) => &mut summary.edges_added,
                (EntityType::Connection, ChangeAction::Modify) => &mut summary.edges_modified,
                (EntityType::Connection, ChangeAction::Remove) => &mut summary.edges_removed,
            };
            *slot += 1;
        }
        summary
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
