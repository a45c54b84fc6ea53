//! Versions: one author's persisted snapshot of a roadmap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::edge::{Edge, EdgeId};
use super::node::{Node, NodeId};
use super::snapshot::GraphSnapshot;
use super::vote::VoteCounts;

/// Unique identifier for a persisted version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(Uuid);

impl VersionId {
    /// Create a VersionId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a VersionId from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Generate a new random VersionId.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for VersionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identity of an author or voter, supplied by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    /// Create an author id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a shared roadmap.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadmapId(String);

impl RoadmapId {
    /// Create a roadmap id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoadmapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One author's persisted snapshot of a roadmap with its vote aggregate.
///
/// At most one version exists per (author, roadmap); saving again updates
/// this row in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Version identifier (stable across updates).
    pub id: VersionId,
    /// Roadmap this version belongs to.
    pub roadmap_id: RoadmapId,
    /// Author who owns this version.
    pub author_id: AuthorId,
    /// Nodes by id.
    pub nodes: BTreeMap<NodeId, Node>,
    /// Edges by id.
    pub edges: BTreeMap<EdgeId, Edge>,
    /// Author's description.
    pub description: String,
    /// First save.
    pub created_at: DateTime<Utc>,
    /// Most recent save.
    pub updated_at: DateTime<Utc>,
    /// Community votes on this version.
    pub vote_counts: VoteCounts,
}

impl Version {
    /// Create a fresh, unvoted version.
    pub fn new(
        author_id: AuthorId,
        roadmap_id: RoadmapId,
        snapshot: GraphSnapshot,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VersionId::random(),
            roadmap_id,
            author_id,
            nodes: snapshot.nodes,
            edges: snapshot.edges,
            description: description.into(),
            created_at: now,
            updated_at: now,
            vote_counts: VoteCounts::default(),
        }
    }

    /// The graph content of this version as a snapshot based on it.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            baseline: Some(self.id),
        }
    }
}
