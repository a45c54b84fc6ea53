//! Core types for the roadmap kernel.

pub mod node;
pub mod edge;
pub mod snapshot;
pub mod change;
pub mod vote;
pub mod version;
pub mod proposal;

pub use node::{
    LineOrientation, Node, NodeContent, NodeId, Position, Size, DEFAULT_NODE_HEIGHT,
    DEFAULT_NODE_WIDTH, KNOWN_NODE_KINDS,
};
pub use edge::{Edge, EdgeId, EdgeStyle, LineKind, ArrowKind};
pub use snapshot::{GraphSnapshot, SnapshotError};
pub use change::{ChangeRecord, ChangeSet, ChangeSummary, EntityType, ChangeAction};
pub use vote::{Vote, VoteValue, VoteCounts};
pub use version::{Version, VersionId, AuthorId, RoadmapId};
pub use proposal::{Proposal, ProposalId, ProposalStatus, AppliedChangeSet};
