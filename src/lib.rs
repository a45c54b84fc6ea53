//! # roadmap-kernel
//!
//! Versioning, review and ranking for community-edited roadmap graphs.
//!
//! Many authors keep competing versions of the same roadmap. This crate
//! answers three questions about them:
//!
//! > What changed between two graphs? Which edits does the community accept?
//! > Which versions are best?
//!
//! ## Architecture
//!
//! ```text
//!  live edits ──▶ alignment (per drag frame)
//!      │
//!      ├──▶ autosave ──▶ VersionStore ──▶ ranking
//!      │
//!      └──▶ diff(baseline, current) ──▶ ProposalManager ──▶ ProposalStore
//! ```
//!
//! ## Determinism Guarantees
//!
//! - `diff` output order is canonical: nodes before connections, additions
//!   before modifications before removals, ids ascending
//! - Entity equality is canonical-JSON equality of the fully defaulted entity
//! - `rank` orders by score, then earliest creation, then id
//! - Snap deltas pick the smallest offset; the first candidate wins ties

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alignment;
pub mod autosave;
pub mod canonical;
pub mod diff;
pub mod error;
pub mod proposal;
pub mod ranking;
pub mod session;
pub mod store;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    AppliedChangeSet, ArrowKind, AuthorId, ChangeAction, ChangeRecord, ChangeSet, ChangeSummary,
    Edge, EdgeId, EdgeStyle, EntityType, GraphSnapshot, LineKind, LineOrientation, Node,
    NodeContent, NodeId, Position, Proposal, ProposalId, ProposalStatus, RoadmapId, Size,
    SnapshotError, Version, VersionId, Vote, VoteCounts, VoteValue, KNOWN_NODE_KINDS,
};
pub use alignment::{
    compute_guide_lines, compute_snap_delta, AlignmentConfig, Anchor, Axis, GuideLine, NodeRect,
    SnapDelta, DEFAULT_SNAP_THRESHOLD,
};
pub use autosave::{
    AutosaveAction, AutosaveConfig, AutosaveMachine, AutosaveScheduler, AutosaveState, SaveOutcome,
};
#[cfg(feature = "runtime")]
pub use autosave::{spawn_autosave, AutosaveHandle};
pub use canonical::{canonical_eq, canonical_hash, canonical_hash_hex, to_canonical_bytes};
pub use diff::{diff, edge_display_text, UNKNOWN_NODE_LABEL};
pub use error::RoadmapError;
pub use proposal::{ProposalManager, ResolutionPolicy};
pub use ranking::{rank, rank_with_policy, QualityTier, RankedVersion, RankingPolicy, TierThreshold};
pub use session::Session;
pub use store::{InMemoryRoadmapStore, ProposalStore, StoreError, VersionStore};
#[cfg(feature = "postgres")]
pub use store::{postgres::PostgresConfig, PostgresRoadmapStore};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceConfig, ServiceState};

/// Schema version for all serialized roadmap types.
/// Increment on breaking changes to any wire type.
pub const ROADMAP_SCHEMA_VERSION: &str = "1.0.0";
