//! Persistence backends for versions, proposals and votes.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::types::{
    AuthorId, GraphSnapshot, Proposal, ProposalId, ProposalStatus, RoadmapId, Version, VersionId,
    Vote, VoteValue,
};

/// Error type shared by store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A pending proposal already exists for this (author, roadmap).
    #[error("Pending proposal already exists for author {author_id} on roadmap {roadmap_id}")]
    DuplicatePending {
        /// Author.
        author_id: AuthorId,
        /// Roadmap.
        roadmap_id: RoadmapId,
    },
    /// Proposal not found.
    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),
    /// Version not found.
    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),
    /// Compare-and-set on status failed, or the proposal no longer accepts the write.
    #[error("Proposal {proposal_id} is {actual}, expected {expected}")]
    StatusConflict {
        /// Proposal.
        proposal_id: ProposalId,
        /// Status the caller expected.
        expected: ProposalStatus,
        /// Status found in the store.
        actual: ProposalStatus,
    },
    /// Stored JSON could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Backend unreachable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// Database error.
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage for versions: at most one per (author, roadmap).
///
/// Implementations must make `upsert_version` a single keyed
/// insert-or-replace and `record_version_vote` atomic per voter.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Create the author's version for this roadmap, or update it in place.
    ///
    /// The version id and `created_at` survive updates; votes are kept.
    async fn upsert_version(
        &self,
        author_id: &AuthorId,
        roadmap_id: &RoadmapId,
        snapshot: &GraphSnapshot,
        description: &str,
    ) -> Result<Version, StoreError>;

    /// All versions of a roadmap, ordered by creation time then id.
    async fn list_public(&self, roadmap_id: &RoadmapId) -> Result<Vec<Version>, StoreError>;

    /// Fetch a version by id.
    async fn get_version(&self, id: &VersionId) -> Result<Option<Version>, StoreError>;

    /// Fetch an author's version of a roadmap.
    async fn get_by_author(
        &self,
        author_id: &AuthorId,
        roadmap_id: &RoadmapId,
    ) -> Result<Option<Version>, StoreError>;

    /// Record (or change) a voter's vote on a version and return the
    /// version with fresh counts.
    async fn record_version_vote(
        &self,
        version_id: &VersionId,
        voter_id: &AuthorId,
        value: VoteValue,
    ) -> Result<Version, StoreError>;

    /// Check if the backend is reachable.
    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Storage for proposals and their votes.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Insert a new proposal.
    ///
    /// Fails with [`StoreError::DuplicatePending`] if the proposal is pending
    /// and the author already has a pending proposal for the roadmap.
    async fn insert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError>;

    /// Fetch a proposal with all its votes.
    async fn get_proposal(&self, id: &ProposalId) -> Result<Option<Proposal>, StoreError>;

    /// All proposals of a roadmap, newest first.
    async fn list_by_roadmap(&self, roadmap_id: &RoadmapId) -> Result<Vec<Proposal>, StoreError>;

    /// Insert the vote or replace this voter's earlier one, atomically,
    /// returning the proposal with every vote.
    ///
    /// Applied proposals no longer accept votes.
    async fn upsert_vote(
        &self,
        proposal_id: &ProposalId,
        vote: &Vote,
    ) -> Result<Proposal, StoreError>;

    /// Set the status to `to` iff it is currently `from`.
    async fn transition_status(
        &self,
        proposal_id: &ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
    ) -> Result<Proposal, StoreError>;
}

pub use memory::InMemoryRoadmapStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresRoadmapStore;
