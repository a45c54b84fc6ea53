//! Error taxonomy for roadmap operations.
//!
//! Pure engines (diff, ranking, alignment) do not fail. Everything that
//! mutates shared state returns [`RoadmapError`].

use crate::store::StoreError;
use crate::types::{AuthorId, ProposalId, ProposalStatus, RoadmapId, VersionId};

/// Errors surfaced by the proposal manager, autosave scheduler and stores.
#[derive(Debug, thiserror::Error)]
pub enum RoadmapError {
    /// A proposal was created from an empty diff.
    #[error("Proposal has no changes")]
    NoChanges,

    /// The author already has a pending proposal for this roadmap.
    #[error("Author {author_id} already has a pending proposal for roadmap {roadmap_id}")]
    DuplicatePendingProposal {
        /// Author of the existing proposal.
        author_id: AuthorId,
        /// Roadmap it targets.
        roadmap_id: RoadmapId,
    },

    /// Operation not allowed from the proposal's current status.
    #[error("Cannot {operation} proposal {proposal_id} in status {status}")]
    InvalidState {
        /// Proposal involved.
        proposal_id: ProposalId,
        /// Its status at the time of the call.
        status: ProposalStatus,
        /// Attempted operation.
        operation: &'static str,
    },

    /// A mutating call was made without identity.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Proposal does not exist.
    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    /// Version does not exist.
    #[error("Version not found: {0}")]
    VersionNotFound(VersionId),

    /// Storage unreachable or write rejected.
    #[error("Persistence error: {0}")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for RoadmapError {
    /// Lifts store errors that carry domain meaning into their own variants.
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicatePending { author_id, roadmap_id } => {
                Self::DuplicatePendingProposal { author_id, roadmap_id }
            }
            StoreError::ProposalNotFound(id) => Self::ProposalNotFound(id),
            StoreError::VersionNotFound(id) => Self::VersionNotFound(id),
            other => Self::Persistence(other),
        }
    }
}

impl RoadmapError {
    /// Machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoChanges => "NO_CHANGES",
            Self::DuplicatePendingProposal { .. } => "DUPLICATE_PENDING_PROPOSAL",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::ProposalNotFound(_) => "PROPOSAL_NOT_FOUND",
            Self::VersionNotFound(_) => "VERSION_NOT_FOUND",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}
