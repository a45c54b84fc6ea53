//! Proposal lifecycle: diff-gated creation, vote resolution, application.
//!
//! ```text
//!            votes                      apply
//! Pending ─────────▶ Approved ───────────────▶ Applied
//!    │
//!    └──────────────▶ Rejected
//! ```
//!
//! Resolution is monotonic: status only ever leaves `Pending` through a
//! compare-and-set in the store, so later votes cannot move it back.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::diff::diff;
use crate::error::RoadmapError;
use crate::session::Session;
use crate::store::{ProposalStore, StoreError};
use crate::types::{
    AppliedChangeSet, GraphSnapshot, Proposal, ProposalId, ProposalStatus, RoadmapId, VersionId,
    Vote, VoteCounts, VoteValue,
};

/// Vote thresholds that resolve a pending proposal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPolicy {
    /// Minimum total votes before any resolution.
    pub quorum: u32,
    /// Minimum approve share for approval.
    pub approve_ratio: f64,
}

impl ResolutionPolicy {
    /// Status implied by `counts`, given the current status.
    ///
    /// Only `Pending` can change; every other status is returned as is.
    pub fn resolve(&self, current: ProposalStatus, counts: VoteCounts) -> ProposalStatus {
        if current != ProposalStatus::Pending || counts.total < self.quorum {
            return current;
        }
        if counts.up > counts.down && counts.positive_ratio() >= self.approve_ratio {
            ProposalStatus::Approved
        } else if counts.down > counts.up {
            ProposalStatus::Rejected
        } else {
            ProposalStatus::Pending
        }
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            quorum: 5,
            approve_ratio: 0.6,
        }
    }
}

/// Coordinates proposals against a [`ProposalStore`].
pub struct ProposalManager<S: ProposalStore> {
    store: Arc<S>,
    policy: ResolutionPolicy,
}

impl<S: ProposalStore> ProposalManager<S> {
    /// Create a manager with the default resolution policy.
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, ResolutionPolicy::default())
    }

    /// Create a manager with a custom resolution policy.
    pub fn with_policy(store: Arc<S>, policy: ResolutionPolicy) -> Self {
        Self { store, policy }
    }

    /// The resolution policy in effect.
    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Propose the edits from `baseline` to `current` on the session's roadmap.
    pub async fn create(
        &self,
        session: &Session,
        baseline_version_id: Option<VersionId>,
        baseline: &GraphSnapshot,
        current: &GraphSnapshot,
        description: impl Into<String>,
    ) -> Result<Proposal, RoadmapError> {
        let author_id = session.require_author()?;

        let changes = diff(baseline, current);
        if changes.is_empty() {
            return Err(RoadmapError::NoChanges);
        }

        let now = Utc::now();
        let proposal = Proposal {
            id: ProposalId::random(),
            roadmap_id: session.roadmap_id.clone(),
            author_id: author_id.clone(),
            baseline_version_id: baseline_version_id.or(baseline.baseline),
            changes,
            proposed: current.clone(),
            description: description.into(),
            status: ProposalStatus::Pending,
            votes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert_proposal(&proposal).await?;

        tracing::info!(
            proposal_id = %proposal.id,
            roadmap_id = %proposal.roadmap_id,
            author_id = %proposal.author_id,
            changes = proposal.changes.len(),
            "Proposal created"
        );
        Ok(proposal)
    }

    /// Cast or change the session author's vote, then resolve.
    pub async fn vote(
        &self,
        session: &Session,
        proposal_id: &ProposalId,
        value: VoteValue,
        comment: Option<String>,
    ) -> Result<Proposal, RoadmapError> {
        let voter_id = session.require_author()?;
        let vote = Vote::new(voter_id.clone(), value, comment);

        let proposal = self
            .store
            .upsert_vote(proposal_id, &vote)
            .await
            .map_err(|e| self.map_status_error(e, "vote on"))?;

        let counts = proposal.vote_counts();
        let resolved = self.policy.resolve(proposal.status, counts);
        if resolved == proposal.status {
            return Ok(proposal);
        }

        match self
            .store
            .transition_status(proposal_id, ProposalStatus::Pending, resolved)
            .await
        {
            Ok(updated) => {
                tracing::info!(
                    proposal_id = %proposal_id,
                    status = %resolved,
                    total = counts.total,
                    up = counts.up,
                    down = counts.down,
                    "Proposal resolved"
                );
                Ok(updated)
            }
            // Another voter resolved it first; their decision stands.
            Err(StoreError::StatusConflict { .. }) => self.get(proposal_id).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Apply an approved proposal. Valid exactly once.
    pub async fn apply(
        &self,
        session: &Session,
        proposal_id: &ProposalId,
    ) -> Result<AppliedChangeSet, RoadmapError> {
        session.require_author()?;

        let proposal = self
            .store
            .transition_status(proposal_id, ProposalStatus::Approved, ProposalStatus::Applied)
            .await
            .map_err(|e| self.map_status_error(e, "apply"))?;

        tracing::info!(
            proposal_id = %proposal_id,
            roadmap_id = %proposal.roadmap_id,
            changes = proposal.changes.len(),
            "Proposal applied"
        );

        Ok(AppliedChangeSet {
            proposal_id: proposal.id,
            roadmap_id: proposal.roadmap_id,
            baseline_version_id: proposal.baseline_version_id,
            changes: proposal.changes,
            snapshot: proposal.proposed,
            applied_at: proposal.updated_at,
        })
    }

    /// Fetch one proposal.
    pub async fn get(&self, proposal_id: &ProposalId) -> Result<Proposal, RoadmapError> {
        self.store
            .get_proposal(proposal_id)
            .await?
            .ok_or(RoadmapError::ProposalNotFound(*proposal_id))
    }

    /// All proposals of a roadmap, newest first.
    pub async fn list(&self, roadmap_id: &RoadmapId) -> Result<Vec<Proposal>, RoadmapError> {
        Ok(self.store.list_by_roadmap(roadmap_id).await?)
    }

    fn map_status_error(&self, error: StoreError, operation: &'static str) -> RoadmapError {
        match error {
            StoreError::StatusConflict { proposal_id, actual, .. } => RoadmapError::InvalidState {
                proposal_id,
                status: actual,
                operation,
            },
            other => other.into(),
        }
    }
}

impl<S: ProposalStore> Clone for ProposalManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_approved() {
        let policy = ResolutionPolicy::default();
        assert_eq!(
            policy.resolve(ProposalStatus::Pending, VoteCounts::new(4, 1)),
            ProposalStatus::Approved
        );
    }

    #[test]
    fn test_resolution_rejected() {
        let policy = ResolutionPolicy::default();
        assert_eq!(
            policy.resolve(ProposalStatus::Pending, VoteCounts::new(2, 3)),
            ProposalStatus::Rejected
        );
    }

    #[test]
    fn test_resolution_needs_quorum() {
        let policy = ResolutionPolicy::default();
        assert_eq!(
            policy.resolve(ProposalStatus::Pending, VoteCounts::new(4, 0)),
            ProposalStatus::Pending
        );
    }

    #[test]
    fn test_resolution_ratio_and_tie() {
        let policy = ResolutionPolicy::default();
        // 3/6 = 0.5 and up == down: neither rule fires
        assert_eq!(
            policy.resolve(ProposalStatus::Pending, VoteCounts::new(3, 3)),
            ProposalStatus::Pending
        );
        // 3/5 = 0.6 meets the ratio exactly
        assert_eq!(
            policy.resolve(ProposalStatus::Pending, VoteCounts::new(3, 2)),
            ProposalStatus::Approved
        );
    }

    #[test]
    fn test_resolution_is_monotonic() {
        let policy = ResolutionPolicy::default();
        assert_eq!(
            policy.resolve(ProposalStatus::Approved, VoteCounts::new(0, 10)),
            ProposalStatus::Approved
        );
        assert_eq!(
            policy.resolve(ProposalStatus::Rejected, VoteCounts::new(10, 0)),
            ProposalStatus::Rejected
        );
    }
}
