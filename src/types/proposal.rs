//! Proposals: votable change sets authored against a baseline version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::change::ChangeSet;
use super::snapshot::GraphSnapshot;
use super::version::{AuthorId, RoadmapId, VersionId};
use super::vote::{Vote, VoteCounts};

/// Unique identifier for a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(Uuid);

impl ProposalId {
    /// Create a ProposalId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create a ProposalId from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Generate a new random ProposalId.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a proposal.
///
/// `Pending` moves to `Approved` or `Rejected` through votes; only
/// `Approved` may move to the terminal `Applied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Collecting votes.
    Pending,
    /// Community approved; ready to apply.
    Approved,
    /// Community rejected.
    Rejected,
    /// Merged. Terminal.
    Applied,
}

impl ProposalStatus {
    /// Parse status from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "applied" => Some(Self::Applied),
            _ => None,
        }
    }

    /// Lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Applied => "applied",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A community-votable change set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal identifier.
    pub id: ProposalId,
    /// Roadmap the proposal targets.
    pub roadmap_id: RoadmapId,
    /// Author of the proposal.
    pub author_id: AuthorId,
    /// Version the changes were computed against.
    pub baseline_version_id: Option<VersionId>,
    /// Human-readable diff from baseline to proposed.
    pub changes: ChangeSet,
    /// Proposed graph after the changes.
    pub proposed: GraphSnapshot,
    /// Author's description.
    pub description: String,
    /// Lifecycle status.
    pub status: ProposalStatus,
    /// Votes, at most one per voter.
    pub votes: Vec<Vote>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status or vote change.
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// Tally of current votes.
    pub fn vote_counts(&self) -> VoteCounts {
        VoteCounts::tally(self.votes.iter().map(|v| v.value))
    }

    /// Insert the vote or replace this voter's earlier one.
    pub fn upsert_vote(&mut self, vote: Vote) {
        match self.votes.iter_mut().find(|v| v.voter_id == vote.voter_id) {
            Some(existing) => *existing = vote,
            None => self.votes.push(vote),
        }
        self.updated_at = Utc::now();
    }
}

/// Result of applying an approved proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedChangeSet {
    /// Proposal that was applied.
    pub proposal_id: ProposalId,
    /// Roadmap it applied to.
    pub roadmap_id: RoadmapId,
    /// Baseline the changes were computed against.
    pub baseline_version_id: Option<VersionId>,
    /// The applied changes.
    pub changes: ChangeSet,
    /// Resulting graph.
    pub snapshot: GraphSnapshot,
    /// When it was applied.
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::vote::VoteValue;

    fn empty_proposal() -> Proposal {
        Proposal {
            id: ProposalId::random(),
            roadmap_id: RoadmapId::new("rust"),
            author_id: AuthorId::new("alice"),
            baseline_version_id: None,
            changes: ChangeSet::default(),
            proposed: GraphSnapshot::new(),
            description: String::new(),
            status: ProposalStatus::Pending,
            votes: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_revote_replaces_previous_vote() {
        let mut proposal = empty_proposal();
        proposal.upsert_vote(Vote::new(AuthorId::new("bob"), VoteValue::Approve, None));
        proposal.upsert_vote(Vote::new(
            AuthorId::new("bob"),
            VoteValue::Reject,
            Some("changed my mind".into()),
        ));

        assert_eq!(proposal.votes.len(), 1);
        assert_eq!(proposal.vote_counts(), VoteCounts::new(0, 1));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ProposalStatus::Pending,
            ProposalStatus::Approved,
            ProposalStatus::Rejected,
            ProposalStatus::Applied,
        ] {
            assert_eq!(ProposalStatus::from_str(status.as_str()), Some(status));
        }
    }
}
