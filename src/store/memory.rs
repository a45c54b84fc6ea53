//! In-memory roadmap store for tests and single-process use.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::types::{
    AuthorId, GraphSnapshot, Proposal, ProposalId, ProposalStatus, RoadmapId, Version, VersionId,
    Vote, VoteCounts, VoteValue,
};
use super::{ProposalStore, StoreError, VersionStore};

#[derive(Debug, Default)]
struct Inner {
    /// Versions by ID.
    versions: BTreeMap<VersionId, Version>,
    /// (author, roadmap) -> version. The uniqueness constraint.
    by_author: BTreeMap<(AuthorId, RoadmapId), VersionId>,
    /// Version -> voter -> vote.
    version_votes: BTreeMap<VersionId, BTreeMap<AuthorId, VoteValue>>,
    /// Proposals by ID.
    proposals: BTreeMap<ProposalId, Proposal>,
}

/// In-memory store implementing both [`VersionStore`] and [`ProposalStore`].
///
/// One lock guards all state, so each trait call is atomic.
#[derive(Debug, Default)]
pub struct InMemoryRoadmapStore {
    inner: Mutex<Inner>,
}

impl InMemoryRoadmapStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of versions.
    pub fn num_versions(&self) -> usize {
        self.inner.lock().versions.len()
    }

    /// Get number of proposals.
    pub fn num_proposals(&self) -> usize {
        self.inner.lock().proposals.len()
    }
}

#[async_trait]
impl VersionStore for InMemoryRoadmapStore {
    async fn upsert_version(
        &self,
        author_id: &AuthorId,
        roadmap_id: &RoadmapId,
        snapshot: &GraphSnapshot,
        description: &str,
    ) -> Result<Version, StoreError> {
        let mut inner = self.inner.lock();
        let key = (author_id.clone(), roadmap_id.clone());

        if let Some(id) = inner.by_author.get(&key).copied() {
            if let Some(version) = inner.versions.get_mut(&id) {
                version.nodes = snapshot.nodes.clone();
                version.edges = snapshot.edges.clone();
                version.description = description.to_string();
                version.updated_at = Utc::now();
                return Ok(version.clone());
            }
        }

        let version =
            Version::new(author_id.clone(), roadmap_id.clone(), snapshot.clone(), description);
        inner.by_author.insert(key, version.id);
        inner.versions.insert(version.id, version.clone());
        Ok(version)
    }

    async fn list_public(&self, roadmap_id: &RoadmapId) -> Result<Vec<Version>, StoreError> {
        let inner = self.inner.lock();
        let mut versions: Vec<Version> = inner
            .versions
            .values()
            .filter(|v| &v.roadmap_id == roadmap_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(versions)
    }

    async fn get_version(&self, id: &VersionId) -> Result<Option<Version>, StoreError> {
        Ok(self.inner.lock().versions.get(id).cloned())
    }

    async fn get_by_author(
        &self,
        author_id: &AuthorId,
        roadmap_id: &RoadmapId,
    ) -> Result<Option<Version>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .by_author
            .get(&(author_id.clone(), roadmap_id.clone()))
            .and_then(|id| inner.versions.get(id))
            .cloned())
    }

    async fn record_version_vote(
        &self,
        version_id: &VersionId,
        voter_id: &AuthorId,
        value: VoteValue,
    ) -> Result<Version, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.versions.contains_key(version_id) {
            return Err(StoreError::VersionNotFound(*version_id));
        }

        let votes = inner.version_votes.entry(*version_id).or_default();
        votes.insert(voter_id.clone(), value);
        let counts = VoteCounts::tally(votes.values().copied());

        let version = inner
            .versions
            .get_mut(version_id)
            .ok_or(StoreError::VersionNotFound(*version_id))?;
        version.vote_counts = counts;
        Ok(version.clone())
    }
}

#[async_trait]
impl ProposalStore for InMemoryRoadmapStore {
    async fn insert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();

        if proposal.status == ProposalStatus::Pending {
            let duplicate = inner.proposals.values().any(|p| {
                p.status == ProposalStatus::Pending
                    && p.author_id == proposal.author_id
                    && p.roadmap_id == proposal.roadmap_id
            });
            if duplicate {
                return Err(StoreError::DuplicatePending {
                    author_id: proposal.author_id.clone(),
                    roadmap_id: proposal.roadmap_id.clone(),
                });
            }
        }

        inner.proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn get_proposal(&self, id: &ProposalId) -> Result<Option<Proposal>, StoreError> {
        Ok(self.inner.lock().proposals.get(id).cloned())
    }

    async fn list_by_roadmap(&self, roadmap_id: &RoadmapId) -> Result<Vec<Proposal>, StoreError> {
        let inner = self.inner.lock();
        let mut proposals: Vec<Proposal> = inner
            .proposals
            .values()
            .filter(|p| &p.roadmap_id == roadmap_id)
            .cloned()
            .collect();
        proposals.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(proposals)
    }

    async fn upsert_vote(
        &self,
        proposal_id: &ProposalId,
        vote: &Vote,
    ) -> Result<Proposal, StoreError> {
        let mut inner = self.inner.lock();
        let proposal = inner
            .proposals
            .get_mut(proposal_id)
            .ok_or(StoreError::ProposalNotFound(*proposal_id))?;

        if proposal.status == ProposalStatus::Applied {
            return Err(StoreError::StatusConflict {
                proposal_id: *proposal_id,
                expected: ProposalStatus::Pending,
                actual: proposal.status,
            });
        }

        proposal.upsert_vote(vote.clone());
        Ok(proposal.clone())
    }

    async fn transition_status(
        &self,
        proposal_id: &ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
    ) -> Result<Proposal, StoreError> {
        let mut inner = self.inner.lock();
        let proposal = inner
            .proposals
            .get_mut(proposal_id)
            .ok_or(StoreError::ProposalNotFound(*proposal_id))?;

        if proposal.status != from {
            return Err(StoreError::StatusConflict {
                proposal_id: *proposal_id,
                expected: from,
                actual: proposal.status,
            });
        }

        proposal.status = to;
        proposal.updated_at = Utc::now();
        Ok(proposal.clone())
    }
}
