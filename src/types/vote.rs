//! Votes and vote aggregates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::version::AuthorId;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    /// In favor (upvote).
    Approve,
    /// Against (downvote).
    Reject,
}

impl VoteValue {
    /// Parse a vote value from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "approve" | "up" => Some(Self::Approve),
            "reject" | "down" => Some(Self::Reject),
            _ => None,
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// One voter's vote. At most one exists per (subject, voter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Who voted.
    pub voter_id: AuthorId,
    /// Direction.
    pub value: VoteValue,
    /// Optional free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// When the vote was (last) cast.
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    /// Create a vote cast now.
    pub fn new(voter_id: AuthorId, value: VoteValue, comment: Option<String>) -> Self {
        Self {
            voter_id,
            value,
            comment,
            cast_at: Utc::now(),
        }
    }
}

/// Aggregated vote counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteCounts {
    /// Total votes.
    pub total: u32,
    /// Approving votes.
    pub up: u32,
    /// Rejecting votes.
    pub down: u32,
}

impl VoteCounts {
    /// Create counts from up and down tallies.
    pub fn new(up: u32, down: u32) -> Self {
        Self {
            total: up + down,
            up,
            down,
        }
    }

    /// Tally a set of vote values.
    pub fn tally<I>(values: I) -> Self
    where
        I: IntoIterator<Item = VoteValue>,
    {
        let (up, down) = values.into_iter().fold((0, 0), |(up, down), v| match v {
            VoteValue::Approve => (up + 1, down),
            VoteValue::Reject => (up, down + 1),
        });
        Self::new(up, down)
    }

    /// Share of approving votes in `[0, 1]`; zero when there are no votes.
    pub fn positive_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.up) / f64::from(self.total)
        }
    }
}
