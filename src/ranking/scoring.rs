//! Community scoring and ordering of versions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::Version;
use super::policy::{QualityTier, RankingPolicy};

/// Compute the community score for a vote tally.
///
/// Formula:
/// ```text
/// positive_ratio = up / total        (0 when total = 0)
/// score          = total * positive_ratio
/// ```
pub fn score(total: u32, up: u32) -> (f64, f64) {
    let ratio = if total > 0 {
        f64::from(up) / f64::from(total)
    } else {
        0.0
    };
    (f64::from(total) * ratio, ratio)
}

/// A version with its derived ranking fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVersion {
    /// The ranked version.
    #[serde(flatten)]
    pub version: Version,
    /// Community score.
    pub score: f64,
    /// Share of approving votes.
    pub positive_ratio: f64,
    /// Quality tier.
    pub quality_tier: QualityTier,
    /// 1-based position after sorting.
    pub rank: usize,
}

/// Rank versions with the default policy.
pub fn rank(versions: &[Version]) -> Vec<RankedVersion> {
    rank_with_policy(versions, &RankingPolicy::default())
}

/// Rank versions: score descending, ties by earliest `created_at`, then id.
///
/// Deterministic for a given input set regardless of input order.
pub fn rank_with_policy(versions: &[Version], policy: &RankingPolicy) -> Vec<RankedVersion> {
    let mut ranked: Vec<RankedVersion> = versions
        .iter()
        .map(|version| {
            let counts = version.vote_counts;
            let (score, positive_ratio) = score(counts.total, counts.up);
            RankedVersion {
                version: version.clone(),
                score,
                positive_ratio,
                quality_tier: policy.tier(counts.total, positive_ratio),
                rank: 0,
            }
        })
        .collect();

    ranked.sort_by(compare_ranked);

    for (i, entry) in ranked.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    tracing::debug!(versions = ranked.len(), "Ranked versions");
    ranked
}

fn compare_ranked(a: &RankedVersion, b: &RankedVersion) -> Ordering {
    // Primary: higher score first
    // Secondary: earlier creation first
    // Tertiary: by VersionId for determinism
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.version.created_at.cmp(&b.version.created_at))
        .then_with(|| a.version.id.cmp(&b.version.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorId, GraphSnapshot, RoadmapId, VersionId, VoteCounts};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn make_version(id: u128, up: u32, down: u32, created_secs: i64) -> Version {
        let mut version = Version::new(
            AuthorId::new(format!("author-{id}")),
            RoadmapId::new("rust"),
            GraphSnapshot::new(),
            "",
        );
        version.id = VersionId::new(Uuid::from_u128(id));
        version.vote_counts = VoteCounts::new(up, down);
        version.created_at = Utc.timestamp_opt(created_secs, 0).unwrap();
        version
    }

    #[test]
    fn test_excellent_version() {
        let ranked = rank(&[make_version(1, 9, 1, 0)]);

        assert_eq!(ranked[0].positive_ratio, 0.9);
        assert_eq!(ranked[0].score, 9.0);
        assert_eq!(ranked[0].quality_tier, QualityTier::Excellent);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_below_fair_quorum_is_normal() {
        let ranked = rank(&[make_version(1, 2, 0, 0)]);
        assert_eq!(ranked[0].quality_tier, QualityTier::Normal);
    }

    #[test]
    fn test_no_votes_scores_zero() {
        let ranked = rank(&[make_version(1, 0, 0, 0)]);
        assert_eq!(ranked[0].score, 0.0);
        assert_eq!(ranked[0].positive_ratio, 0.0);
    }

    #[test]
    fn test_sorted_by_score_desc() {
        let ranked = rank(&[
            make_version(1, 1, 4, 0),
            make_version(2, 8, 0, 0),
            make_version(3, 4, 1, 0),
        ]);

        let order: Vec<_> = ranked.iter().map(|r| r.version.id.as_uuid().as_u128()).collect();
        assert_eq!(order, vec![2, 3, 1]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_prefer_earliest_created() {
        let ranked = rank(&[
            make_version(1, 3, 0, 2_000),
            make_version(2, 3, 1, 1_000),
            make_version(3, 3, 2, 1_000),
        ]);

        let order: Vec<_> = ranked.iter().map(|r| r.version.id.as_uuid().as_u128()).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    proptest! {
        #[test]
        fn prop_rank_is_deterministic(
            tallies in prop::collection::vec((0u32..20, 0u32..20, 0i64..5), 0..12)
        ) {
            let versions: Vec<Version> = tallies
                .iter()
                .enumerate()
                .map(|(i, (up, down, created))| make_version(i as u128 + 1, *up, *down, *created))
                .collect();
            let mut reversed = versions.clone();
            reversed.reverse();

            let first = rank(&versions);
            let second = rank(&versions);
            let from_reversed = rank(&reversed);

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first, &from_reversed);
        }
    }
}
