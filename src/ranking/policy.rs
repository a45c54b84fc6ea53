//! Ranking policy: quality tier thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical quality label derived from vote volume and approval ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Below every threshold.
    Normal,
    /// Small but positive following.
    Fair,
    /// Solid approval.
    Good,
    /// Broad, strong approval.
    Excellent,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Fair => write!(f, "fair"),
            Self::Good => write!(f, "good"),
            Self::Excellent => write!(f, "excellent"),
        }
    }
}

/// Minimum vote volume and approval ratio for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThreshold {
    /// Minimum total votes.
    pub min_votes: u32,
    /// Minimum positive ratio in `[0, 1]`.
    pub min_ratio: f64,
}

impl TierThreshold {
    /// Create a threshold.
    pub fn new(min_votes: u32, min_ratio: f64) -> Self {
        Self {
            min_votes,
            min_ratio: min_ratio.clamp(0.0, 1.0),
        }
    }

    /// Whether the given volume and ratio meet this threshold.
    pub fn admits(&self, total: u32, ratio: f64) -> bool {
        total >= self.min_votes && ratio >= self.min_ratio
    }
}

/// Thresholds for each tier above `Normal`.
///
/// Tiers are checked from `excellent` down; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingPolicy {
    /// Threshold for [`QualityTier::Excellent`].
    pub excellent: TierThreshold,
    /// Threshold for [`QualityTier::Good`].
    pub good: TierThreshold,
    /// Threshold for [`QualityTier::Fair`].
    pub fair: TierThreshold,
}

impl RankingPolicy {
    /// Classify a vote volume and ratio.
    pub fn tier(&self, total: u32, ratio: f64) -> QualityTier {
        if self.excellent.admits(total, ratio) {
            QualityTier::Excellent
        } else if self.good.admits(total, ratio) {
            QualityTier::Good
        } else if self.fair.admits(total, ratio) {
            QualityTier::Fair
        } else {
            QualityTier::Normal
        }
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            excellent: TierThreshold::new(10, 0.8),
            good: TierThreshold::new(5, 0.7),
            fair: TierThreshold::new(3, 0.6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers() {
        let policy = RankingPolicy::default();
        assert_eq!(policy.tier(10, 0.9), QualityTier::Excellent);
        assert_eq!(policy.tier(10, 0.75), QualityTier::Good);
        assert_eq!(policy.tier(4, 0.75), QualityTier::Fair);
        assert_eq!(policy.tier(2, 1.0), QualityTier::Normal);
        assert_eq!(policy.tier(100, 0.5), QualityTier::Normal);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let policy = RankingPolicy::default();
        assert_eq!(policy.tier(5, 0.7), QualityTier::Good);
        assert_eq!(policy.tier(3, 0.6), QualityTier::Fair);
    }
}
