//! Community ranking of competing versions.

pub mod policy;
pub mod scoring;

pub use policy::{QualityTier, RankingPolicy, TierThreshold};
pub use scoring::{rank, rank_with_policy, score, RankedVersion};
