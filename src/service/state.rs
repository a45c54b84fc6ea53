//! Service state and configuration.

use std::sync::Arc;

use crate::proposal::{ProposalManager, ResolutionPolicy};
use crate::ranking::RankingPolicy;
use crate::store::{ProposalStore, VersionStore};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines (production).
    Json,
    /// Human-readable output (development).
    Pretty,
}

impl LogFormat {
    /// Parse a log format; anything but `pretty` means JSON.
    pub fn from_str(s: &str) -> Self {
        if s.eq_ignore_ascii_case("pretty") {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Service configuration.
///
/// Environment variables:
/// - `HOST`: bind host (default: 0.0.0.0)
/// - `PORT`: bind port (default: 8001)
/// - `LOG_FORMAT`: `json` or `pretty` (default: json)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            log_format: std::env::var("LOG_FORMAT")
                .map(|s| LogFormat::from_str(&s))
                .unwrap_or(defaults.log_format),
        }
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            log_format: LogFormat::Json,
        }
    }
}

/// Shared service state.
///
/// Holds the store and the policies every handler needs.
pub struct ServiceState<S: VersionStore + ProposalStore + 'static> {
    /// Backing store for versions and proposals.
    pub store: Arc<S>,
    /// Proposal lifecycle over the same store.
    pub proposals: ProposalManager<S>,
    /// Tier thresholds for ranked listings.
    pub ranking_policy: RankingPolicy,
}

impl<S: VersionStore + ProposalStore + 'static> ServiceState<S> {
    /// Create service state with default policies.
    pub fn new(store: S) -> Self {
        Self::with_policies(store, RankingPolicy::default(), ResolutionPolicy::default())
    }

    /// Create service state with explicit policies.
    pub fn with_policies(
        store: S,
        ranking_policy: RankingPolicy,
        resolution: ResolutionPolicy,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            proposals: ProposalManager::with_policy(Arc::clone(&store), resolution),
            store,
            ranking_policy,
        }
    }
}

impl<S: VersionStore + ProposalStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            proposals: self.proposals.clone(),
            ranking_policy: self.ranking_policy,
        }
    }
}
