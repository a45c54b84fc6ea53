//! Service middleware and metric records.
//!
//! ## Metrics Exposed
//!
//! Emitted as `tracing` events under the `roadmap_kernel::metrics` target:
//! - `request_metric`: path pattern, method, status, latency
//! - `ranking_metric`: versions ranked per listing
//! - `vote_metric`: votes by subject and value
//! - `proposal_metric`: proposal lifecycle events

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

use crate::types::{ProposalStatus, VoteValue};

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "roadmap_kernel::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Roadmap ids and UUIDs become placeholders.
fn normalize_path(path: &str) -> String {
    static PATTERNS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();

    let patterns = PATTERNS.get_or_init(|| {
        let roadmap = Regex::new(r"^/api/roadmaps/[^/]+").ok()?;
        let uuid =
            Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").ok()?;
        Some((roadmap, uuid))
    });

    match patterns {
        Some((roadmap, uuid)) => {
            let path = roadmap.replace(path, "/api/roadmaps/:roadmap_id");
            uuid.replace_all(&path, ":id").into_owned()
        }
        None => path.to_string(),
    }
}

/// Record a ranked listing.
pub fn record_ranking_metrics(version_count: usize, latency_ms: u64) {
    info!(
        target: "roadmap_kernel::metrics",
        metric_type = "ranking",
        version_count = version_count,
        latency_ms = latency_ms,
        "ranking_metric"
    );
}

/// Record a vote on a version or proposal.
pub fn record_vote(subject: &str, value: VoteValue) {
    info!(
        target: "roadmap_kernel::metrics",
        metric_type = "vote",
        subject = subject,
        value = %value,
        "vote_metric"
    );
}

/// Record a proposal lifecycle event.
pub fn record_proposal_event(event: &str, status: ProposalStatus, change_count: usize) {
    info!(
        target: "roadmap_kernel::metrics",
        metric_type = "proposal",
        event = event,
        status = %status,
        change_count = change_count,
        "proposal_metric"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_replaces_uuid() {
        let path = "/api/proposals/550e8400-e29b-41d4-a716-446655440000/votes";
        assert_eq!(normalize_path(path), "/api/proposals/:id/votes");
    }

    #[test]
    fn test_normalize_path_replaces_roadmap_id() {
        assert_eq!(
            normalize_path("/api/roadmaps/frontend-2024/versions/mine"),
            "/api/roadmaps/:roadmap_id/versions/mine"
        );
    }

    #[test]
    fn test_normalize_path_diff_route() {
        let path = "/api/versions/550e8400-e29b-41d4-a716-446655440000/diff/6ba7b810-9dad-11d1-80b4-00c04fd430c8";
        assert_eq!(normalize_path(path), "/api/versions/:id/diff/:id");
    }

    #[test]
    fn test_normalize_path_preserves_regular_path() {
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }
}
