//! Roadmap REST Service
//!
//! Exposes versions, diffs, rankings and proposals over HTTP.
//!
//! ## Endpoints
//!
//! - `GET /api/roadmaps/:roadmap_id/versions` - Ranked versions of a roadmap
//! - `PUT /api/roadmaps/:roadmap_id/versions/mine` - Save the caller's version
//! - `POST /api/versions/:version_id/votes` - Vote on a version
//! - `GET /api/versions/:base/diff/:other` - Diff two versions
//! - `GET /api/roadmaps/:roadmap_id/proposals` - List proposals
//! - `POST /api/roadmaps/:roadmap_id/proposals` - Open a proposal
//! - `POST /api/proposals/:proposal_id/votes` - Vote on a proposal
//! - `POST /api/proposals/:proposal_id/apply` - Apply an approved proposal
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//!
//! Mutating routes read the caller's identity from `X-Author-Id` and
//! answer `401` without it.

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{
    metrics_middleware, record_proposal_event, record_ranking_metrics, record_vote,
};
pub use routes::{create_router, ApiError, ErrorResponse, AUTHOR_HEADER, REQUEST_ID_HEADER};
pub use state::{LogFormat, ServiceConfig, ServiceState};
