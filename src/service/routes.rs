//! Axum routes for the roadmap service.

use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::diff::diff;
use crate::error::RoadmapError;
use crate::ranking::{rank_with_policy, RankedVersion};
use crate::session::Session;
use crate::store::{ProposalStore, VersionStore};
use crate::types::{
    AppliedChangeSet, AuthorId, ChangeSet, ChangeSummary, GraphSnapshot, Proposal, ProposalId,
    ProposalStatus, RoadmapId, Version, VersionId, VoteValue,
};

use super::middleware::{record_proposal_event, record_ranking_metrics, record_vote};
use super::state::ServiceState;

/// Header carrying the caller's identity, set by the upstream identity layer.
pub const AUTHOR_HEADER: &str = "x-author-id";

/// Header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Ranked versions of a roadmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedVersionsResponse {
    /// Roadmap listed.
    pub roadmap_id: RoadmapId,
    /// Versions, best first.
    pub versions: Vec<RankedVersion>,
}

/// Request to save the caller's version of a roadmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveVersionRequest {
    /// Graph as `{ "nodes": ..., "edges": ... }`.
    pub snapshot: serde_json::Value,
    /// Optional description.
    #[serde(default)]
    pub description: String,
}

/// Request to vote on a version or proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    /// Vote direction.
    pub value: VoteValue,
    /// Optional comment (proposals only).
    #[serde(default)]
    pub comment: Option<String>,
}

/// Structural diff between two versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResponse {
    /// Baseline version.
    pub base_version_id: VersionId,
    /// Compared version.
    pub other_version_id: VersionId,
    /// Per-kind counts.
    pub summary: ChangeSummary,
    /// Ordered change records.
    pub changes: ChangeSet,
}

/// Request to open a proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProposalRequest {
    /// Version the edits start from; empty graph when absent.
    #[serde(default)]
    pub baseline_version_id: Option<VersionId>,
    /// Proposed graph as `{ "nodes": ..., "edges": ... }`.
    pub snapshot: serde_json::Value,
    /// Author's description.
    #[serde(default)]
    pub description: String,
}

/// Proposals of a roadmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalListResponse {
    /// Roadmap listed.
    pub roadmap_id: RoadmapId,
    /// Proposals, newest first.
    pub proposals: Vec<Proposal>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Schema version of the wire types.
    pub schema_version: String,
    /// Whether the store answered.
    pub store_connected: bool,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Ready for traffic.
    pub ready: bool,
    /// Store reachable.
    pub store: bool,
    /// Reason when not ready.
    pub details: Option<String>,
}

/// Structured error response with correlation ID for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Correlation ID for request tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            correlation_id: None,
            details: None,
        }
    }

    /// Add a correlation ID to the error.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Error returned by handlers: a status plus an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    /// Create an error with an explicit status.
    pub fn new(status: StatusCode, body: ErrorResponse) -> Self {
        Self { status, body }
    }

    /// HTTP status of the error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn bad_request(code: &str, error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorResponse::new(code, error))
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body = self.body.with_details(details);
        self
    }

    fn correlated(mut self, headers: &HeaderMap) -> Self {
        if let Some(id) = headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
            self.body = self.body.with_correlation_id(id);
        }
        self
    }
}

impl From<RoadmapError> for ApiError {
    fn from(error: RoadmapError) -> Self {
        let status = match &error {
            RoadmapError::NoChanges => StatusCode::UNPROCESSABLE_ENTITY,
            RoadmapError::DuplicatePendingProposal { .. } | RoadmapError::InvalidState { .. } => {
                StatusCode::CONFLICT
            }
            RoadmapError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            RoadmapError::ProposalNotFound(_) | RoadmapError::VersionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            RoadmapError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self::new(status, ErrorResponse::new(error.code(), error.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            status = self.status.as_u16(),
            code = %self.body.code,
            error = %self.body.error,
            correlation_id = ?self.body.correlation_id,
            "Request error"
        );
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Build the caller's session from the identity header.
fn session_from_headers(headers: &HeaderMap, roadmap_id: RoadmapId) -> Session {
    let author = headers
        .get(AUTHOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AuthorId::new);

    match author {
        Some(author_id) => Session::authenticated(author_id, roadmap_id),
        None => Session::anonymous(roadmap_id),
    }
}

fn parse_snapshot(value: &serde_json::Value) -> Result<GraphSnapshot, ApiError> {
    GraphSnapshot::from_json(value)
        .map_err(|e| ApiError::bad_request("INVALID_SNAPSHOT", format!("Invalid snapshot: {}", e)))
}

fn parse_version_id(raw: &str) -> Result<VersionId, ApiError> {
    VersionId::from_str(raw).map_err(|e| {
        ApiError::bad_request("INVALID_VERSION_ID", format!("Invalid version ID: {}", e))
            .with_details(raw)
    })
}

fn parse_proposal_id(raw: &str) -> Result<ProposalId, ApiError> {
    ProposalId::from_str(raw).map_err(|e| {
        ApiError::bad_request("INVALID_PROPOSAL_ID", format!("Invalid proposal ID: {}", e))
            .with_details(raw)
    })
}

async fn load_version<S: VersionStore>(store: &S, id: &VersionId) -> Result<Version, ApiError> {
    store
        .get_version(id)
        .await
        .map_err(RoadmapError::from)?
        .ok_or_else(|| RoadmapError::VersionNotFound(*id).into())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// List a roadmap's versions in ranked order.
async fn list_versions_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(roadmap_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RankedVersionsResponse>, ApiError> {
    let start = Instant::now();
    let roadmap_id = RoadmapId::new(roadmap_id);

    let versions = state
        .store
        .list_public(&roadmap_id)
        .await
        .map_err(|e| ApiError::from(RoadmapError::from(e)).correlated(&headers))?;
    let ranked = rank_with_policy(&versions, &state.ranking_policy);

    record_ranking_metrics(ranked.len(), start.elapsed().as_millis() as u64);
    Ok(Json(RankedVersionsResponse {
        roadmap_id,
        versions: ranked,
    }))
}

/// Create or update the caller's version of a roadmap.
async fn save_my_version_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(roadmap_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SaveVersionRequest>,
) -> Result<Json<Version>, ApiError> {
    let session = session_from_headers(&headers, RoadmapId::new(roadmap_id));
    let author_id = session
        .require_author()
        .map_err(|e| ApiError::from(e).correlated(&headers))?;
    let snapshot = parse_snapshot(&request.snapshot)?;

    let version = state
        .store
        .upsert_version(author_id, &session.roadmap_id, &snapshot, &request.description)
        .await
        .map_err(|e| ApiError::from(RoadmapError::from(e)).correlated(&headers))?;

    tracing::info!(
        version_id = %version.id,
        roadmap_id = %version.roadmap_id,
        author_id = %version.author_id,
        nodes = version.nodes.len(),
        edges = version.edges.len(),
        "Version saved"
    );
    Ok(Json(version))
}

/// Vote on a version.
async fn vote_version_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(version_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> Result<Json<Version>, ApiError> {
    let version_id = parse_version_id(&version_id)?;
    let version = load_version(state.store.as_ref(), &version_id).await?;

    let session = session_from_headers(&headers, version.roadmap_id);
    let voter_id = session
        .require_author()
        .map_err(|e| ApiError::from(e).correlated(&headers))?;

    let updated = state
        .store
        .record_version_vote(&version_id, voter_id, request.value)
        .await
        .map_err(|e| ApiError::from(RoadmapError::from(e)).correlated(&headers))?;

    record_vote("version", request.value);
    Ok(Json(updated))
}

/// Diff two versions.
async fn diff_versions_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path((base, other)): Path<(String, String)>,
) -> Result<Json<DiffResponse>, ApiError> {
    let base_id = parse_version_id(&base)?;
    let other_id = parse_version_id(&other)?;

    let base = load_version(state.store.as_ref(), &base_id).await?;
    let other = load_version(state.store.as_ref(), &other_id).await?;

    let changes = diff(&base.snapshot(), &other.snapshot());
    Ok(Json(DiffResponse {
        base_version_id: base_id,
        other_version_id: other_id,
        summary: changes.summary(),
        changes,
    }))
}

/// List a roadmap's proposals.
async fn list_proposals_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(roadmap_id): Path<String>,
) -> Result<Json<ProposalListResponse>, ApiError> {
    let roadmap_id = RoadmapId::new(roadmap_id);
    let proposals = state.proposals.list(&roadmap_id).await?;
    Ok(Json(ProposalListResponse {
        roadmap_id,
        proposals,
    }))
}

/// Open a proposal against a baseline version.
async fn create_proposal_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(roadmap_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CreateProposalRequest>,
) -> Result<(StatusCode, Json<Proposal>), ApiError> {
    let session = session_from_headers(&headers, RoadmapId::new(roadmap_id));
    session
        .require_author()
        .map_err(|e| ApiError::from(e).correlated(&headers))?;

    let current = parse_snapshot(&request.snapshot)?;
    let baseline = match request.baseline_version_id {
        Some(id) => {
            let version = load_version(state.store.as_ref(), &id).await?;
            if version.roadmap_id != session.roadmap_id {
                return Err(ApiError::bad_request(
                    "BASELINE_ROADMAP_MISMATCH",
                    format!(
                        "Baseline version {} belongs to roadmap {}",
                        id, version.roadmap_id
                    ),
                )
                .correlated(&headers));
            }
            version.snapshot()
        }
        None => GraphSnapshot::new(),
    };

    let proposal = state
        .proposals
        .create(
            &session,
            request.baseline_version_id,
            &baseline,
            &current,
            request.description,
        )
        .await
        .map_err(|e| ApiError::from(e).correlated(&headers))?;

    record_proposal_event("created", proposal.status, proposal.changes.len());
    Ok((StatusCode::CREATED, Json(proposal)))
}

/// Vote on a proposal.
async fn vote_proposal_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(proposal_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> Result<Json<Proposal>, ApiError> {
    let proposal_id = parse_proposal_id(&proposal_id)?;
    let existing = state.proposals.get(&proposal_id).await?;
    let session = session_from_headers(&headers, existing.roadmap_id);

    let proposal = state
        .proposals
        .vote(&session, &proposal_id, request.value, request.comment)
        .await
        .map_err(|e| ApiError::from(e).correlated(&headers))?;

    record_vote("proposal", request.value);
    if proposal.status != existing.status {
        record_proposal_event("resolved", proposal.status, proposal.changes.len());
    }
    Ok(Json(proposal))
}

/// Apply an approved proposal.
async fn apply_proposal_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
    Path(proposal_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<AppliedChangeSet>, ApiError> {
    let proposal_id = parse_proposal_id(&proposal_id)?;
    let existing = state.proposals.get(&proposal_id).await?;
    let session = session_from_headers(&headers, existing.roadmap_id);

    let applied = state
        .proposals
        .apply(&session, &proposal_id)
        .await
        .map_err(|e| ApiError::from(e).correlated(&headers))?;

    record_proposal_event("applied", ProposalStatus::Applied, applied.changes.len());
    Ok(Json(applied))
}

/// Health check endpoint (detailed).
async fn health_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Json<HealthResponse> {
    let store_connected = state.store.is_healthy().await;

    Json(HealthResponse {
        status: if store_connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: crate::ROADMAP_SCHEMA_VERSION.to_string(),
        store_connected,
    })
}

/// Liveness probe endpoint. Does not check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 if the store is reachable, 503 otherwise.
async fn readiness_handler<S: VersionStore + ProposalStore + 'static>(
    State(state): State<Arc<ServiceState<S>>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            store: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some("Store connection failed".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router over any store backend.
pub fn create_router<S: VersionStore + ProposalStore + 'static>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Versions
        .route("/api/roadmaps/:roadmap_id/versions", get(list_versions_handler::<S>))
        .route("/api/roadmaps/:roadmap_id/versions/mine", put(save_my_version_handler::<S>))
        .route("/api/versions/:version_id/votes", post(vote_version_handler::<S>))
        .route("/api/versions/:base/diff/:other", get(diff_versions_handler::<S>))
        // Proposals
        .route(
            "/api/roadmaps/:roadmap_id/proposals",
            get(list_proposals_handler::<S>).post(create_proposal_handler::<S>),
        )
        .route("/api/proposals/:proposal_id/votes", post(vote_proposal_handler::<S>))
        .route("/api/proposals/:proposal_id/apply", post(apply_proposal_handler::<S>))
        // Health checks
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .with_state(state)
}
