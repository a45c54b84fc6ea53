//! PostgreSQL roadmap store for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//!
//! ## Consistency
//!
//! - one version per (author, roadmap): `UNIQUE (author_id, roadmap_id)` plus
//!   `INSERT ... ON CONFLICT DO UPDATE`
//! - one pending proposal per (author, roadmap): a partial unique index
//! - vote counts: one row per (subject, voter), aggregated on read with
//!   `COUNT(*) FILTER`, so concurrent voters never overwrite each other

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::types::{
    AuthorId, ChangeSet, Edge, EdgeId, GraphSnapshot, Node, NodeId, Proposal, ProposalId,
    ProposalStatus, RoadmapId, Version, VersionId, Vote, VoteCounts, VoteValue,
};
use super::{ProposalStore, StoreError, VersionStore};

/// Name of the partial unique index guarding pending proposals.
const PENDING_PROPOSAL_INDEX: &str = "roadmap_proposals_one_pending";

/// Schema statements, applied in order by [`PostgresRoadmapStore::migrate`].
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS roadmap_versions (
        id          UUID PRIMARY KEY,
        roadmap_id  TEXT NOT NULL,
        author_id   TEXT NOT NULL,
        nodes       JSONB NOT NULL DEFAULT '{}'::jsonb,
        edges       JSONB NOT NULL DEFAULT '{}'::jsonb,
        description TEXT NOT NULL DEFAULT '',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (author_id, roadmap_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roadmap_version_votes (
        version_id UUID NOT NULL REFERENCES roadmap_versions (id) ON DELETE CASCADE,
        voter_id   TEXT NOT NULL,
        value      TEXT NOT NULL CHECK (value IN ('approve', 'reject')),
        cast_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (version_id, voter_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roadmap_proposals (
        id                  UUID PRIMARY KEY,
        roadmap_id          TEXT NOT NULL,
        author_id           TEXT NOT NULL,
        baseline_version_id UUID,
        changes             JSONB NOT NULL,
        proposed            JSONB NOT NULL,
        description         TEXT NOT NULL DEFAULT '',
        status              TEXT NOT NULL
                            CHECK (status IN ('pending', 'approved', 'rejected', 'applied')),
        created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS roadmap_proposals_one_pending
        ON roadmap_proposals (author_id, roadmap_id)
        WHERE status = 'pending'
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roadmap_proposal_votes (
        proposal_id UUID NOT NULL REFERENCES roadmap_proposals (id) ON DELETE CASCADE,
        voter_id    TEXT NOT NULL,
        value       TEXT NOT NULL CHECK (value IN ('approve', 'reject')),
        comment     TEXT,
        cast_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (proposal_id, voter_id)
    )
    "#,
];

/// Versions joined with their vote aggregates. Callers append WHERE/GROUP BY.
const SELECT_VERSION: &str = r#"
    SELECT v.id, v.roadmap_id, v.author_id, v.nodes, v.edges, v.description,
           v.created_at, v.updated_at,
           COUNT(*) FILTER (WHERE vv.value = 'approve') AS up,
           COUNT(*) FILTER (WHERE vv.value = 'reject')  AS down
    FROM roadmap_versions v
    LEFT JOIN roadmap_version_votes vv ON vv.version_id = v.id
"#;

const SELECT_PROPOSAL: &str = r#"
    SELECT id, roadmap_id, author_id, baseline_version_id, changes, proposed,
           description, status, created_at, updated_at
    FROM roadmap_proposals
"#;

/// Configuration for PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL.
    pub database_url: String,
    /// Maximum connections in pool (default: 10).
    pub max_connections: u32,
    /// Minimum idle connections to keep warm (default: 2).
    pub min_connections: u32,
    /// Connection acquire timeout in seconds (default: 10).
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds (default: 300 = 5 min).
    pub idle_timeout_secs: u64,
    /// Maximum connection lifetime in seconds (default: 1800 = 30 min).
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/roadmaps".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// PostgreSQL store implementing [`VersionStore`] and [`ProposalStore`].
pub struct PostgresRoadmapStore {
    pool: PgPool,
}

impl PostgresRoadmapStore {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, StoreError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create a store from environment variables.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(PostgresConfig::from_env()).await
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if missing.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!(statements = SCHEMA.len(), "Roadmap schema ready");
        Ok(())
    }

    /// Get the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get pool statistics for monitoring.
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max: self.pool.options().get_max_connections(),
        }
    }

    async fn fetch_version(&self, id: Uuid) -> Result<Option<Version>, StoreError> {
        let sql = format!("{SELECT_VERSION} WHERE v.id = $1 GROUP BY v.id");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(parse_version_row).transpose()
    }

    async fn fetch_votes(
        &self,
        proposal_ids: &[Uuid],
    ) -> Result<BTreeMap<Uuid, Vec<Vote>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT proposal_id, voter_id, value, comment, cast_at
            FROM roadmap_proposal_votes
            WHERE proposal_id = ANY($1)
            ORDER BY proposal_id, cast_at, voter_id
            "#,
        )
        .bind(proposal_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut votes: BTreeMap<Uuid, Vec<Vote>> = BTreeMap::new();
        for row in &rows {
            let proposal_id: Uuid = row.try_get("proposal_id")?;
            let value: String = row.try_get("value")?;
            votes.entry(proposal_id).or_default().push(Vote {
                voter_id: AuthorId::new(row.try_get::<String, _>("voter_id")?),
                value: VoteValue::from_str(&value).unwrap_or(VoteValue::Reject),
                comment: row.try_get("comment")?,
                cast_at: row.try_get("cast_at")?,
            });
        }
        Ok(votes)
    }

    async fn fetch_proposal(&self, id: Uuid) -> Result<Option<Proposal>, StoreError> {
        let sql = format!("{SELECT_PROPOSAL} WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut proposal = parse_proposal_row(&row)?;
        proposal.votes = self.fetch_votes(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(proposal))
    }
}

/// Pool statistics for monitoring.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

fn parse_version_row(row: &PgRow) -> Result<Version, StoreError> {
    let nodes: Json<BTreeMap<NodeId, Node>> = row.try_get("nodes")?;
    let edges: Json<BTreeMap<EdgeId, Edge>> = row.try_get("edges")?;
    let up: i64 = row.try_get("up")?;
    let down: i64 = row.try_get("down")?;

    Ok(Version {
        id: VersionId::new(row.try_get("id")?),
        roadmap_id: RoadmapId::new(row.try_get::<String, _>("roadmap_id")?),
        author_id: AuthorId::new(row.try_get::<String, _>("author_id")?),
        nodes: nodes.0,
        edges: edges.0,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        vote_counts: VoteCounts::new(up as u32, down as u32),
    })
}

fn parse_proposal_row(row: &PgRow) -> Result<Proposal, StoreError> {
    let changes: Json<ChangeSet> = row.try_get("changes")?;
    let proposed: Json<GraphSnapshot> = row.try_get("proposed")?;
    let baseline: Option<Uuid> = row.try_get("baseline_version_id")?;
    let status: String = row.try_get("status")?;

    Ok(Proposal {
        id: ProposalId::new(row.try_get("id")?),
        roadmap_id: RoadmapId::new(row.try_get::<String, _>("roadmap_id")?),
        author_id: AuthorId::new(row.try_get::<String, _>("author_id")?),
        baseline_version_id: baseline.map(VersionId::new),
        changes: changes.0,
        proposed: proposed.0,
        description: row.try_get("description")?,
        status: ProposalStatus::from_str(&status).unwrap_or(ProposalStatus::Pending),
        votes: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl VersionStore for PostgresRoadmapStore {
    async fn upsert_version(
        &self,
        author_id: &AuthorId,
        roadmap_id: &RoadmapId,
        snapshot: &GraphSnapshot,
        description: &str,
    ) -> Result<Version, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO roadmap_versions (id, roadmap_id, author_id, nodes, edges, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (author_id, roadmap_id) DO UPDATE
            SET nodes = EXCLUDED.nodes,
                edges = EXCLUDED.edges,
                description = EXCLUDED.description,
                updated_at = now()
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(roadmap_id.as_str())
        .bind(author_id.as_str())
        .bind(Json(&snapshot.nodes))
        .bind(Json(&snapshot.edges))
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        let id: Uuid = row.try_get("id")?;
        self.fetch_version(id)
            .await?
            .ok_or(StoreError::VersionNotFound(VersionId::new(id)))
    }

    async fn list_public(&self, roadmap_id: &RoadmapId) -> Result<Vec<Version>, StoreError> {
        let sql = format!(
            "{SELECT_VERSION} WHERE v.roadmap_id = $1 GROUP BY v.id ORDER BY v.created_at, v.id"
        );
        let rows = sqlx::query(&sql)
            .bind(roadmap_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(parse_version_row).collect()
    }

    async fn get_version(&self, id: &VersionId) -> Result<Option<Version>, StoreError> {
        self.fetch_version(id.as_uuid()).await
    }

    async fn get_by_author(
        &self,
        author_id: &AuthorId,
        roadmap_id: &RoadmapId,
    ) -> Result<Option<Version>, StoreError> {
        let sql = format!(
            "{SELECT_VERSION} WHERE v.author_id = $1 AND v.roadmap_id = $2 GROUP BY v.id"
        );
        let row = sqlx::query(&sql)
            .bind(author_id.as_str())
            .bind(roadmap_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(parse_version_row).transpose()
    }

    async fn record_version_vote(
        &self,
        version_id: &VersionId,
        voter_id: &AuthorId,
        value: VoteValue,
    ) -> Result<Version, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO roadmap_version_votes (version_id, voter_id, value)
            SELECT id, $2, $3 FROM roadmap_versions WHERE id = $1
            ON CONFLICT (version_id, voter_id) DO UPDATE
            SET value = EXCLUDED.value, cast_at = now()
            "#,
        )
        .bind(version_id.as_uuid())
        .bind(voter_id.as_str())
        .bind(value.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::VersionNotFound(*version_id));
        }

        self.fetch_version(version_id.as_uuid())
            .await?
            .ok_or(StoreError::VersionNotFound(*version_id))
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl ProposalStore for PostgresRoadmapStore {
    async fn insert_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO roadmap_proposals
                (id, roadmap_id, author_id, baseline_version_id, changes, proposed,
                 description, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(proposal.id.as_uuid())
        .bind(proposal.roadmap_id.as_str())
        .bind(proposal.author_id.as_str())
        .bind(proposal.baseline_version_id.map(|id| id.as_uuid()))
        .bind(Json(&proposal.changes))
        .bind(Json(&proposal.proposed))
        .bind(&proposal.description)
        .bind(proposal.status.as_str())
        .bind(proposal.created_at)
        .bind(proposal.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.constraint() == Some(PENDING_PROPOSAL_INDEX) => {
                Err(StoreError::DuplicatePending {
                    author_id: proposal.author_id.clone(),
                    roadmap_id: proposal.roadmap_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_proposal(&self, id: &ProposalId) -> Result<Option<Proposal>, StoreError> {
        self.fetch_proposal(id.as_uuid()).await
    }

    async fn list_by_roadmap(&self, roadmap_id: &RoadmapId) -> Result<Vec<Proposal>, StoreError> {
        let sql = format!("{SELECT_PROPOSAL} WHERE roadmap_id = $1 ORDER BY created_at DESC, id");
        let rows = sqlx::query(&sql)
            .bind(roadmap_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        let mut proposals = rows
            .iter()
            .map(parse_proposal_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<Uuid> = proposals.iter().map(|p| p.id.as_uuid()).collect();
        let mut votes = self.fetch_votes(&ids).await?;
        for proposal in &mut proposals {
            proposal.votes = votes.remove(&proposal.id.as_uuid()).unwrap_or_default();
        }
        Ok(proposals)
    }

    async fn upsert_vote(
        &self,
        proposal_id: &ProposalId,
        vote: &Vote,
    ) -> Result<Proposal, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM roadmap_proposals WHERE id = $1 FOR UPDATE")
            .bind(proposal_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        let status: String = match row {
            Some(row) => row.try_get("status")?,
            None => return Err(StoreError::ProposalNotFound(*proposal_id)),
        };
        if status == ProposalStatus::Applied.as_str() {
            return Err(StoreError::StatusConflict {
                proposal_id: *proposal_id,
                expected: ProposalStatus::Pending,
                actual: ProposalStatus::Applied,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO roadmap_proposal_votes (proposal_id, voter_id, value, comment, cast_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (proposal_id, voter_id) DO UPDATE
            SET value = EXCLUDED.value,
                comment = EXCLUDED.comment,
                cast_at = EXCLUDED.cast_at
            "#,
        )
        .bind(proposal_id.as_uuid())
        .bind(vote.voter_id.as_str())
        .bind(vote.value.to_string())
        .bind(vote.comment.as_deref())
        .bind(vote.cast_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE roadmap_proposals SET updated_at = now() WHERE id = $1")
            .bind(proposal_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.fetch_proposal(proposal_id.as_uuid())
            .await?
            .ok_or(StoreError::ProposalNotFound(*proposal_id))
    }

    async fn transition_status(
        &self,
        proposal_id: &ProposalId,
        from: ProposalStatus,
        to: ProposalStatus,
    ) -> Result<Proposal, StoreError> {
        let updated = sqlx::query(
            r#"
            UPDATE roadmap_proposals
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(proposal_id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        let proposal = self
            .fetch_proposal(proposal_id.as_uuid())
            .await?
            .ok_or(StoreError::ProposalNotFound(*proposal_id))?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::StatusConflict {
                proposal_id: *proposal_id,
                expected: from,
                actual: proposal.status,
            });
        }
        Ok(proposal)
    }
}
