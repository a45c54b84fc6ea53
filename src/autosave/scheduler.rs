//! Drives an [`AutosaveMachine`] against a [`VersionStore`].

use std::sync::Arc;
use std::time::Instant;

use crate::error::RoadmapError;
use crate::session::Session;
use crate::store::VersionStore;
use crate::types::{GraphSnapshot, Version};

use super::machine::{AutosaveAction, AutosaveConfig, AutosaveMachine, AutosaveState, SaveOutcome};

/// Autosave for one editing session.
///
/// Every save goes through `&mut self`, so at most one upsert is in flight
/// per scheduler.
pub struct AutosaveScheduler<S: VersionStore> {
    session: Session,
    store: Arc<S>,
    machine: AutosaveMachine,
    description: String,
    /// Fingerprint of the last snapshot the store accepted.
    saved_fingerprint: Option<String>,
    last_version: Option<Version>,
}

impl<S: VersionStore> AutosaveScheduler<S> {
    /// Create a scheduler for `session`.
    pub fn new(session: Session, store: Arc<S>, config: AutosaveConfig) -> Self {
        Self {
            session,
            store,
            machine: AutosaveMachine::new(config),
            description: String::new(),
            saved_fingerprint: None,
            last_version: None,
        }
    }

    /// Description stored with each saved version.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Session this scheduler saves for.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current autosave state.
    pub fn state(&self) -> AutosaveState {
        self.machine.state()
    }

    /// Whether edits exist that no successful save has covered.
    pub fn has_unsaved_changes(&self) -> bool {
        self.machine.has_unsaved_changes()
    }

    /// When [`tick`](Self::tick) should next be called.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.machine.next_deadline()
    }

    /// Version returned by the most recent successful save.
    pub fn last_version(&self) -> Option<&Version> {
        self.last_version.as_ref()
    }

    /// Record a graph mutation. Requires an authenticated session.
    pub fn record_mutation(&mut self, now: Instant) -> Result<(), RoadmapError> {
        self.session.require_author()?;
        self.machine.record_mutation(now);
        Ok(())
    }

    /// Advance timers and save `snapshot` if the debounce window elapsed.
    ///
    /// Returns the saved version when a save happened.
    pub async fn tick(
        &mut self,
        now: Instant,
        snapshot: &GraphSnapshot,
    ) -> Result<Option<Version>, RoadmapError> {
        match self.machine.poll(now) {
            Some(AutosaveAction::Save) => self.save(now, snapshot).await.map(Some),
            None => Ok(None),
        }
    }

    /// Tear the session down.
    ///
    /// With `flush_on_teardown`, unsaved edits are persisted first;
    /// otherwise they are dropped and logged.
    pub async fn teardown(
        &mut self,
        snapshot: &GraphSnapshot,
    ) -> Result<Option<Version>, RoadmapError> {
        let unsaved = self.machine.teardown();
        if !unsaved {
            return Ok(None);
        }

        if !self.machine.config().flush_on_teardown {
            tracing::warn!(
                roadmap_id = %self.session.roadmap_id,
                "Autosave torn down with unsaved edits; edits dropped"
            );
            return Ok(None);
        }

        let version = self.upsert(snapshot).await?;
        Ok(Some(version))
    }

    async fn save(
        &mut self,
        now: Instant,
        snapshot: &GraphSnapshot,
    ) -> Result<Version, RoadmapError> {
        let fingerprint = snapshot.fingerprint();
        if let (Some(saved), Some(version)) = (&self.saved_fingerprint, &self.last_version) {
            if *saved == fingerprint {
                tracing::debug!(version_id = %version.id, "Snapshot unchanged since last save");
                let version = version.clone();
                self.machine.complete_save(now, SaveOutcome::Success);
                return Ok(version);
            }
        }

        match self.upsert(snapshot).await {
            Ok(version) => {
                self.machine.complete_save(now, SaveOutcome::Success);
                Ok(version)
            }
            Err(e) => {
                self.machine.complete_save(now, SaveOutcome::Failure);
                Err(e)
            }
        }
    }

    async fn upsert(&mut self, snapshot: &GraphSnapshot) -> Result<Version, RoadmapError> {
        let author_id = self.session.require_author()?;

        match self
            .store
            .upsert_version(author_id, &self.session.roadmap_id, snapshot, &self.description)
            .await
        {
            Ok(version) => {
                tracing::info!(
                    version_id = %version.id,
                    roadmap_id = %version.roadmap_id,
                    author_id = %version.author_id,
                    nodes = version.nodes.len(),
                    edges = version.edges.len(),
                    "Autosaved version"
                );
                self.saved_fingerprint = Some(snapshot.fingerprint());
                self.last_version = Some(version.clone());
                Ok(version)
            }
            Err(e) => {
                tracing::warn!(
                    roadmap_id = %self.session.roadmap_id,
                    error = %e,
                    "Autosave failed; edits kept for the next cycle"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryRoadmapStore, StoreError};
    use crate::types::{AuthorId, Node, NodeContent, Position, RoadmapId, VersionId, VoteValue};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts upserts and fails while `failing` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryRoadmapStore,
        failing: AtomicBool,
        upserts: AtomicUsize,
    }

    #[async_trait]
    impl VersionStore for FlakyStore {
        async fn upsert_version(
            &self,
            author_id: &AuthorId,
            roadmap_id: &RoadmapId,
            snapshot: &GraphSnapshot,
            description: &str,
        ) -> Result<Version, StoreError> {
            self.upserts.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.upsert_version(author_id, roadmap_id, snapshot, description).await
        }

        async fn list_public(&self, roadmap_id: &RoadmapId) -> Result<Vec<Version>, StoreError> {
            self.inner.list_public(roadmap_id).await
        }

        async fn get_version(&self, id: &VersionId) -> Result<Option<Version>, StoreError> {
            self.inner.get_version(id).await
        }

        async fn get_by_author(
            &self,
            author_id: &AuthorId,
            roadmap_id: &RoadmapId,
        ) -> Result<Option<Version>, StoreError> {
            self.inner.get_by_author(author_id, roadmap_id).await
        }

        async fn record_version_vote(
            &self,
            version_id: &VersionId,
            voter_id: &AuthorId,
            value: VoteValue,
        ) -> Result<Version, StoreError> {
            self.inner.record_version_vote(version_id, voter_id, value).await
        }
    }

    fn session() -> Session {
        Session::authenticated(AuthorId::new("alice"), RoadmapId::new("rust"))
    }

    fn snapshot(label: &str) -> GraphSnapshot {
        let mut s = GraphSnapshot::new();
        s.upsert_node(Node::new("n1", NodeContent::topic(label), Position::new(0.0, 0.0)));
        s
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test]
    async fn test_saves_after_idle_window_only() {
        let store = Arc::new(FlakyStore::default());
        let mut scheduler =
            AutosaveScheduler::new(session(), store.clone(), AutosaveConfig::default());
        let t0 = Instant::now();

        scheduler.record_mutation(t0).unwrap();
        assert!(scheduler.tick(t0 + secs(9), &snapshot("a")).await.unwrap().is_none());

        let saved = scheduler.tick(t0 + secs(10), &snapshot("a")).await.unwrap();
        assert!(saved.is_some());
        assert_eq!(scheduler.state(), AutosaveState::Saved);
        assert_eq!(store.upserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeated_saves_update_one_version() {
        let store = Arc::new(FlakyStore::default());
        let mut scheduler =
            AutosaveScheduler::new(session(), store.clone(), AutosaveConfig::default());
        let t0 = Instant::now();

        scheduler.record_mutation(t0).unwrap();
        let first = scheduler.tick(t0 + secs(10), &snapshot("a")).await.unwrap().unwrap();

        scheduler.record_mutation(t0 + secs(20)).unwrap();
        let second = scheduler.tick(t0 + secs(30), &snapshot("b")).await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.inner.num_versions(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_skips_write() {
        let store = Arc::new(FlakyStore::default());
        let mut scheduler =
            AutosaveScheduler::new(session(), store.clone(), AutosaveConfig::default());
        let t0 = Instant::now();

        scheduler.record_mutation(t0).unwrap();
        scheduler.tick(t0 + secs(10), &snapshot("a")).await.unwrap();
        scheduler.record_mutation(t0 + secs(20)).unwrap();
        let again = scheduler.tick(t0 + secs(30), &snapshot("a")).await.unwrap();

        assert!(again.is_some());
        assert_eq!(store.upserts.load(Ordering::SeqCst), 1);
        assert!(!scheduler.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_failure_then_retry_on_next_cycle() {
        let store = Arc::new(FlakyStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let mut scheduler =
            AutosaveScheduler::new(session(), store.clone(), AutosaveConfig::default());
        let t0 = Instant::now();

        scheduler.record_mutation(t0).unwrap();
        let result = scheduler.tick(t0 + secs(10), &snapshot("a")).await;
        assert!(matches!(result, Err(RoadmapError::Persistence(_))));
        assert_eq!(scheduler.state(), AutosaveState::Error);
        assert!(scheduler.has_unsaved_changes());

        scheduler.tick(t0 + secs(15), &snapshot("a")).await.unwrap();
        assert_eq!(scheduler.state(), AutosaveState::Editing);

        store.failing.store(false, Ordering::SeqCst);
        scheduler.record_mutation(t0 + secs(16)).unwrap();
        assert!(scheduler.tick(t0 + secs(26), &snapshot("a")).await.unwrap().is_some());
        assert!(!scheduler.has_unsaved_changes());
        assert_eq!(store.upserts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_save_retried_without_new_edits() {
        let store = Arc::new(FlakyStore::default());
        store.failing.store(true, Ordering::SeqCst);
        let mut scheduler =
            AutosaveScheduler::new(session(), store.clone(), AutosaveConfig::default());
        let t0 = Instant::now();

        scheduler.record_mutation(t0).unwrap();
        assert!(scheduler.tick(t0 + secs(10), &snapshot("a")).await.is_err());
        store.failing.store(false, Ordering::SeqCst);

        // Error window closes and schedules the next cycle.
        assert!(scheduler.tick(t0 + secs(15), &snapshot("a")).await.unwrap().is_none());
        assert_eq!(scheduler.next_deadline(), Some(t0 + secs(25)));

        let retried = scheduler.tick(t0 + secs(25), &snapshot("a")).await.unwrap();
        assert!(retried.is_some());
        assert!(!scheduler.has_unsaved_changes());
        assert_eq!(store.upserts.load(Ordering::SeqCst), 2);
        assert_eq!(store.inner.num_versions(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_session_cannot_autosave() {
        let store = Arc::new(FlakyStore::default());
        let anonymous = Session::anonymous(RoadmapId::new("rust"));
        let mut scheduler = AutosaveScheduler::new(anonymous, store, AutosaveConfig::default());

        let result = scheduler.record_mutation(Instant::now());
        assert!(matches!(result, Err(RoadmapError::NotAuthenticated)));
        assert_eq!(scheduler.state(), AutosaveState::Idle);
    }

    #[tokio::test]
    async fn test_teardown_drops_edits_by_default() {
        let store = Arc::new(FlakyStore::default());
        let mut scheduler =
            AutosaveScheduler::new(session(), store.clone(), AutosaveConfig::default());

        scheduler.record_mutation(Instant::now()).unwrap();
        let flushed = scheduler.teardown(&snapshot("a")).await.unwrap();

        assert!(flushed.is_none());
        assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[tokio::test]
    async fn test_teardown_flushes_when_configured() {
        let store = Arc::new(FlakyStore::default());
        let config = AutosaveConfig {
            flush_on_teardown: true,
            ..AutosaveConfig::default()
        };
        let mut scheduler = AutosaveScheduler::new(session(), store.clone(), config);

        scheduler.record_mutation(Instant::now()).unwrap();
        let flushed = scheduler.teardown(&snapshot("a")).await.unwrap();

        assert!(flushed.is_some());
        assert_eq!(store.inner.num_versions(), 1);
    }
}
