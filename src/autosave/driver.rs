//! Tokio task that feeds an [`AutosaveScheduler`] from a watch channel.

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant as TokioInstant;

use crate::error::RoadmapError;
use crate::store::{StoreError, VersionStore};
use crate::types::{GraphSnapshot, Version};

use super::scheduler::AutosaveScheduler;

/// Handle to a running autosave task.
///
/// Dropping the handle also stops the task, without waiting for it.
pub struct AutosaveHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<Option<Version>, RoadmapError>>,
}

impl AutosaveHandle {
    /// Stop the task and wait for its teardown.
    ///
    /// Returns the version flushed on teardown, if any.
    pub async fn teardown(self) -> Result<Option<Version>, RoadmapError> {
        // The task may already have stopped because the sender side closed.
        let _ = self.shutdown.send(());
        self.task.await.map_err(|e| {
            let reason = format!("autosave task failed: {e}");
            RoadmapError::Persistence(StoreError::Unavailable(reason))
        })?
    }
}

/// Spawn the autosave loop.
///
/// Each change published on `snapshots` counts as one mutation. The loop
/// sleeps until the scheduler's next deadline and saves the latest
/// snapshot. It stops when the handle is torn down or every sender is gone.
pub fn spawn_autosave<S>(
    mut scheduler: AutosaveScheduler<S>,
    mut snapshots: watch::Receiver<GraphSnapshot>,
) -> Result<AutosaveHandle, RoadmapError>
where
    S: VersionStore + 'static,
{
    scheduler.session().require_author()?;
    let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        tracing::debug!(roadmap_id = %scheduler.session().roadmap_id, "Autosave task started");

        loop {
            let deadline = scheduler.next_deadline();
            let sleep = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(TokioInstant::from_std(at)).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = &mut shutdown_rx => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Err(e) = scheduler.record_mutation(TokioInstant::now().into_std()) {
                        return Err(e);
                    }
                }
                _ = sleep => {
                    let snapshot = snapshots.borrow().clone();
                    // Failures are logged by the scheduler and retried next cycle.
                    let _ = scheduler.tick(TokioInstant::now().into_std(), &snapshot).await;
                }
            }
        }

        let snapshot = snapshots.borrow().clone();
        let flushed = scheduler.teardown(&snapshot).await;
        tracing::debug!(roadmap_id = %scheduler.session().roadmap_id, "Autosave task stopped");
        flushed
    });

    Ok(AutosaveHandle { shutdown, task })
}
