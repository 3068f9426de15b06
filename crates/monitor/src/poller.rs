//! Per-job status polling.
//!
//! [`PollRegistry`] owns at most one repeating fetch task per job id.  A
//! task fetches immediately on start, then on a fixed interval, emitting
//! [`PollEvent`]s over an mpsc channel for the dashboard to consume —
//! the registry never calls back into its consumers, so the handle map
//! can never be re-entered from inside a tick.
//!
//! A task stops itself when a fetch reports a terminal status or
//! not-found; transient failures are logged and retried on the next tick.
//! Responses that race an explicit `stop()` are discarded via the
//! per-handle cancellation token, so a late fetch can never mutate
//! visible state.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use pipewatch_core::job::Job;
use pipewatch_core::types::JobId;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::source::Backend;

/// Default interval between status fetches for an active job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Updates emitted by poll tasks, consumed by the dashboard.
#[derive(Debug)]
pub enum PollEvent {
    /// A fresh job snapshot; the row is replaced wholesale, never merged.
    Status(Job),
    /// The job no longer exists on the backend (removed elsewhere).
    Vanished(JobId),
}

/// Live association between a job id and its repeating fetch task.
struct PollHandle {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

/// Owns all active poll handles.
///
/// Construct once via [`PollRegistry::new`] and share the `Arc`; the
/// paired receiver is the dashboard's single source of polled updates.
pub struct PollRegistry {
    handles: Mutex<HashMap<JobId, PollHandle>>,
    backend: Arc<dyn Backend>,
    interval: Duration,
    event_tx: mpsc::UnboundedSender<PollEvent>,
    /// Master token — cancelled during shutdown; handle tokens are children.
    cancel: CancellationToken,
}

impl PollRegistry {
    /// Create a registry polling `backend` at `interval`.
    ///
    /// Returns the shared registry plus the event receiver.
    pub fn new(
        backend: Arc<dyn Backend>,
        interval: Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<PollEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Self {
            handles: Mutex::new(HashMap::new()),
            backend,
            interval,
            event_tx,
            cancel: CancellationToken::new(),
        });
        (registry, event_rx)
    }

    /// Start polling a job.  Idempotent: a second call for the same id
    /// while a handle exists is a no-op.
    pub async fn start(self: &Arc<Self>, job_id: JobId) {
        let mut handles = self.handles.lock().await;
        if handles.contains_key(&job_id) {
            return;
        }

        let cancel = self.cancel.child_token();
        let task_cancel = cancel.clone();
        let backend = Arc::clone(&self.backend);
        let event_tx = self.event_tx.clone();
        let interval = self.interval;
        let registry = Arc::downgrade(self);
        let task_job_id = job_id.clone();

        let task = tokio::spawn(async move {
            run_poll_loop(
                registry,
                task_job_id,
                backend,
                interval,
                task_cancel,
                event_tx,
            )
            .await;
        });

        tracing::debug!(job_id = %job_id, "Polling started");
        handles.insert(job_id, PollHandle { cancel, task });
    }

    /// Stop polling a job.  No-op when no handle exists.  Returns whether
    /// a handle was removed.
    pub async fn stop(&self, job_id: &str) -> bool {
        let handle = self.handles.lock().await.remove(job_id);
        match handle {
            Some(handle) => {
                handle.cancel.cancel();
                handle.task.abort();
                tracing::debug!(job_id, "Polling stopped");
                true
            }
            None => false,
        }
    }

    /// Whether a handle currently exists for the job.
    pub async fn is_polling(&self, job_id: &str) -> bool {
        self.handles.lock().await.contains_key(job_id)
    }

    /// Ids of all jobs currently being polled.
    pub async fn active_ids(&self) -> Vec<JobId> {
        self.handles.lock().await.keys().cloned().collect()
    }

    /// Cancel every poll task and clear the map.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let mut handles = self.handles.lock().await;
        let count = handles.len();
        for (_, handle) in handles.drain() {
            handle.cancel.cancel();
            handle.task.abort();
        }
        if count > 0 {
            tracing::info!(count, "Stopped all poll tasks");
        }
    }
}

/// One job's fetch loop: immediate fetch, then fixed-interval ticks.
async fn run_poll_loop(
    registry: Weak<PollRegistry>,
    job_id: JobId,
    backend: Arc<dyn Backend>,
    interval: Duration,
    cancel: CancellationToken,
    event_tx: mpsc::UnboundedSender<PollEvent>,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = backend.job_status(&job_id) => result,
        };

        // Discard responses that raced an explicit stop().
        if cancel.is_cancelled() {
            return;
        }

        match result {
            Ok(job) => {
                let terminal = job.is_terminal();
                let status = job.status;
                let _ = event_tx.send(PollEvent::Status(job));
                if terminal {
                    tracing::debug!(job_id = %job_id, %status, "Terminal status, polling ends");
                    remove_handle(&registry, &job_id).await;
                    return;
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(job_id = %job_id, "Job vanished, polling ends");
                let _ = event_tx.send(PollEvent::Vanished(job_id.clone()));
                remove_handle(&registry, &job_id).await;
                return;
            }
            Err(e) => {
                // Transient (network / 5xx): leave the row stale and let
                // the next tick retry.  Never surfaced to the user.
                tracing::debug!(job_id = %job_id, error = %e, "Poll fetch failed, will retry");
            }
        }
    }
}

/// Remove a task's own registry entry after a terminal/not-found fetch.
///
/// Goes through a `Weak` so a poll task never keeps its registry alive.
async fn remove_handle(registry: &Weak<PollRegistry>, job_id: &str) {
    if let Some(registry) = registry.upgrade() {
        registry.handles.lock().await.remove(job_id);
    }
}
