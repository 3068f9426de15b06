//! Dashboard row state and action handlers.
//!
//! [`Dashboard`] owns the job rows and decides which ids poll.  Polled
//! snapshots replace rows wholesale (no partial merge, so there is no
//! ordering ambiguity between fields); snapshots for jobs that are no
//! longer watched are dropped, since an event queued before a stop or
//! remove must not mutate visible state.  Action handlers own the identity
//! swap rule: when starting a staged run hands back a new engine id, the
//! old id's polling stops and the new id's polling starts inside the same
//! success path — never both active.

use std::collections::HashMap;
use std::sync::Arc;

use pipewatch_api::{ActionOutcome, ApiError};
use pipewatch_core::job::Job;
use pipewatch_core::types::JobId;

use crate::poller::{PollEvent, PollRegistry};
use crate::source::Backend;

/// Client-side dashboard state: one row per known job.
pub struct Dashboard {
    backend: Arc<dyn Backend>,
    registry: Arc<PollRegistry>,
    rows: HashMap<JobId, Job>,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>, registry: Arc<PollRegistry>) -> Self {
        Self {
            backend,
            registry,
            rows: HashMap::new(),
        }
    }

    /// Seed the rows from the backend and start polling every
    /// non-terminal job.
    pub async fn load(&mut self) -> Result<(), ApiError> {
        let jobs = self.backend.list_jobs().await?;
        tracing::info!(count = jobs.len(), "Dashboard loaded");

        self.rows = jobs.into_iter().map(|job| (job.id.clone(), job)).collect();

        // Capture the id set before touching the registry; starting a poll
        // must not happen while iterating a structure it could mutate.
        let active: Vec<JobId> = self
            .rows
            .values()
            .filter(|job| !job.is_terminal())
            .map(|job| job.id.clone())
            .collect();

        for job_id in active {
            self.registry.start(job_id).await;
        }
        Ok(())
    }

    /// All rows, unordered.
    pub fn rows(&self) -> impl Iterator<Item = &Job> {
        self.rows.values()
    }

    pub fn row(&self, job_id: &str) -> Option<&Job> {
        self.rows.get(job_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fold one polled update into the rows.
    ///
    /// A `Status` event for a job with neither a row nor a poll handle is
    /// stale — it was queued before a `stop`/`remove` took effect — and is
    /// dropped, so a removed row can never be resurrected by a late fetch.
    pub async fn apply_poll_event(&mut self, event: PollEvent) {
        match event {
            PollEvent::Status(job) => {
                if !self.rows.contains_key(&job.id) && !self.registry.is_polling(&job.id).await {
                    tracing::debug!(job_id = %job.id, "Dropping stale status event");
                    return;
                }
                // Wholesale replacement, never a field-by-field merge.
                self.rows.insert(job.id.clone(), job);
            }
            PollEvent::Vanished(job_id) => {
                tracing::info!(job_id = %job_id, "Job removed elsewhere, dropping row");
                self.rows.remove(&job_id);
            }
        }
    }

    /// Submit a staged run.
    ///
    /// On success the engine hands back a new id: polling for the staged
    /// id stops and polling for the engine id starts here, in the same
    /// handler.  On failure nothing changes — the caller rolls back any
    /// optimistic UI state and surfaces the message.
    pub async fn start_run(&mut self, staged_id: &str) -> Result<ActionOutcome, ApiError> {
        let outcome = self.backend.start_job(staged_id).await?;

        self.registry.stop(staged_id).await;
        self.rows.remove(staged_id);
        self.registry.start(outcome.job_id.clone()).await;

        tracing::info!(
            staged_id,
            engine_id = %outcome.job_id,
            "Run started, poll handle swapped",
        );
        Ok(outcome)
    }

    /// Stop a running job.  The row is left alone: polling observes the
    /// resulting terminal status and winds itself down.
    pub async fn stop_run(&mut self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.backend.stop_job(job_id).await
    }

    /// Remove a job: on success the row goes away and polling stops.
    pub async fn remove_run(&mut self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        let outcome = self.backend.remove_job(job_id).await?;

        self.registry.stop(job_id).await;
        self.rows.remove(job_id);
        Ok(outcome)
    }

    /// Re-stage a terminal job.  The fresh copy gets polled immediately
    /// so its row appears on the next event.
    pub async fn rerun(&mut self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        let outcome = self.backend.rerun_job(job_id).await?;
        self.registry.start(outcome.job_id.clone()).await;
        Ok(outcome)
    }
}
