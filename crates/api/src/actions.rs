//! Run actions: start, stop, remove, rerun — single and batch.
//!
//! Actions never mutate client state directly.  A successful outcome only
//! tells the caller which id to re-fetch (and, for `start`, the new
//! backend-assigned id to poll in place of the staged one).  A failed
//! action returns `Err` so the caller can roll back any optimistic UI
//! state.

use serde::Deserialize;

use crate::client::RunApi;
use crate::error::ApiError;

/// Result of a single run action.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionOutcome {
    /// Human-readable message to surface to the user.
    pub message: String,
    /// The id the action applies to *after* it took effect.  For `start`
    /// this is the engine-assigned id, which may differ from the staged id
    /// the action was requested with.
    pub job_id: String,
}

/// Per-id result within a batch action.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    pub job_id: String,
    pub ok: bool,
    pub message: String,
}

/// Result of a batch action over several ids.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchItem>,
    pub succeeded: u32,
    pub failed: u32,
}

impl RunApi {
    /// Submit a staged run to the engine.
    ///
    /// The returned [`ActionOutcome::job_id`] is the engine-assigned id;
    /// callers must swap their poll handle from the staged id to it.
    pub async fn start_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.post_action(job_id, "start").await
    }

    /// Stop a queued or running job.
    pub async fn stop_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.post_action(job_id, "stop").await
    }

    /// Remove a job and its records from the backend.
    pub async fn remove_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.post_action(job_id, "remove").await
    }

    /// Stage a fresh copy of a terminal job for re-execution.
    pub async fn rerun_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        self.post_action(job_id, "rerun").await
    }

    /// Stop several jobs, returning a per-id outcome plus counts.
    pub async fn stop_jobs(&self, job_ids: &[String]) -> Result<BatchOutcome, ApiError> {
        self.post_batch(job_ids, "stop").await
    }

    /// Remove several jobs, returning a per-id outcome plus counts.
    pub async fn remove_jobs(&self, job_ids: &[String]) -> Result<BatchOutcome, ApiError> {
        self.post_batch(job_ids, "remove").await
    }

    // ---- private helpers ----

    async fn post_action(&self, job_id: &str, action: &str) -> Result<ActionOutcome, ApiError> {
        let response = self
            .client()
            .post(format!("{}/api/jobs/{}/{}", self.base_url(), job_id, action))
            .send()
            .await?;

        tracing::debug!(job_id, action, "Run action submitted");
        Self::parse_response(response, Some(job_id)).await
    }

    async fn post_batch(&self, job_ids: &[String], action: &str) -> Result<BatchOutcome, ApiError> {
        let body = serde_json::json!({ "job_ids": job_ids });

        let response = self
            .client()
            .post(format!("{}/api/jobs/{}", self.base_url(), action))
            .json(&body)
            .send()
            .await?;

        tracing::debug!(count = job_ids.len(), action, "Batch action submitted");
        Self::parse_response(response, None).await
    }
}
