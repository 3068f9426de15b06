//! The backend seam.
//!
//! Everything stateful in this crate talks to the backend through the
//! [`Backend`] trait instead of naming `reqwest`, so tests can substitute
//! a scripted implementation and the polling/session logic stays provable.

use async_trait::async_trait;
use pipewatch_api::{ActionOutcome, ApiError, LogRecord, RunApi};
use pipewatch_core::job::Job;

/// Request/response operations the watcher consumes.
///
/// All reads are side-effect free; actions only trigger server-side
/// transitions and are followed by a re-fetch (usually via polling).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Full job collection.
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError>;

    /// One job's current state, or [`ApiError::NotFound`].
    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError>;

    /// Ordered log lines produced so far.
    async fn log_history(&self, job_id: &str) -> Result<Vec<LogRecord>, ApiError>;

    /// Submit a staged run; the outcome carries the engine-assigned id.
    async fn start_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError>;

    /// Stop a queued or running job.
    async fn stop_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError>;

    /// Remove a job from the backend.
    async fn remove_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError>;

    /// Stage a fresh copy of a terminal job.
    async fn rerun_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError>;
}

#[async_trait]
impl Backend for RunApi {
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        RunApi::list_jobs(self).await
    }

    async fn job_status(&self, job_id: &str) -> Result<Job, ApiError> {
        RunApi::job_status(self, job_id).await
    }

    async fn log_history(&self, job_id: &str) -> Result<Vec<LogRecord>, ApiError> {
        RunApi::log_history(self, job_id).await
    }

    async fn start_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        RunApi::start_job(self, job_id).await
    }

    async fn stop_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        RunApi::stop_job(self, job_id).await
    }

    async fn remove_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        RunApi::remove_job(self, job_id).await
    }

    async fn rerun_job(&self, job_id: &str) -> Result<ActionOutcome, ApiError> {
        RunApi::rerun_job(self, job_id).await
    }
}
