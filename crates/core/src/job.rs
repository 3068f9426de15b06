//! Pipeline run model and canonical status enum.
//!
//! The backend speaks two overlapping status vocabularies: the engine's own
//! states (`started`, `canceled`) and the UI-facing aliases (`running`,
//! `stopped`).  Both are collapsed into one closed [`JobStatus`] enum at the
//! deserialization boundary; unknown strings are rejected rather than
//! silently defaulted.

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

/// Canonical lifecycle state of a pipeline run.
///
/// Ordering of the variants mirrors the normal lifecycle progression,
/// but transitions are driven entirely by the backend — the client only
/// observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobStatus {
    /// Inputs uploaded, run configured, not yet submitted to the engine.
    Staged,
    /// Submitted and waiting for an execution slot.
    Queued,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Finished,
    /// Completed with an error.
    Failed,
    /// Stopped before completion (by the user or the system).
    Canceled,
}

impl JobStatus {
    /// Map a backend status string to the canonical enum.
    ///
    /// Accepts both the engine vocabulary (`started`, `canceled`) and the
    /// UI vocabulary (`running`, `stopped`), case-insensitively.
    pub fn parse(s: &str) -> Result<Self, UnknownStatus> {
        match s.to_ascii_lowercase().as_str() {
            "staged" => Ok(Self::Staged),
            "queued" => Ok(Self::Queued),
            "started" | "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            "failed" => Ok(Self::Failed),
            "stopped" | "canceled" | "cancelled" => Ok(Self::Canceled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }

    /// Canonical lowercase name, used when serializing.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staged => "staged",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// True when no further transition is expected.
    ///
    /// Terminal runs are never polled and never get a live log connection;
    /// their history fetch is the complete record.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for JobStatus {
    type Error = UnknownStatus;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A status string that belongs to neither vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown job status: {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

/// Free-form run metadata supplied at submission time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMeta {
    /// Human-chosen run name shown in dashboards and notifications.
    pub run_name: Option<String>,
    pub description: Option<String>,
    /// Pipeline the run executes (e.g. `"rnaseq"`).
    pub pipeline: Option<String>,
    /// Input / pipeline parameters, passed through untouched.
    #[serde(default)]
    pub params: serde_json::Value,
    /// Engine-reported progress text (e.g. current process name).
    pub progress: Option<String>,
}

/// Resource usage reported by the engine for a finished (or running) job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResources {
    pub peak_memory_mb: Option<f64>,
    pub avg_cpu_percent: Option<f64>,
    pub duration_secs: Option<f64>,
}

/// A pipeline run as reported by the backend.
///
/// The client never mutates a `Job`; it requests actions
/// (start/stop/remove/rerun) and re-fetches.  Timestamps are optional and,
/// when present, non-decreasing in lifecycle order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub staged_at: Option<Timestamp>,
    pub enqueued_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    #[serde(default)]
    pub meta: RunMeta,
    pub resources: Option<RunResources>,
    /// Engine error message for failed runs.
    pub error: Option<String>,
}

impl Job {
    /// True when the run can no longer change (see [`JobStatus::is_terminal`]).
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
