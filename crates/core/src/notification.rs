//! Notification records kept by the client-side notification center.

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

/// Severity / styling class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationKind {
    /// Map a backend `status_variant` string, falling back to `Info` for
    /// anything unrecognized (notification styling is best-effort).
    pub fn from_variant(variant: &str) -> Self {
        match variant {
            "success" => Self::Success,
            "error" => Self::Error,
            "warning" => Self::Warning,
            _ => Self::Info,
        }
    }
}

/// One entry of the bounded notification log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLogItem {
    /// Client-generated unique token.
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub job_id: Option<JobId>,
    pub run_name: Option<String>,
    pub timestamp: Timestamp,
}

impl NotificationLogItem {
    /// Create an item stamped with a fresh UUID and the current time.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
            job_id: None,
            run_name: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Attach the originating job.
    pub fn with_job(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Attach the human-readable run name.
    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = Some(run_name.into());
        self
    }
}
