//! REST client for job status and log history.
//!
//! [`RunApi`] holds a pooled [`reqwest::Client`] and the backend base URL.
//! All methods are pure reads; what to do with the result (update a row,
//! stop a poll handle, open a viewer) is the caller's business.

use pipewatch_core::job::Job;
use pipewatch_core::log::LogLineKind;
use serde::Deserialize;

use crate::error::ApiError;

/// HTTP client for one pipeline backend.
pub struct RunApi {
    client: reqwest::Client,
    base_url: String,
}

/// A raw historical log record as returned by the backend.
///
/// History carries no per-line timestamp; the viewer synthesizes one when
/// it assigns line ids.
#[derive(Debug, Clone, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "type")]
    pub kind: LogLineKind,
    pub content: String,
}

impl RunApi {
    /// Create a client for the backend at `base_url`
    /// (e.g. `http://host:8000`, no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across components).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Base HTTP URL of the backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetch the full job collection.
    ///
    /// Used to seed the dashboard and to reconcile which ids should be
    /// polling.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/jobs", self.base_url))
            .send()
            .await?;

        Self::parse_response(response, None).await
    }

    /// Fetch a single job's current state.
    ///
    /// Returns [`ApiError::NotFound`] when the job no longer exists (e.g.
    /// removed by another session), distinguishable from transient failures.
    pub async fn job_status(&self, job_id: &str) -> Result<Job, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/jobs/{}", self.base_url, job_id))
            .send()
            .await?;

        Self::parse_response(response, Some(job_id)).await
    }

    /// Fetch the log lines a job has produced so far, in order.
    ///
    /// For an already-terminated job this is the complete log; no stream is
    /// opened afterwards.
    pub async fn log_history(&self, job_id: &str) -> Result<Vec<LogRecord>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/jobs/{}/log", self.base_url, job_id))
            .send()
            .await?;

        Self::parse_response(response, Some(job_id)).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    ///
    /// A 404 becomes [`ApiError::NotFound`] when a `job_id` is in scope;
    /// any other non-2xx becomes [`ApiError::Api`] carrying the body text.
    pub(crate) async fn ensure_success(
        response: reqwest::Response,
        job_id: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(job_id) = job_id {
                return Err(ApiError::NotFound {
                    job_id: job_id.to_string(),
                });
            }
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        job_id: Option<&str>,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response, job_id).await?;
        Ok(response.json::<T>().await?)
    }
}
