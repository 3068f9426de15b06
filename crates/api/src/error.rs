//! Error taxonomy for the HTTP boundary.

/// Errors from the backend REST API layer.
///
/// The split between [`NotFound`](ApiError::NotFound) and everything else
/// matters: not-found is a definitive "stop polling, the job is gone"
/// signal, while transport and server errors are transient and retried by
/// the next poll tick.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned 404 for the requested job.
    #[error("Job {job_id} not found")]
    NotFound {
        /// The id that was requested.
        job_id: String,
    },

    /// The backend returned a non-2xx status code other than 404.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ApiError {
    /// True for the definitive "job is gone" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
