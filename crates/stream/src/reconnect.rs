//! Fixed-interval, attempt-capped reconnection for per-job log streams.
//!
//! When a log stream connection drops unexpectedly, [`reconnect_loop`]
//! retries at a fixed delay up to a bounded number of attempts.  After the
//! cap the viewer is reported as disconnected and no further automatic
//! retries happen — the user has to reopen the viewer.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::log_stream::{LogStreamClient, LogStreamConnection};

/// Tunable parameters for log stream reconnection.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Maximum number of attempts before giving up.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_attempts: 5,
        }
    }
}

/// Result of a reconnection run.
pub enum ReconnectOutcome {
    /// A connection was re-established.
    Connected(LogStreamConnection),
    /// All attempts failed; the viewer must surface "disconnected".
    Exhausted,
    /// The session was torn down while retrying.
    Cancelled,
}

/// Attempt to reconnect a per-job log stream.
///
/// Waits `policy.delay` before each attempt, respecting `cancel` at every
/// suspension point.
pub async fn reconnect_loop(
    client: &LogStreamClient,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> ReconnectOutcome {
    for attempt in 1..=policy.max_attempts {
        tokio::select! {
            _ = cancel.cancelled() => return ReconnectOutcome::Cancelled,
            _ = tokio::time::sleep(policy.delay) => {}
        }

        tracing::info!(
            job_id = %client.job_id(),
            attempt,
            max_attempts = policy.max_attempts,
            "Reconnecting log stream",
        );

        tokio::select! {
            _ = cancel.cancelled() => return ReconnectOutcome::Cancelled,
            result = client.connect() => {
                match result {
                    Ok(conn) => {
                        tracing::info!(job_id = %client.job_id(), attempt, "Log stream reconnected");
                        return ReconnectOutcome::Connected(conn);
                    }
                    Err(e) => {
                        tracing::warn!(
                            job_id = %client.job_id(),
                            attempt,
                            error = %e,
                            "Log stream reconnect attempt failed",
                        );
                    }
                }
            }
        }
    }

    tracing::warn!(
        job_id = %client.job_id(),
        max_attempts = policy.max_attempts,
        "Log stream reconnect attempts exhausted",
    );
    ReconnectOutcome::Exhausted
}
