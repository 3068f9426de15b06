//! Log viewer session orchestration.
//!
//! A [`LogSession`] ties one job's history fetch and (for non-terminal
//! jobs) its live transport to a [`LogView`].  The ordering rule is
//! enforced here: the transport is opened only *after* the history fetch
//! has resolved — success or failure — and never for a terminal job,
//! whose history is the complete record.

use pipewatch_core::job::Job;
use pipewatch_stream::log_stream::{self, LogStreamClient, LogStreamEvent};
use pipewatch_stream::{LogStreamHandle, RetryPolicy};

use crate::log_view::LogView;
use crate::source::Backend;

/// Connection settings shared by all viewer sessions.
#[derive(Debug, Clone)]
pub struct LogSessionConfig {
    /// WebSocket base URL, e.g. `ws://host:8000`.
    pub ws_base: String,
    /// Reconnect policy for the live transport.
    pub retry: RetryPolicy,
}

/// One open log viewer: the merged view plus the live transport, if any.
///
/// Dropping the session tears the transport down; a fresh session starts
/// from a fresh view with its own id counter and EOF state.
pub struct LogSession {
    pub view: LogView,
    stream: Option<LogStreamHandle>,
}

impl LogSession {
    /// Open a session for `job`.
    ///
    /// Fetches history first (always), then opens the live transport only
    /// when the job is non-terminal.  A history failure is recorded inline
    /// and does not block the live attempt.
    pub async fn open(backend: &dyn Backend, job: &Job, config: &LogSessionConfig) -> Self {
        let mut view = LogView::new();

        match backend.log_history(&job.id).await {
            Ok(records) => {
                tracing::debug!(job_id = %job.id, count = records.len(), "Log history loaded");
                view.apply_history(records, job.is_terminal());
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Log history fetch failed");
                view.history_failed(e.to_string(), job.is_terminal());
            }
        }

        let stream = if job.is_terminal() {
            None
        } else {
            let client = LogStreamClient::new(&config.ws_base, &job.id);
            Some(log_stream::open(client, config.retry.clone()))
        };

        Self { view, stream }
    }

    /// Whether a live transport is attached (never true for terminal jobs).
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Wait for the next live event and fold it into the view.
    ///
    /// Returns `Some(scroll_to_bottom)` per event, or `None` once the
    /// transport is finished (EOF, disconnection, teardown) or was never
    /// opened.
    pub async fn advance(&mut self) -> Option<bool> {
        let stream = self.stream.as_mut()?;

        match stream.events.recv().await {
            Some(LogStreamEvent::Line {
                kind,
                content,
                timestamp,
            }) => Some(self.view.push_live(kind, content, timestamp)),
            Some(LogStreamEvent::Eof) => Some(self.view.mark_eof()),
            Some(LogStreamEvent::Disconnected) => {
                self.view.mark_disconnected();
                Some(false)
            }
            None => {
                self.stream = None;
                None
            }
        }
    }

    /// Close the viewer: tear the transport down deterministically.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.close();
        }
    }
}
