//! Per-job live log transport.
//!
//! Each open log viewer owns exactly one [`LogStreamHandle`]: a WebSocket
//! connection to the job's log endpoint plus a task that parses inbound
//! frames and forwards them as [`LogStreamEvent`]s over an mpsc channel.
//! A single consumer loop per connection keeps ordering and cancellation
//! explicit — within one connection, events arrive in wire order.
//!
//! Reconnects are tail-only: lines the backend produced while the viewer
//! was disconnected are skipped, never replayed, so line ids stay strictly
//! increasing across reconnects.  Completeness across a reconnect is a
//! documented limitation of the protocol.

use futures::StreamExt;
use pipewatch_core::log::LogLineKind;
use pipewatch_core::types::{JobId, Timestamp};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream};
use tokio_util::sync::CancellationToken;

use crate::frames::parse_frame;
use crate::reconnect::{reconnect_loop, ReconnectOutcome, RetryPolicy};

/// Connection configuration for one job's log stream.
pub struct LogStreamClient {
    ws_base: String,
    job_id: JobId,
}

/// A live WebSocket connection to a job's log endpoint.
pub struct LogStreamConnection {
    pub job_id: JobId,
    /// The raw WebSocket stream for reading frames.
    pub ws_stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

/// Errors from the log stream transport.
#[derive(Debug, thiserror::Error)]
pub enum LogStreamError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Events delivered to the viewer session, in arrival order.
#[derive(Debug, Clone)]
pub enum LogStreamEvent {
    /// A new log line was produced.
    Line {
        kind: LogLineKind,
        content: String,
        /// Arrival time, standing in for server time (frames carry none).
        timestamp: Timestamp,
    },
    /// The producing process ended; no further lines will arrive.
    Eof,
    /// Reconnect attempts are exhausted; the session is over without EOF.
    Disconnected,
}

impl LogStreamClient {
    /// Create a client for one job's log stream.
    ///
    /// * `ws_base` - WebSocket base URL, e.g. `ws://host:8000`.
    /// * `job_id`  - the job whose log to follow.
    pub fn new(ws_base: impl Into<String>, job_id: impl Into<JobId>) -> Self {
        Self {
            ws_base: ws_base.into(),
            job_id: job_id.into(),
        }
    }

    /// The job this client follows.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Connect to the job's log endpoint.
    pub async fn connect(&self) -> Result<LogStreamConnection, LogStreamError> {
        let url = format!("{}/ws/jobs/{}/log", self.ws_base, self.job_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            LogStreamError::Connection(format!("Failed to connect to log stream at {url}: {e}"))
        })?;

        tracing::info!(job_id = %self.job_id, "Log stream connected");

        Ok(LogStreamConnection {
            job_id: self.job_id.clone(),
            ws_stream,
        })
    }
}

/// Running transport for one viewer session.
///
/// Dropping the handle (or calling [`close`](Self::close)) tears the
/// connection down deterministically; no event is delivered after that.
pub struct LogStreamHandle {
    /// Ordered event stream for the session's single consumer.
    pub events: mpsc::UnboundedReceiver<LogStreamEvent>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl LogStreamHandle {
    /// Tear the transport down.  Idempotent; safe to call mid-stream.
    pub fn close(&self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

impl Drop for LogStreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open the transport for one viewer session.
///
/// Spawns the connection task (connect → read frames → reconnect on drop)
/// and returns the handle owning its event channel.
pub fn open(client: LogStreamClient, policy: RetryPolicy) -> LogStreamHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();

    let task = tokio::spawn(async move {
        run_session(&client, &policy, &task_cancel, &tx).await;
    });

    LogStreamHandle {
        events: rx,
        cancel,
        task,
    }
}

/// How a single connection's read loop ended.
enum ReadEnd {
    /// EOF sentinel received — the session is over.
    Eof,
    /// The connection dropped without EOF.
    Dropped,
    /// The session was cancelled.
    Cancelled,
}

/// Core session loop: connect → read frames → reconnect until EOF,
/// cancellation, or retry exhaustion.
async fn run_session(
    client: &LogStreamClient,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    tx: &mpsc::UnboundedSender<LogStreamEvent>,
) {
    let mut conn = match client.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(job_id = %client.job_id(), error = %e, "Initial log stream connect failed");
            match reconnect_loop(client, policy, cancel).await {
                ReconnectOutcome::Connected(conn) => conn,
                ReconnectOutcome::Exhausted => {
                    let _ = tx.send(LogStreamEvent::Disconnected);
                    return;
                }
                ReconnectOutcome::Cancelled => return,
            }
        }
    };

    loop {
        match read_frames(&mut conn, cancel, tx).await {
            ReadEnd::Eof => {
                // Terminal event for the session; the socket is retired even
                // if the server keeps it open.
                let _ = tx.send(LogStreamEvent::Eof);
                return;
            }
            ReadEnd::Cancelled => return,
            ReadEnd::Dropped => {
                tracing::warn!(
                    job_id = %client.job_id(),
                    "Log stream dropped without EOF; lines produced while \
                     disconnected will be skipped",
                );
                match reconnect_loop(client, policy, cancel).await {
                    ReconnectOutcome::Connected(new_conn) => conn = new_conn,
                    ReconnectOutcome::Exhausted => {
                        let _ = tx.send(LogStreamEvent::Disconnected);
                        return;
                    }
                    ReconnectOutcome::Cancelled => return,
                }
            }
        }
    }
}

/// Read frames from one connection until EOF, drop, or cancellation.
async fn read_frames(
    conn: &mut LogStreamConnection,
    cancel: &CancellationToken,
    tx: &mpsc::UnboundedSender<LogStreamEvent>,
) -> ReadEnd {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => return ReadEnd::Cancelled,
            msg = conn.ws_stream.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => {
                if let Some(end) = handle_text_frame(&conn.job_id, &text, tx) {
                    return end;
                }
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                // Handled automatically by tungstenite.
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(job_id = %conn.job_id, ?frame, "Log stream closed by server");
                return ReadEnd::Dropped;
            }
            Some(Ok(_)) => {
                // Binary / Frame — the log protocol is text-only.
            }
            Some(Err(e)) => {
                tracing::error!(job_id = %conn.job_id, error = %e, "Log stream receive error");
                return ReadEnd::Dropped;
            }
            None => {
                tracing::info!(job_id = %conn.job_id, "Log stream exhausted");
                return ReadEnd::Dropped;
            }
        }
    }
}

/// Parse one text frame and forward it.  Returns `Some(ReadEnd::Eof)` when
/// the frame is the end-of-stream sentinel.
fn handle_text_frame(
    job_id: &str,
    text: &str,
    tx: &mpsc::UnboundedSender<LogStreamEvent>,
) -> Option<ReadEnd> {
    match parse_frame(text) {
        Ok(frame) if frame.is_eof() => Some(ReadEnd::Eof),
        Ok(frame) if frame.kind == LogLineKind::Control => {
            // Non-EOF control frames are not display text.
            tracing::debug!(job_id, line = %frame.line, "Ignoring control frame");
            None
        }
        Ok(frame) => {
            let _ = tx.send(LogStreamEvent::Line {
                kind: frame.kind,
                content: frame.line,
                timestamp: chrono::Utc::now(),
            });
            None
        }
        Err(e) => {
            tracing::warn!(job_id, error = %e, raw = %text, "Malformed log frame, skipping");
            None
        }
    }
}
