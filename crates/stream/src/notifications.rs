//! Shared notification feed.
//!
//! One WebSocket connection per process, independent of any open log
//! viewer, receives job lifecycle events from the backend's global event
//! endpoint.  Events are fanned out on a [`tokio::sync::broadcast`] channel
//! so any number of components share the single underlying connection.
//!
//! Unlike per-viewer log streams, the feed reconnects for the life of the
//! process at a fixed delay — it is page-lifetime infrastructure with no
//! user gesture to reopen it.  Subscribers observe connectivity through
//! [`FeedEvent::Connected`] / [`FeedEvent::Disconnected`] markers.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pipewatch_core::notification::NotificationKind;
use pipewatch_core::types::JobId;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Broadcast channel capacity for feed events.
const FEED_CHANNEL_CAPACITY: usize = 256;

/// Delay between feed reconnection attempts.
const FEED_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// A job lifecycle event from the global notification stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event_type")]
pub enum JobEvent {
    /// A run began executing.
    #[serde(rename = "job_started")]
    Started {
        job_id: JobId,
        run_name: Option<String>,
        message: String,
        status_variant: Option<String>,
    },

    /// A run reported progress.
    #[serde(rename = "job_progress")]
    Progress {
        job_id: JobId,
        run_name: Option<String>,
        message: String,
        status_variant: Option<String>,
    },

    /// A run completed successfully.
    #[serde(rename = "job_completed")]
    Completed {
        job_id: JobId,
        run_name: Option<String>,
        message: String,
        status_variant: Option<String>,
    },

    /// A run failed.
    #[serde(rename = "job_failed")]
    Failed {
        job_id: JobId,
        run_name: Option<String>,
        message: String,
        status_variant: Option<String>,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Started { job_id, .. }
            | Self::Progress { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. } => job_id,
        }
    }

    pub fn run_name(&self) -> Option<&str> {
        match self {
            Self::Started { run_name, .. }
            | Self::Progress { run_name, .. }
            | Self::Completed { run_name, .. }
            | Self::Failed { run_name, .. } => run_name.as_deref(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Started { message, .. }
            | Self::Progress { message, .. }
            | Self::Completed { message, .. }
            | Self::Failed { message, .. } => message,
        }
    }

    /// Notification styling for this event.
    ///
    /// The backend's `status_variant` wins when present; otherwise the
    /// event kind decides.
    pub fn notification_kind(&self) -> NotificationKind {
        let variant = match self {
            Self::Started { status_variant, .. }
            | Self::Progress { status_variant, .. }
            | Self::Completed { status_variant, .. }
            | Self::Failed { status_variant, .. } => status_variant.as_deref(),
        };
        match variant {
            Some(v) => NotificationKind::from_variant(v),
            None => match self {
                Self::Completed { .. } => NotificationKind::Success,
                Self::Failed { .. } => NotificationKind::Error,
                Self::Started { .. } | Self::Progress { .. } => NotificationKind::Info,
            },
        }
    }
}

/// What subscribers of the feed observe.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// The feed connection is up.
    Connected,
    /// The feed connection dropped; a reconnect is pending.
    Disconnected,
    /// A job event arrived.
    Event(JobEvent),
}

/// The single shared notification transport.
///
/// Created once at startup via [`NotificationFeed::start`]; the returned
/// `Arc` is cheap to clone into any component that wants to subscribe.
pub struct NotificationFeed {
    event_tx: broadcast::Sender<FeedEvent>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl NotificationFeed {
    /// Connect to the global event endpoint and keep the feed alive.
    ///
    /// * `ws_url` - full endpoint URL, e.g. `ws://host:8000/ws/events`.
    pub fn start(ws_url: impl Into<String>) -> Arc<Self> {
        Self::start_with(ws_url, FEED_RECONNECT_DELAY)
    }

    /// [`start`](Self::start) with an explicit reconnect delay (tests run
    /// at millisecond scale).
    pub fn start_with(ws_url: impl Into<String>, reconnect_delay: Duration) -> Arc<Self> {
        let ws_url = ws_url.into();
        let (event_tx, _) = broadcast::channel(FEED_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let task_tx = event_tx.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            run_feed(&ws_url, reconnect_delay, &task_tx, &task_cancel).await;
        });

        Arc::new(Self {
            event_tx,
            cancel,
            task,
        })
    }

    /// Subscribe to feed events.  Every subscriber sees every event; the
    /// underlying connection is shared.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.event_tx.subscribe()
    }

    /// Stop the feed task.  Subscribers' channels close once the sender is
    /// dropped with the feed.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Connect-process-reconnect loop, for the life of the process.
async fn run_feed(
    ws_url: &str,
    reconnect_delay: Duration,
    event_tx: &broadcast::Sender<FeedEvent>,
    cancel: &CancellationToken,
) {
    loop {
        tracing::info!(url = %ws_url, "Connecting to notification feed");

        let connect = tokio::select! {
            _ = cancel.cancelled() => return,
            result = connect_async(ws_url) => result,
        };

        match connect {
            Ok((ws_stream, _response)) => {
                tracing::info!("Notification feed connected");
                let _ = event_tx.send(FeedEvent::Connected);

                read_feed(ws_stream, event_tx, cancel).await;
                if cancel.is_cancelled() {
                    return;
                }

                tracing::warn!("Notification feed dropped, reconnecting");
                let _ = event_tx.send(FeedEvent::Disconnected);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Notification feed connection failed");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

/// Read feed frames until the connection drops or the feed is cancelled.
async fn read_feed(
    mut ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    event_tx: &broadcast::Sender<FeedEvent>,
    cancel: &CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => return,
            msg = ws_stream.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<JobEvent>(&text) {
                Ok(event) => {
                    let _ = event_tx.send(FeedEvent::Event(event));
                }
                Err(e) => {
                    tracing::warn!(error = %e, raw = %text, "Unknown or malformed feed event");
                }
            },
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                // Handled automatically by tungstenite.
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Notification feed closed by server");
                return;
            }
            Some(Ok(_)) => {
                // Binary / Frame — the feed is text-only.
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Notification feed receive error");
                return;
            }
            None => {
                tracing::info!("Notification feed stream exhausted");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_event_defaults_to_success() {
        let event: JobEvent = serde_json::from_str(
            r#"{"event_type": "job_completed", "job_id": "run-1",
                "run_name": "sample-a", "message": "Run finished"}"#,
        )
        .unwrap();

        assert_eq!(event.job_id(), "run-1");
        assert_eq!(event.run_name(), Some("sample-a"));
        assert_eq!(event.notification_kind(), NotificationKind::Success);
    }

    #[test]
    fn status_variant_overrides_event_kind() {
        let event: JobEvent = serde_json::from_str(
            r#"{"event_type": "job_completed", "job_id": "run-1",
                "run_name": null, "message": "Finished with warnings",
                "status_variant": "warning"}"#,
        )
        .unwrap();

        assert_eq!(event.notification_kind(), NotificationKind::Warning);
    }

    #[test]
    fn failed_event_defaults_to_error() {
        let event: JobEvent = serde_json::from_str(
            r#"{"event_type": "job_failed", "job_id": "run-2",
                "run_name": null, "message": "Process crashed"}"#,
        )
        .unwrap();

        assert_eq!(event.notification_kind(), NotificationKind::Error);
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let result = serde_json::from_str::<JobEvent>(
            r#"{"event_type": "job_paused", "job_id": "run-3", "message": "?"}"#,
        );
        assert!(result.is_err());
    }
}
