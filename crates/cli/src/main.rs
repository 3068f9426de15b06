//! `pipewatch` -- headless watcher for pipeline runs.
//!
//! Seeds a dashboard from the engine's job list, polls every active run,
//! subscribes to the shared notification feed, optionally tails one job's
//! log, and logs updates until Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable                       | Required | Default | Description                         |
//! |--------------------------------|----------|---------|-------------------------------------|
//! | `PIPEWATCH_API_URL`            | yes      | --      | HTTP base URL, e.g. `http://host:8000` |
//! | `PIPEWATCH_WS_URL`             | yes      | --      | WebSocket base URL, e.g. `ws://host:8000` |
//! | `PIPEWATCH_POLL_INTERVAL_SECS` | no       | `5`     | Seconds between job status polls    |
//! | `PIPEWATCH_TAIL_JOB`           | no       | --      | Job id whose log to tail            |

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipewatch_api::RunApi;
use pipewatch_monitor::{
    Dashboard, LogSession, LogSessionConfig, NotificationCenter, PollEvent, PollRegistry,
    ViewPhase,
};
use pipewatch_stream::{FeedEvent, NotificationFeed, RetryPolicy};

use config::WatchConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipewatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WatchConfig::from_env();
    tracing::info!(
        api_url = %config.api_url,
        ws_url = %config.ws_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Starting pipewatch",
    );

    let backend = Arc::new(RunApi::new(&config.api_url));
    let (registry, mut poll_rx) = PollRegistry::new(backend.clone(), config.poll_interval);

    let mut dashboard = Dashboard::new(backend.clone(), registry.clone());
    dashboard
        .load()
        .await
        .context("failed to load the job list")?;
    for job in dashboard.rows() {
        tracing::info!(
            job_id = %job.id,
            status = %job.status,
            run_name = job.meta.run_name.as_deref().unwrap_or("-"),
            "Job",
        );
    }

    let feed = NotificationFeed::start(config.events_url());
    let mut feed_rx = feed.subscribe();
    let mut center = NotificationCenter::new();

    let mut tail = match config.tail_job.as_deref() {
        Some(job_id) => open_tail(&backend, job_id, &config).await,
        None => None,
    };
    let mut tail_printed = 0;
    if let Some(session) = &tail {
        if let Some(error) = session.view.history_error() {
            tracing::warn!(error, "Log history unavailable, tailing live only");
        }
        print_tail_lines(session, &mut tail_printed);
        if session.view.ended() {
            // Terminal job: the history is the complete record.
            tracing::info!("End of stream");
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }

            event = poll_rx.recv() => {
                let Some(event) = event else { break };
                match &event {
                    PollEvent::Status(job) => {
                        tracing::info!(
                            job_id = %job.id,
                            status = %job.status,
                            progress = job.meta.progress.as_deref().unwrap_or("-"),
                            "Status update",
                        );
                    }
                    PollEvent::Vanished(job_id) => {
                        tracing::info!(job_id = %job_id, "Job vanished");
                    }
                }
                dashboard.apply_poll_event(event).await;
            }

            step = tail_step(&mut tail) => {
                match step {
                    Some(_) => {
                        // A view mutation happened; print whatever is new.
                        if let Some(session) = &tail {
                            print_tail_lines(session, &mut tail_printed);
                            if session.view.ended() {
                                tracing::info!("End of stream");
                            }
                            if session.view.phase() == ViewPhase::Disconnected {
                                tracing::warn!("Log stream disconnected, no further retries");
                            }
                        }
                    }
                    None => {
                        tail = None;
                    }
                }
            }

            feed_event = feed_rx.recv() => {
                match feed_event {
                    Ok(FeedEvent::Event(event)) => {
                        let toast = center.apply(&event);
                        tracing::info!(
                            job_id = toast.job_id.as_deref().unwrap_or("-"),
                            kind = ?toast.kind,
                            unread = center.unread(),
                            "{}", toast.message,
                        );
                    }
                    Ok(FeedEvent::Connected) => {
                        tracing::info!("Notification feed connected");
                    }
                    Ok(FeedEvent::Disconnected) => {
                        tracing::warn!("Notification feed dropped, reconnect pending");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notification feed receiver lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::error!("Notification feed closed");
                        break;
                    }
                }
            }
        }
    }

    if let Some(mut session) = tail.take() {
        session.close();
    }
    registry.shutdown().await;
    feed.shutdown();
    Ok(())
}

/// Open a log tail session for one job, if it exists.
async fn open_tail(
    backend: &Arc<RunApi>,
    job_id: &str,
    config: &WatchConfig,
) -> Option<LogSession> {
    let job = match backend.job_status(job_id).await {
        Ok(job) => job,
        Err(e) => {
            tracing::error!(job_id, error = %e, "Cannot tail job");
            return None;
        }
    };

    tracing::info!(job_id, status = %job.status, "Tailing log");
    let session_config = LogSessionConfig {
        ws_base: config.ws_url.clone(),
        retry: RetryPolicy::default(),
    };
    Some(LogSession::open(backend.as_ref(), &job, &session_config).await)
}

/// Wait for the next tail event; pends forever when no tail is attached.
async fn tail_step(tail: &mut Option<LogSession>) -> Option<bool> {
    match tail {
        Some(session) => session.advance().await,
        None => std::future::pending().await,
    }
}

/// Print view lines that arrived since the last call.
fn print_tail_lines(session: &LogSession, printed: &mut usize) {
    for line in &session.view.lines()[*printed..] {
        tracing::info!(kind = ?line.kind, "{}", line.content);
    }
    *printed = session.view.lines().len();
}
