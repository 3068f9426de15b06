//! Integration tests for the poll registry.
//!
//! These run against the scripted backend at millisecond poll intervals;
//! no network is involved.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use tokio::sync::mpsc;
use tokio::time::timeout;

use common::{Scripted, ScriptedBackend};
use pipewatch_core::job::JobStatus;
use pipewatch_monitor::{PollEvent, PollRegistry};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn next_event(rx: &mut mpsc::UnboundedReceiver<PollEvent>) -> PollEvent {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for poll event")
        .expect("poll event channel closed")
}

/// Wait until the backend has seen at least `n` fetches.
async fn wait_for_fetches(backend: &ScriptedBackend, n: usize) {
    timeout(RECV_TIMEOUT, async {
        while backend.fetches() < n {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("timed out waiting for fetch count");
}

// ---------------------------------------------------------------------------
// Test: starting twice never creates a second timer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_is_idempotent() {
    let backend = ScriptedBackend::new();
    // An interval long enough that only the immediate fetch can happen.
    let (registry, mut rx) = PollRegistry::new(backend.clone(), Duration::from_secs(3600));

    registry.start("run-1".to_string()).await;
    registry.start("run-1".to_string()).await;

    assert_matches!(next_event(&mut rx).await, PollEvent::Status(_));
    tokio::time::sleep(Duration::from_millis(50)).await;

    // One handle, one immediate fetch — not two.
    assert_eq!(backend.fetches(), 1);
    assert_eq!(registry.active_ids().await, vec!["run-1".to_string()]);

    registry.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: a terminal status ends polling after the final update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminal_status_stops_polling() {
    let backend = ScriptedBackend::new();
    backend.script_status([
        Scripted::Status(JobStatus::Running),
        Scripted::Status(JobStatus::Finished),
    ]);

    let (registry, mut rx) = PollRegistry::new(backend.clone(), Duration::from_millis(10));
    registry.start("run-1".to_string()).await;

    assert_matches!(
        next_event(&mut rx).await,
        PollEvent::Status(job) if job.status == JobStatus::Running
    );
    assert_matches!(
        next_event(&mut rx).await,
        PollEvent::Status(job) if job.status == JobStatus::Finished
    );

    // No further ticks once terminal.
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(backend.fetches(), 2);
    assert!(!registry.is_polling("run-1").await);
}

// ---------------------------------------------------------------------------
// Test: not-found is definitive — emit Vanished and stop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_emits_vanished_and_stops() {
    let backend = ScriptedBackend::new();
    backend.script_status([Scripted::NotFound]);

    let (registry, mut rx) = PollRegistry::new(backend.clone(), Duration::from_millis(10));
    registry.start("run-gone".to_string()).await;

    assert_matches!(
        next_event(&mut rx).await,
        PollEvent::Vanished(job_id) if job_id == "run-gone"
    );

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.fetches(), 1);
    assert!(!registry.is_polling("run-gone").await);
}

// ---------------------------------------------------------------------------
// Test: transient failures retry on the next tick without an event
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transient_failure_retries_silently() {
    let backend = ScriptedBackend::new();
    backend.script_status([
        Scripted::ServerError,
        Scripted::Status(JobStatus::Running),
    ]);

    let (registry, mut rx) = PollRegistry::new(backend.clone(), Duration::from_millis(10));
    registry.start("run-1".to_string()).await;

    // The first event is the second tick's success; the 500 was absorbed.
    assert_matches!(
        next_event(&mut rx).await,
        PollEvent::Status(job) if job.status == JobStatus::Running
    );
    assert!(backend.fetches() >= 2);
    assert!(registry.is_polling("run-1").await);

    registry.shutdown().await;
}

// ---------------------------------------------------------------------------
// Test: a response that races stop() must not surface
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stale_response_after_stop_is_discarded() {
    let backend = ScriptedBackend::new();
    let gate = Arc::new(tokio::sync::Notify::new());
    *backend.status_gate.lock().unwrap() = Some(gate.clone());

    let (registry, mut rx) = PollRegistry::new(backend.clone(), Duration::from_millis(10));
    registry.start("run-1".to_string()).await;

    // The immediate fetch is now parked at the gate.
    wait_for_fetches(&backend, 1).await;

    assert!(registry.stop("run-1").await);
    gate.notify_one();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(
        rx.try_recv().is_err(),
        "no event may be delivered after stop()"
    );
    assert!(!registry.is_polling("run-1").await);
}

// ---------------------------------------------------------------------------
// Test: stop on an unknown id is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_unknown_id_is_noop() {
    let backend = ScriptedBackend::new();
    let (registry, _rx) = PollRegistry::new(backend, Duration::from_millis(10));

    assert!(!registry.stop("never-started").await);
}

// ---------------------------------------------------------------------------
// Test: independent jobs poll independently
// ---------------------------------------------------------------------------

#[tokio::test]
async fn jobs_poll_independently() {
    let backend = ScriptedBackend::new();
    let (registry, mut rx) = PollRegistry::new(backend.clone(), Duration::from_secs(3600));

    registry.start("run-a".to_string()).await;
    registry.start("run-b".to_string()).await;

    let first = next_event(&mut rx).await;
    let second = next_event(&mut rx).await;
    let mut seen: Vec<String> = [first, second]
        .into_iter()
        .map(|event| match event {
            PollEvent::Status(job) => job.id,
            PollEvent::Vanished(id) => id,
        })
        .collect();
    seen.sort();
    assert_eq!(seen, vec!["run-a".to_string(), "run-b".to_string()]);

    // Stopping one leaves the other's handle in place.
    registry.stop("run-a").await;
    assert!(!registry.is_polling("run-a").await);
    assert!(registry.is_polling("run-b").await);

    registry.shutdown().await;
}
