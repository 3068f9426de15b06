//! Integration tests for the shared notification feed.

use std::time::Duration;

use assert_matches::assert_matches;
use futures::SinkExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use pipewatch_stream::{FeedEvent, JobEvent, NotificationFeed};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn next_feed_event(rx: &mut broadcast::Receiver<FeedEvent>) -> FeedEvent {
    timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("feed channel closed unexpectedly")
}

// ---------------------------------------------------------------------------
// Test: one connection fans out to every subscriber
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fans_out_to_all_subscribers_over_one_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        // Exactly one connection is expected no matter how many subscribers.
        let (socket, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(socket)
            .await
            .expect("ws handshake");
        ws.send(Message::Text(
            r#"{"event_type": "job_completed", "job_id": "run-9",
                "run_name": "sample-b", "message": "Run finished"}"#
                .to_string(),
        ))
        .await
        .expect("send");
        std::future::pending::<()>().await;
    });

    let feed = NotificationFeed::start_with(format!("ws://{addr}"), Duration::from_millis(20));
    let mut rx1 = feed.subscribe();
    let mut rx2 = feed.subscribe();

    for rx in [&mut rx1, &mut rx2] {
        assert_matches!(next_feed_event(rx).await, FeedEvent::Connected);
        assert_matches!(
            next_feed_event(rx).await,
            FeedEvent::Event(JobEvent::Completed { ref job_id, .. }) if job_id == "run-9"
        );
    }

    feed.shutdown();
}

// ---------------------------------------------------------------------------
// Test: the feed reconnects after the server drops it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconnects_after_server_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
        // First connection: one event, then close.
        let (socket, _) = listener.accept().await.expect("accept 1");
        let mut ws = tokio_tungstenite::accept_async(socket).await.expect("ws 1");
        ws.send(Message::Text(
            r#"{"event_type": "job_started", "job_id": "run-1",
                "run_name": null, "message": "Run started"}"#
                .to_string(),
        ))
        .await
        .expect("send 1");
        let _ = ws.close(None).await;
        drop(ws);

        // Second connection: another event, then stay open.
        let (socket, _) = listener.accept().await.expect("accept 2");
        let mut ws = tokio_tungstenite::accept_async(socket).await.expect("ws 2");
        ws.send(Message::Text(
            r#"{"event_type": "job_failed", "job_id": "run-1",
                "run_name": null, "message": "Process crashed"}"#
                .to_string(),
        ))
        .await
        .expect("send 2");
        std::future::pending::<()>().await;
    });

    let feed = NotificationFeed::start_with(format!("ws://{addr}"), Duration::from_millis(20));
    let mut rx = feed.subscribe();

    assert_matches!(next_feed_event(&mut rx).await, FeedEvent::Connected);
    assert_matches!(
        next_feed_event(&mut rx).await,
        FeedEvent::Event(JobEvent::Started { .. })
    );
    assert_matches!(next_feed_event(&mut rx).await, FeedEvent::Disconnected);
    assert_matches!(next_feed_event(&mut rx).await, FeedEvent::Connected);
    assert_matches!(
        next_feed_event(&mut rx).await,
        FeedEvent::Event(JobEvent::Failed { .. })
    );

    feed.shutdown();
}
