//! Push-stream boundary of the pipewatch client.
//!
//! Two server-to-client streams are consumed: a per-job log stream (one
//! WebSocket per open viewer, capped fixed-interval reconnect) and a single
//! shared notification feed (one WebSocket per process, fanned out over a
//! broadcast channel, reconnecting for the life of the process).

pub mod frames;
pub mod log_stream;
pub mod notifications;
pub mod reconnect;

pub use frames::LogFrame;
pub use log_stream::{LogStreamClient, LogStreamEvent, LogStreamHandle};
pub use notifications::{FeedEvent, JobEvent, NotificationFeed};
pub use reconnect::{ReconnectOutcome, RetryPolicy};
