//! Request/response client for the pipeline backend.
//!
//! Wraps the backend's JSON HTTP API (job listing, single-job status, log
//! history, run actions) using [`reqwest`].  This is the only
//! request/response boundary the watcher consumes; the push streams live in
//! `pipewatch-stream`.

pub mod actions;
pub mod client;
pub mod error;

pub use actions::{ActionOutcome, BatchOutcome};
pub use client::{LogRecord, RunApi};
pub use error::ApiError;
