//! Shared domain types for the pipewatch client.
//!
//! Everything that crosses a crate boundary lives here: the run model and
//! its canonical status enum, log line types, and notification records.

pub mod job;
pub mod log;
pub mod notification;
pub mod types;
