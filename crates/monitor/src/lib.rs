//! Client-side coordination for watching pipeline runs.
//!
//! This crate owns the stateful pieces that sit between the boundary
//! crates (`pipewatch-api`, `pipewatch-stream`) and a presentation layer:
//! the per-job polling registry, the log viewer's merge controller and
//! session orchestration, the bounded notification center, and the
//! dashboard row state.

pub mod dashboard;
pub mod log_view;
pub mod notify_center;
pub mod poller;
pub mod session;
pub mod source;

pub use dashboard::Dashboard;
pub use log_view::{AutoScroll, LogView, ViewPhase};
pub use notify_center::{NotificationCenter, Toast};
pub use poller::{PollEvent, PollRegistry, DEFAULT_POLL_INTERVAL};
pub use session::{LogSession, LogSessionConfig};
pub use source::Backend;
