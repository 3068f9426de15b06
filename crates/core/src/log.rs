//! Log line types shared between the transports and the viewer.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Content of a `control` frame that marks the end of the producing
/// process.  Never rendered as text.
pub const EOF_SENTINEL: &str = "EOF";

/// Classification of a single log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLineKind {
    Stdout,
    Stderr,
    Info,
    Error,
    Status,
    /// Stream control messages (the EOF sentinel); not display text.
    Control,
    /// Unclassified output, shown as-is.
    Raw,
}

/// One rendered line of a viewer session.
///
/// `id` is client-assigned and monotonic within a session: id order equals
/// display order equals arrival order, with all history lines preceding all
/// live lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub id: u64,
    pub kind: LogLineKind,
    /// Raw text, possibly containing ANSI color escapes; passed through
    /// untouched for the presentation layer to interpret.
    pub content: String,
    /// Server time for live lines; a back-dated estimate for history lines
    /// (history carries no per-line timestamp).
    pub timestamp: Timestamp,
}
