//! Log stream wire frames.
//!
//! The backend sends line-delimited JSON objects of the shape
//! `{"type": "<kind>", "line": "<text>"}` over the per-job WebSocket.  A
//! `control` frame whose line is `"EOF"` signals that the producing process
//! has ended and no further lines will arrive.

use pipewatch_core::log::{LogLineKind, EOF_SENTINEL};
use serde::Deserialize;

/// One inbound frame of a per-job log stream.
#[derive(Debug, Clone, Deserialize)]
pub struct LogFrame {
    #[serde(rename = "type")]
    pub kind: LogLineKind,
    pub line: String,
}

impl LogFrame {
    /// True for the end-of-stream sentinel.
    pub fn is_eof(&self) -> bool {
        self.kind == LogLineKind::Control && self.line == EOF_SENTINEL
    }
}

/// Parse a raw text frame into a typed [`LogFrame`].
pub fn parse_frame(text: &str) -> Result<LogFrame, serde_json::Error> {
    serde_json::from_str(text)
}
