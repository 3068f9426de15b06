//! Merge/render controller for one log viewer session.
//!
//! [`LogView`] produces a single ordered view of `[...history, ...live]`:
//! nothing renders until the history fetch resolves, history lines get
//! ascending ids in arrival order, and live lines continue the same id
//! sequence — so within a session, id order equals display order equals
//! arrival order, with every history id below every live id.

use pipewatch_api::LogRecord;
use pipewatch_core::log::{LogLine, LogLineKind};
use pipewatch_core::types::Timestamp;

/// Distance from the bottom (in pixels) within which the view counts as
/// "at the bottom" and stays pinned.
pub const SCROLL_PIN_THRESHOLD_PX: f64 = 40.0;

/// Spacing of synthesized history timestamps (history records carry none).
const HISTORY_BACKDATE_STEP_MS: i64 = 1;

/// Auto-scroll pin state.
///
/// `pinned` changes only through explicit scroll position reports or the
/// pause toggle — new content must never silently override a reader who
/// scrolled away from the bottom.
#[derive(Debug, Clone)]
pub struct AutoScroll {
    pinned: bool,
    paused: bool,
}

impl AutoScroll {
    pub fn new() -> Self {
        Self {
            pinned: true,
            paused: false,
        }
    }

    /// Report the current scroll position as a distance from the bottom.
    pub fn on_scroll(&mut self, distance_from_bottom: f64) {
        self.pinned = distance_from_bottom <= SCROLL_PIN_THRESHOLD_PX;
    }

    /// Flip the manual pause override.  Returns the new paused state.
    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Whether a state-changing event should scroll to the bottom now.
    pub fn should_follow(&self) -> bool {
        self.pinned && !self.paused
    }
}

impl Default for AutoScroll {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a viewer session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// History fetch outstanding; nothing renders yet.
    AwaitingHistory,
    /// History rendered; live lines are being accepted.
    Streaming,
    /// EOF received (or the job was already terminal); the view is the
    /// complete record.
    Ended,
    /// Live reconnect attempts exhausted without an EOF.
    Disconnected,
}

/// One viewer session's ordered, de-duplicated line list plus scroll state.
pub struct LogView {
    lines: Vec<LogLine>,
    next_id: u64,
    phase: ViewPhase,
    history_error: Option<String>,
    pub scroll: AutoScroll,
}

impl LogView {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            next_id: 1,
            phase: ViewPhase::AwaitingHistory,
            history_error: None,
            scroll: AutoScroll::new(),
        }
    }

    /// The rendered lines, in display order.
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// Inline "history unavailable" message, when the fetch failed.
    pub fn history_error(&self) -> Option<&str> {
        self.history_error.as_deref()
    }

    /// Whether the end-of-stream marker is shown.
    pub fn ended(&self) -> bool {
        self.phase == ViewPhase::Ended
    }

    /// Render the resolved history.
    ///
    /// Assigns ascending ids in record order with back-dated timestamps
    /// ending at the fetch time.  For a terminal job the history is the
    /// complete record and the session ends here; otherwise the view
    /// starts accepting live lines.  Returns whether to scroll to bottom.
    pub fn apply_history(&mut self, records: Vec<LogRecord>, job_is_terminal: bool) -> bool {
        if self.phase != ViewPhase::AwaitingHistory {
            tracing::warn!("apply_history called twice for one session, ignoring");
            return false;
        }

        let now = chrono::Utc::now();
        let count = records.len() as i64;
        for (index, record) in records.into_iter().enumerate() {
            let backdate = chrono::Duration::milliseconds(
                (count - 1 - index as i64) * HISTORY_BACKDATE_STEP_MS,
            );
            self.append(record.kind, record.content, now - backdate);
        }

        self.phase = if job_is_terminal {
            ViewPhase::Ended
        } else {
            ViewPhase::Streaming
        };
        self.scroll.should_follow()
    }

    /// Record a history fetch failure.
    ///
    /// Degrades, never blocks: for a non-terminal job the session still
    /// moves to streaming so whatever happens next is shown.
    pub fn history_failed(&mut self, error: impl Into<String>, job_is_terminal: bool) {
        if self.phase != ViewPhase::AwaitingHistory {
            return;
        }
        self.history_error = Some(error.into());
        self.phase = if job_is_terminal {
            ViewPhase::Ended
        } else {
            ViewPhase::Streaming
        };
    }

    /// Append a live line.  Returns whether to scroll to bottom.
    ///
    /// Lines arriving outside the streaming phase (before history
    /// resolved, or after EOF) are dropped.
    pub fn push_live(&mut self, kind: LogLineKind, content: String, timestamp: Timestamp) -> bool {
        if self.phase != ViewPhase::Streaming {
            tracing::warn!(?kind, "Dropping live line outside streaming phase");
            return false;
        }
        self.append(kind, content, timestamp);
        self.scroll.should_follow()
    }

    /// Flip the session to ended.  Idempotent: a repeated EOF changes
    /// neither the line count nor the single end-of-stream marker.
    /// Returns whether to scroll to bottom (false on the repeat).
    pub fn mark_eof(&mut self) -> bool {
        if self.phase == ViewPhase::Ended {
            return false;
        }
        self.phase = ViewPhase::Ended;
        self.scroll.should_follow()
    }

    /// Record reconnect exhaustion — a persistent indicator, no retry.
    pub fn mark_disconnected(&mut self) {
        if self.phase == ViewPhase::Streaming {
            self.phase = ViewPhase::Disconnected;
        }
    }

    fn append(&mut self, kind: LogLineKind, content: String, timestamp: Timestamp) {
        self.lines.push(LogLine {
            id: self.next_id,
            kind,
            content,
            timestamp,
        });
        self.next_id += 1;
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new()
    }
}
