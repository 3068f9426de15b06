//! Bounded notification log with unread counting.
//!
//! Every feed event is recorded unconditionally: a transient toast for
//! the presentation layer plus a [`NotificationLogItem`] prepended to a
//! bounded most-recent-first ring (oldest evicted past the cap).  The
//! unread counter increments unless the notification panel is open, in
//! which case arrivals are implicitly read.

use std::collections::VecDeque;

use pipewatch_core::notification::{NotificationKind, NotificationLogItem};
use pipewatch_core::types::JobId;
use pipewatch_stream::JobEvent;

/// Maximum number of retained notification log entries.
pub const NOTIFICATION_LOG_CAP: usize = 50;

/// A transient toast for the presentation layer to display.
#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: NotificationKind,
    pub message: String,
    pub job_id: Option<JobId>,
    /// The toast's action target: every job toast offers navigation to
    /// the dashboard.
    pub navigate_to_dashboard: bool,
}

/// Client-side notification state.
pub struct NotificationCenter {
    items: VecDeque<NotificationLogItem>,
    cap: usize,
    unread: usize,
    panel_open: bool,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_cap(NOTIFICATION_LOG_CAP)
    }

    /// A center with an explicit ring capacity (tests use small caps).
    pub fn with_cap(cap: usize) -> Self {
        Self {
            items: VecDeque::new(),
            cap,
            unread: 0,
            panel_open: false,
        }
    }

    /// Record a feed event.  Returns the toast to display.
    pub fn apply(&mut self, event: &JobEvent) -> Toast {
        let kind = event.notification_kind();
        let mut item = NotificationLogItem::new(kind, event.message()).with_job(event.job_id());
        if let Some(run_name) = event.run_name() {
            item = item.with_run_name(run_name);
        }
        self.push(item);

        Toast {
            kind,
            message: event.message().to_string(),
            job_id: Some(event.job_id().to_string()),
            navigate_to_dashboard: true,
        }
    }

    /// Prepend an item, evicting the oldest past the cap.
    pub fn push(&mut self, item: NotificationLogItem) {
        self.items.push_front(item);
        while self.items.len() > self.cap {
            self.items.pop_back();
        }
        if !self.panel_open {
            self.unread += 1;
        }
    }

    /// Entries, most recent first.
    pub fn items(&self) -> impl Iterator<Item = &NotificationLogItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Notifications that arrived while the panel was closed.
    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    /// Open the panel; everything becomes read.
    pub fn open_panel(&mut self) {
        self.panel_open = true;
        self.unread = 0;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}
