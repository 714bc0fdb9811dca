use std::time::{Duration, Instant};

use shared::domain::BotId;
use tokio::sync::broadcast;
use tracing::{info, warn};

pub const SUCCESS_DISMISS_AFTER: Duration = Duration::from_secs(3);
pub const INFO_DISMISS_AFTER: Duration = Duration::from_secs(4);
pub const ERROR_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl NoticeKind {
    /// Failures stay up longer than successes.
    pub fn dismiss_after(self) -> Duration {
        match self {
            Self::Success => SUCCESS_DISMISS_AFTER,
            Self::Info => INFO_DISMISS_AFTER,
            Self::Error => ERROR_DISMISS_AFTER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub target: Option<BotId>,
    pub issued_at: Instant,
    pub dismiss_after: Duration,
}

impl Notice {
    pub fn is_dismissed_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.issued_at) >= self.dismiss_after
    }
}

/// Fire-and-forget notices. Holds no history; slow or absent subscribers
/// never block a sender.
#[derive(Clone)]
pub struct Notifier {
    events: broadcast::Sender<Notice>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.events.subscribe()
    }

    pub fn notify(&self, kind: NoticeKind, message: impl Into<String>, target: Option<BotId>) {
        let message = message.into();
        match kind {
            NoticeKind::Error => warn!(target_bot = ?target, %message, "notice"),
            _ => info!(target_bot = ?target, ?kind, %message, "notice"),
        }
        let _ = self.events.send(Notice {
            kind,
            message,
            target,
            issued_at: Instant::now(),
            dismiss_after: kind.dismiss_after(),
        });
    }

    pub fn success(&self, message: impl Into<String>, target: Option<BotId>) {
        self.notify(NoticeKind::Success, message, target);
    }

    pub fn error(&self, message: impl Into<String>, target: Option<BotId>) {
        self.notify(NoticeKind::Error, message, target);
    }

    pub fn info(&self, message: impl Into<String>, target: Option<BotId>) {
        self.notify(NoticeKind::Info, message, target);
    }
}

/// Notices currently on screen. Several may be visible at once; each
/// disappears once its dismiss duration has elapsed.
#[derive(Debug, Default)]
pub struct VisibleNotices {
    notices: Vec<Notice>,
}

impl VisibleNotices {
    pub fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn prune(&mut self, now: Instant) {
        self.notices.retain(|notice| !notice.is_dismissed_at(now));
    }

    pub fn visible(&self) -> &[Notice] {
        &self.notices
    }
}

#[cfg(test)]
#[path = "tests/notifier_tests.rs"]
mod tests;
