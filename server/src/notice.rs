//! User-facing notices.
//!
//! Short toast-style messages shown to the moderator who triggered an
//! action. Sending never blocks; every notice is also logged.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

/// Notice appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Neutral,
    Success,
}

/// A single user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

/// Fire-and-forget notice sink.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, message: String, severity: Severity);
}

/// Channel-backed sink whose notices are drained after a request.
#[derive(Clone)]
pub struct NoticeChannel {
    tx: mpsc::UnboundedSender<Notice>,
}

/// Receiving half of a [`NoticeChannel`].
pub struct NoticeReceiver {
    rx: mpsc::UnboundedReceiver<Notice>,
}

/// Create a connected sink and receiver.
pub fn notice_channel() -> (NoticeChannel, NoticeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeChannel { tx }, NoticeReceiver { rx })
}

impl NoticeSink for NoticeChannel {
    fn notify(&self, message: String, severity: Severity) {
        info!(severity = ?severity, notice = %message, "Notice");
        // The receiver may already be gone; notices are best effort.
        let _ = self.tx.send(Notice { message, severity });
    }
}

impl NoticeReceiver {
    /// Take every notice sent so far, in send order.
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.rx.try_recv() {
            notices.push(notice);
        }
        notices
    }
}
