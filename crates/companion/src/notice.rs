//! User-visible notices (toasts) and view refresh requests.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Cached views that should be reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Approvals,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Notice(Notice),
    Invalidate(View),
}

/// Sending half of the notice channel. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct NoticeSink {
    tx: Option<UnboundedSender<Signal>>,
}

impl NoticeSink {
    pub fn channel() -> (Self, UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink nobody listens to.
    pub fn discard() -> Self {
        Self { tx: None }
    }

    fn send(&self, signal: Signal) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is showing notices any more.
            let _ = tx.send(signal);
        }
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.send(Signal::Notice(Notice {
            level,
            message: message.into(),
        }));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Error, message);
    }

    pub fn invalidate(&self, view: View) {
        self.send(Signal::Invalidate(view));
    }
}

/// Collect the notices currently buffered, dropping refresh requests.
pub fn drain_notices(rx: &mut UnboundedReceiver<Signal>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(signal) = rx.try_recv() {
        if let Signal::Notice(notice) = signal {
            notices.push(notice);
        }
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_delivers_in_order() {
        let (sink, mut rx) = NoticeSink::channel();
        sink.info("queued");
        sink.invalidate(View::Dashboard);
        sink.error("failed");

        let notices = drain_notices(&mut rx);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert_eq!(notices[1].message, "failed");
    }

    #[test]
    fn test_discard_and_dropped_receiver() {
        NoticeSink::discard().success("nobody listens");

        let (sink, rx) = NoticeSink::channel();
        drop(rx);
        sink.success("still fine");
    }
}
