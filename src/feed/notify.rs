//! Notification sink injected into feed views.
//!
//! Views report user-facing failures through a [`Notifier`] handed to them at
//! construction; the application root decides where notices go.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Severity of a user-facing notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational message.
    Info,
    /// Recoverable failure the user may want to retry.
    Error,
}

/// A single user-facing notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

/// Receiver of user-facing notices.
pub trait Notifier: Send + Sync {
    /// Deliver one notice. Must not block.
    fn notify(&self, notice: Notice);
}

/// Shared handle to a notifier.
pub type SharedNotifier = Arc<dyn Notifier>;

/// Notifier that only writes to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "notice"),
        }
    }
}

/// Notifier forwarding notices over an unbounded channel to the UI loop.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    /// Sending half owned by the views.
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// What: Create a notifier and the receiver the UI drains.
    ///
    /// Output:
    /// - `(notifier, receiver)` pair; notices sent after the receiver is
    ///   dropped are logged and discarded.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.tx.send(notice) {
            tracing::debug!(message = %e.0.message, "notice dropped: receiver closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Channel notifier delivers notices in order and tolerates a closed receiver
    fn channel_notifier_delivers_then_tolerates_close() {
        let (n, mut rx) = ChannelNotifier::channel();
        n.notify(Notice {
            level: NoticeLevel::Error,
            message: "first".into(),
        });
        n.notify(Notice {
            level: NoticeLevel::Info,
            message: "second".into(),
        });
        assert_eq!(rx.try_recv().map(|n| n.message).ok().as_deref(), Some("first"));
        assert_eq!(rx.try_recv().map(|n| n.level).ok(), Some(NoticeLevel::Info));
        drop(rx);
        n.notify(Notice {
            level: NoticeLevel::Info,
            message: "ignored".into(),
        });
    }
}
